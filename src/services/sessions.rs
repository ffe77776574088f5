use sqlx::PgPool;
use uuid::Uuid;

use crate::models::session::SessionUser;
use crate::services::users::USER_COLUMNS;

/// Looks up an unexpired session by token.
pub async fn find_session_user(
    pool: &PgPool,
    token: &str,
) -> Result<Option<SessionUser>, sqlx::Error> {
    let query = format!(
        r#"SELECT s.id AS session_id, {USER_COLUMNS}
           FROM session s
           JOIN "user" u ON u.id = s.user_id
           WHERE s.token = $1 AND s.expires_at > NOW()"#
    );

    sqlx::query_as::<_, SessionUser>(&query)
        .bind(token)
        .fetch_optional(pool)
        .await
}

pub async fn delete_session(pool: &PgPool, session_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM session WHERE id = $1")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(())
}
