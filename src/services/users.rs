use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::User;

/// Columns of `"user"` aliased `u`, in `User` field order.
pub const USER_COLUMNS: &str = "u.id, u.name, u.first_name, u.last_name, u.email, u.image, \
     u.is_admin, u.is_confirmed, u.created_at, u.updated_at";

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    let query = format!(
        r#"SELECT {USER_COLUMNS} FROM "user" u ORDER BY u.is_confirmed, u.name"#
    );
    sqlx::query_as::<_, User>(&query).fetch_all(pool).await
}

/// Users an admin may assign to events.
pub async fn confirmed_users(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    let query = format!(
        r#"SELECT {USER_COLUMNS} FROM "user" u WHERE u.is_confirmed ORDER BY u.name"#
    );
    sqlx::query_as::<_, User>(&query).fetch_all(pool).await
}

/// Marks a user confirmed. Returns `None` for an unknown id.
pub async fn confirm_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let query = format!(
        r#"UPDATE "user" u SET is_confirmed = TRUE, updated_at = NOW()
           WHERE u.id = $1
           RETURNING {USER_COLUMNS}"#
    );
    let user = sqlx::query_as::<_, User>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    if let Some(user) = &user {
        tracing::info!(user_id = %user.id, email = %user.email, "User confirmed");
    }
    Ok(user)
}
