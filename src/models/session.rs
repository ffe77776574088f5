use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::User;

/// A live session joined with the user it belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct SessionUser {
    pub session_id: Uuid,
    #[sqlx(flatten)]
    pub user: User,
}
