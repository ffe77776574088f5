use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use crate::auth::{AdminUser, CurrentSession};
use crate::models::user::UserResponse;
use crate::services::{sessions, users};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::AppPath;
use crate::utils::response::{empty_success, success};

/// The signed-in user. Open to unconfirmed accounts so the UI can show the
/// pending-confirmation page.
pub async fn current_user(session: CurrentSession) -> Response {
    success(UserResponse::from(session.user), "Current user retrieved")
}

pub async fn logout(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Response, AppError> {
    sessions::delete_session(&state.pool, session.session_id).await?;
    tracing::info!(user_id = %session.user.id, "Session ended");
    Ok(empty_success("Signed out"))
}

pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Response, AppError> {
    let all: Vec<UserResponse> = users::list_users(&state.pool)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(success(all, "Users retrieved"))
}

pub async fn confirmed_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Response, AppError> {
    let confirmed: Vec<UserResponse> = users::confirmed_users(&state.pool)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(success(confirmed, "Confirmed users retrieved"))
}

pub async fn confirm_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Response, AppError> {
    let user = users::confirm_user(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' was not found", user_id)))?;
    Ok(success(UserResponse::from(user), "User confirmed"))
}
