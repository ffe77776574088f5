use axum::extract::State;
use axum::response::Response;
use chrono::Utc;

use crate::auth::ConfirmedUser;
use crate::services::statistics;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

pub async fn get_statistics(
    State(state): State<AppState>,
    ConfirmedUser(_): ConfirmedUser,
) -> Result<Response, AppError> {
    let stats = statistics::get_statistics(&state.pool, Utc::now()).await?;
    Ok(success(stats, "Statistics retrieved"))
}

pub async fn get_timeline(
    State(state): State<AppState>,
    ConfirmedUser(_): ConfirmedUser,
) -> Result<Response, AppError> {
    let timeline = statistics::rating_timeline(&state.pool).await?;
    Ok(success(timeline, "Rating timeline retrieved"))
}
