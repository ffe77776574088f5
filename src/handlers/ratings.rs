use axum::extract::State;
use axum::response::Response;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::ConfirmedUser;
use crate::models::rating::CreateRatingRequest;
use crate::services::ratings;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, success};

pub async fn create_rating(
    State(state): State<AppState>,
    ConfirmedUser(user): ConfirmedUser,
    AppPath(event_id): AppPath<Uuid>,
    AppJson(request): AppJson<CreateRatingRequest>,
) -> Result<Response, AppError> {
    let rating = ratings::save_rating(&state.pool, user.id, event_id, request).await?;
    Ok(created(rating, "Rating saved"))
}

pub async fn event_ranking(
    State(state): State<AppState>,
    ConfirmedUser(_): ConfirmedUser,
) -> Result<Response, AppError> {
    let ranking = ratings::event_ranking(&state.pool).await?;
    Ok(success(ranking, "Ranking retrieved"))
}

pub async fn yearly_ranking(
    State(state): State<AppState>,
    ConfirmedUser(_): ConfirmedUser,
    AppPath(year): AppPath<i32>,
) -> Result<Response, AppError> {
    let ranking = ratings::yearly_ranking(&state.pool, year).await?;
    Ok(success(ranking, format!("Ranking for {year} retrieved")))
}

pub async fn event_costs(
    State(state): State<AppState>,
    ConfirmedUser(_): ConfirmedUser,
) -> Result<Response, AppError> {
    let costs = ratings::event_costs(&state.pool, Utc::now()).await?;
    Ok(success(costs, "Event costs retrieved"))
}
