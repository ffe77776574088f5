use axum::extract::State;
use axum::response::Response;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{AdminUser, ConfirmedUser};
use crate::models::assignment::{AssignmentStatus, EventAssignments};
use crate::models::event::{CreateEventRequest, EventWithDetails, UpdateEventRequest};
use crate::services::{assignments, events};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, empty_success, success};

fn event_not_found(event_id: Uuid) -> AppError {
    AppError::NotFound(format!("Event '{}' was not found", event_id))
}

fn apply_visibility(state: &AppState, viewer: Uuid, event: &mut EventWithDetails) {
    if state.config.ratings_hidden_at(Utc::now()) {
        event.hide_ratings(viewer);
    }
}

pub async fn list_events(
    State(state): State<AppState>,
    ConfirmedUser(user): ConfirmedUser,
) -> Result<Response, AppError> {
    let mut events = events::list_events(&state.pool).await?;
    for event in &mut events {
        apply_visibility(&state, user.id, event);
    }
    Ok(success(events, "Events retrieved"))
}

pub async fn get_event(
    State(state): State<AppState>,
    ConfirmedUser(user): ConfirmedUser,
    AppPath(event_id): AppPath<Uuid>,
) -> Result<Response, AppError> {
    let mut event = events::get_event(&state.pool, event_id)
        .await?
        .ok_or_else(|| event_not_found(event_id))?;
    apply_visibility(&state, user.id, &mut event);
    Ok(success(event, "Event retrieved"))
}

pub async fn create_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppJson(request): AppJson<CreateEventRequest>,
) -> Result<Response, AppError> {
    let result = events::create_event_with_assignments(&state.pool, admin.id, request).await?;
    Ok(created(result, "Event created"))
}

pub async fn update_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(event_id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateEventRequest>,
) -> Result<Response, AppError> {
    let result =
        events::update_event_with_assignments(&state.pool, admin.id, event_id, request).await?;
    Ok(success(result, "Event updated"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(event_id): AppPath<Uuid>,
) -> Result<Response, AppError> {
    if !events::delete_event(&state.pool, event_id).await? {
        return Err(event_not_found(event_id));
    }
    tracing::info!(event_id = %event_id, admin_id = %admin.id, "Event deleted");
    Ok(empty_success("Event deleted"))
}

/// Assigned user ids of an event, for the admin edit dialog.
pub async fn get_assignments(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    AppPath(event_id): AppPath<Uuid>,
) -> Result<Response, AppError> {
    if !events::event_exists(&state.pool, event_id).await? {
        return Err(event_not_found(event_id));
    }
    let assigned_user_ids = assignments::current_assignments(&state.pool, event_id).await?;
    Ok(success(
        EventAssignments {
            event_id,
            assigned_user_ids,
        },
        "Assignments retrieved",
    ))
}

/// Whether the caller may rate the event.
pub async fn get_own_assignment(
    State(state): State<AppState>,
    ConfirmedUser(user): ConfirmedUser,
    AppPath(event_id): AppPath<Uuid>,
) -> Result<Response, AppError> {
    let is_assigned = assignments::is_user_assigned(&state.pool, user.id, event_id).await?;
    Ok(success(
        AssignmentStatus {
            event_id,
            is_assigned,
        },
        "Assignment status retrieved",
    ))
}
