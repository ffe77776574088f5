use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{events, health_check, ratings, statistics, users};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let production = state.config.production;

    Router::new()
        .route("/health", get(health_check))
        .route("/me", get(users::current_user))
        .route("/session", delete(users::logout))
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/assignments", get(events::get_assignments))
        .route("/events/:id/assignment", get(events::get_own_assignment))
        .route("/events/:id/ratings", post(ratings::create_rating))
        .route("/ranking", get(ratings::event_ranking))
        .route("/ranking/:year", get(ratings::yearly_ranking))
        .route("/costs", get(ratings::event_costs))
        .route("/statistics", get(statistics::get_statistics))
        .route("/statistics/timeline", get(statistics::get_timeline))
        .route("/users", get(users::list_users))
        .route("/users/confirmed", get(users::confirmed_users))
        .route("/users/:id/confirm", post(users::confirm_user))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(production))
        .layer(create_cors_layer())
}
