use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::assignment::Assignment;
use crate::models::rating::{Rating, RatingWithUser};
use crate::models::user::UserResponse;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub restaurant: String,
    pub total_cost: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub restaurant: String,
    pub date: DateTime<Utc>,
    pub total_cost: Option<Decimal>,
    pub assigned_user_ids: Option<Vec<Uuid>>,
}

/// Absent fields are left unchanged. `assigned_user_ids`, when present,
/// replaces the event's assignment set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub restaurant: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub total_cost: Option<Decimal>,
    pub assigned_user_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize)]
pub struct CreatedEvent {
    pub event: Event,
    pub assignments: Vec<Assignment>,
    pub assigned_count: usize,
}

#[derive(Debug, Serialize)]
pub struct UpdatedEvent {
    pub event: Event,
    pub assignment_changes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventAverages {
    pub legacy: Option<f64>,
    pub food: Option<f64>,
    pub ambience: Option<f64>,
    pub price_performance: Option<f64>,
    pub overall: Option<f64>,
}

impl EventAverages {
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        Self {
            legacy: average(ratings.iter().map(|r| r.legacy_score.map(f64::from))),
            food: average(ratings.iter().map(|r| r.food_score.map(f64::from))),
            ambience: average(ratings.iter().map(|r| r.ambience_score.map(f64::from))),
            price_performance: average(
                ratings
                    .iter()
                    .map(|r| r.price_performance_score.map(f64::from)),
            ),
            overall: average(ratings.iter().map(Rating::overall_score)),
        }
    }
}

/// Mean of the present values; `None` when no value is present.
pub fn average(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / f64::from(count))
}

#[derive(Debug, Clone, Serialize)]
pub struct EventWithDetails {
    #[serde(flatten)]
    pub event: Event,
    pub ratings: Vec<RatingWithUser>,
    pub assigned_users: Vec<UserResponse>,
    pub averages: EventAverages,
    pub total_ratings: usize,
    pub ratings_hidden: bool,
}

impl EventWithDetails {
    /// Strips everything but the viewer's own rating.
    pub fn hide_ratings(&mut self, viewer: Uuid) {
        self.ratings.retain(|r| r.rating.user_id == viewer);
        self.averages = EventAverages::default();
        self.ratings_hidden = true;
    }
}
