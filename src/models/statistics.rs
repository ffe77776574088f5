use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total_events: i64,
    pub total_ratings: i64,
    pub total_users: i64,
    pub events_this_year: i64,
    pub average_rating: f64,
    pub rating_distribution: Vec<ScoreBucket>,
    pub top_rated_restaurant: Option<RestaurantAverage>,
    pub worst_rated_restaurant: Option<RestaurantAverage>,
    pub most_active_user: Option<UserActivity>,
    pub most_positive_user: Option<UserAverage>,
    pub most_negative_user: Option<UserAverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ScoreBucket {
    pub score: i32,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RestaurantAverage {
    pub restaurant: String,
    pub average_rating: f64,
    pub rating_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserAggregateRow {
    pub user_id: Uuid,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub rating_count: i64,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserActivity {
    pub user_id: Uuid,
    pub name: String,
    pub rating_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAverage {
    pub user_id: Uuid,
    pub name: String,
    pub average_rating: f64,
    pub rating_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub average_rating: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRankingEntry {
    pub id: Uuid,
    pub restaurant: String,
    pub date: chrono::DateTime<chrono::Utc>,
    pub average_rating: Option<f64>,
    pub total_ratings: usize,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct YearlyRankingEntry {
    pub id: Uuid,
    pub restaurant: String,
    pub average_rating: Option<f64>,
    pub total_ratings: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct EventCostRow {
    pub id: Uuid,
    pub restaurant: String,
    pub total_cost: Option<Decimal>,
    pub attendee_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventCost {
    pub id: Uuid,
    pub restaurant: String,
    pub total_cost: Option<Decimal>,
    pub attendee_count: i64,
    pub cost_per_person: Option<Decimal>,
}
