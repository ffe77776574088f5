use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::UserResponse;

/// SQL expression for the overall score of a rating row aliased `r`.
pub const OVERALL_SCORE_SQL: &str = "COALESCE(r.legacy_score::float8, \
     (r.food_score + r.ambience_score + r.price_performance_score)::float8 / 3.0)";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub legacy_score: Option<i16>,
    pub food_score: Option<i16>,
    pub ambience_score: Option<i16>,
    pub price_performance_score: Option<i16>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    /// Legacy score when present, otherwise the mean of the three categories.
    pub fn overall_score(&self) -> Option<f64> {
        if let Some(legacy) = self.legacy_score {
            return Some(f64::from(legacy));
        }
        match (self.food_score, self.ambience_score, self.price_performance_score) {
            (Some(food), Some(ambience), Some(price)) => {
                Some(f64::from(food + ambience + price) / 3.0)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRatingRequest {
    pub food_score: i16,
    pub ambience_score: i16,
    pub price_performance_score: i16,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatingWithUser {
    #[serde(flatten)]
    pub rating: Rating,
    pub overall_score: Option<f64>,
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(legacy: Option<i16>, food: Option<i16>, ambience: Option<i16>, price: Option<i16>) -> Rating {
        Rating {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            legacy_score: legacy,
            food_score: food,
            ambience_score: ambience,
            price_performance_score: price,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_overall_prefers_legacy_score() {
        assert_eq!(rating(Some(2), Some(5), Some(5), Some(5)).overall_score(), Some(2.0));
    }

    #[test]
    fn test_overall_averages_categories() {
        assert_eq!(rating(None, Some(5), Some(4), Some(3)).overall_score(), Some(4.0));
        let score = rating(None, Some(5), Some(5), Some(4)).overall_score().unwrap();
        assert!((score - 14.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_overall_missing_category() {
        assert_eq!(rating(None, Some(5), None, Some(3)).overall_score(), None);
    }
}
