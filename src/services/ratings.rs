use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use std::cmp::Ordering;
use uuid::Uuid;

use crate::models::event::EventWithDetails;
use crate::models::rating::{CreateRatingRequest, Rating, OVERALL_SCORE_SQL};
use crate::models::statistics::{EventCost, EventCostRow, EventRankingEntry, YearlyRankingEntry};
use crate::services::{assignments, events};
use crate::utils::error::AppError;
use crate::utils::validation::{normalize_comment, validate_score};

/// Stores a rating for an event the user is assigned to. Ratings are final:
/// a second submission for the same event is rejected.
pub async fn save_rating(
    pool: &PgPool,
    user_id: Uuid,
    event_id: Uuid,
    request: CreateRatingRequest,
) -> Result<Rating, AppError> {
    let food = validate_score("food_score", request.food_score)?;
    let ambience = validate_score("ambience_score", request.ambience_score)?;
    let price = validate_score("price_performance_score", request.price_performance_score)?;
    let comment = normalize_comment(request.comment)?;

    if !assignments::is_user_assigned(pool, user_id, event_id).await? {
        return Err(AppError::Forbidden(
            "You can only rate events you are assigned to".to_string(),
        ));
    }

    let rating = sqlx::query_as::<_, Rating>(
        r#"INSERT INTO rating (id, user_id, event_id, food_score, ambience_score,
                               price_performance_score, comment)
           VALUES ($1, $2, $3, $4, $5, $6, $7)
           ON CONFLICT (user_id, event_id) DO NOTHING
           RETURNING id, user_id, event_id, legacy_score, food_score, ambience_score,
                     price_performance_score, comment, created_at"#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(event_id)
    .bind(food)
    .bind(ambience)
    .bind(price)
    .bind(comment)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        AppError::Conflict(
            "You have already rated this event and cannot change your rating".to_string(),
        )
    })?;

    tracing::info!(
        rating_id = %rating.id,
        user_id = %user_id,
        event_id = %event_id,
        "Rating saved"
    );

    Ok(rating)
}

/// Events ordered best first; unrated events count as 0.
pub async fn event_ranking(pool: &PgPool) -> Result<Vec<EventRankingEntry>, sqlx::Error> {
    let events = events::list_events(pool).await?;
    Ok(rank_events(&events))
}

pub fn rank_events(events: &[EventWithDetails]) -> Vec<EventRankingEntry> {
    let mut ranking: Vec<EventRankingEntry> = events
        .iter()
        .map(|e| EventRankingEntry {
            id: e.event.id,
            restaurant: e.event.restaurant.clone(),
            date: e.event.date,
            average_rating: e.averages.overall,
            total_ratings: e.total_ratings,
        })
        .collect();

    ranking.sort_by(|a, b| {
        let avg_a = a.average_rating.unwrap_or(0.0);
        let avg_b = b.average_rating.unwrap_or(0.0);
        avg_b
            .partial_cmp(&avg_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.total_ratings.cmp(&a.total_ratings))
    });
    ranking
}

/// Events dated within `year`, best average first, unrated last.
pub async fn yearly_ranking(pool: &PgPool, year: i32) -> Result<Vec<YearlyRankingEntry>, AppError> {
    let (start, end) = year_bounds(year)
        .ok_or_else(|| AppError::ValidationError(format!("Invalid year: {year}")))?;

    let query = format!(
        r#"SELECT e.id, e.restaurant,
                  AVG({OVERALL_SCORE_SQL}) AS average_rating,
                  COUNT(r.id) AS total_ratings
           FROM event e
           LEFT JOIN rating r ON r.event_id = e.id
           WHERE e.date >= $1 AND e.date < $2
           GROUP BY e.id, e.restaurant
           ORDER BY average_rating DESC NULLS LAST, total_ratings DESC"#
    );

    let ranking = sqlx::query_as::<_, YearlyRankingEntry>(&query)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;
    Ok(ranking)
}

/// Half-open `[Jan 1 of year, Jan 1 of year + 1)` in UTC.
pub fn year_bounds(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)?.and_utc();
    let end = NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
        .and_hms_opt(0, 0, 0)?
        .and_utc();
    Some((start, end))
}

/// Cost breakdown of events that already took place.
pub async fn event_costs(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<EventCost>, sqlx::Error> {
    let start_of_today = now.date_naive().and_hms_opt(0, 0, 0).map(|d| d.and_utc()).unwrap_or(now);

    let rows = sqlx::query_as::<_, EventCostRow>(
        r#"SELECT e.id, e.restaurant, e.total_cost, COUNT(a.id) AS attendee_count
           FROM event e
           LEFT JOIN event_assignment a ON a.event_id = e.id
           WHERE e.date <= $1
           GROUP BY e.id, e.restaurant, e.total_cost
           ORDER BY (e.total_cost IS NULL),
                    e.total_cost / NULLIF(COUNT(a.id), 0) DESC NULLS LAST,
                    e.restaurant"#,
    )
    .bind(start_of_today)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| EventCost {
            cost_per_person: cost_per_person(row.total_cost, row.attendee_count),
            id: row.id,
            restaurant: row.restaurant,
            total_cost: row.total_cost,
            attendee_count: row.attendee_count,
        })
        .collect())
}

/// Total divided by attendees, rounded half-up to cents.
pub fn cost_per_person(total_cost: Option<Decimal>, attendees: i64) -> Option<Decimal> {
    let total = total_cost.filter(|t| !t.is_zero())?;
    if attendees <= 0 {
        return None;
    }
    Some(
        (total / Decimal::from(attendees))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{Event, EventAverages};
    use chrono::TimeZone;

    fn details(restaurant: &str, overall: Option<f64>, total_ratings: usize) -> EventWithDetails {
        EventWithDetails {
            event: Event {
                id: Uuid::new_v4(),
                date: Utc::now(),
                restaurant: restaurant.to_string(),
                total_cost: None,
                created_at: Utc::now(),
            },
            ratings: Vec::new(),
            assigned_users: Vec::new(),
            averages: EventAverages {
                overall,
                ..EventAverages::default()
            },
            total_ratings,
            ratings_hidden: false,
        }
    }

    #[test]
    fn test_rank_by_average_then_count() {
        let events = vec![
            details("unrated", None, 0),
            details("good-few", Some(4.5), 2),
            details("good-many", Some(4.5), 6),
            details("best", Some(4.9), 1),
            details("meh", Some(2.0), 9),
        ];
        let order: Vec<String> = rank_events(&events)
            .into_iter()
            .map(|e| e.restaurant)
            .collect();
        assert_eq!(order, vec!["best", "good-many", "good-few", "meh", "unrated"]);
    }

    #[test]
    fn test_year_bounds() {
        let (start, end) = year_bounds(2025).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert!(year_bounds(i32::MAX).is_none());
    }

    #[test]
    fn test_cost_per_person() {
        assert_eq!(
            cost_per_person(Some(Decimal::new(30000, 2)), 4),
            Some(Decimal::new(7500, 2))
        );
        // 100 / 3 = 33.333…
        assert_eq!(
            cost_per_person(Some(Decimal::from(100)), 3),
            Some(Decimal::new(3333, 2))
        );
        // 0.05 / 2 = 0.025 rounds up
        assert_eq!(
            cost_per_person(Some(Decimal::new(5, 2)), 2),
            Some(Decimal::new(3, 2))
        );
    }

    #[test]
    fn test_cost_per_person_absent() {
        assert_eq!(cost_per_person(None, 5), None);
        assert_eq!(cost_per_person(Some(Decimal::from(120)), 0), None);
        assert_eq!(cost_per_person(Some(Decimal::ZERO), 3), None);
    }
}
