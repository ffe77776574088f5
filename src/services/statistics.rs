use chrono::{DateTime, Datelike, Utc};
use sqlx::{FromRow, PgPool};

use crate::models::rating::OVERALL_SCORE_SQL;
use crate::models::statistics::{
    RestaurantAverage, ScoreBucket, Statistics, TimelinePoint, UserActivity, UserAggregateRow,
    UserAverage,
};
use crate::models::user::display_name;
use crate::services::ratings::year_bounds;
use crate::utils::validation::{MAX_SCORE, MIN_SCORE};

/// Restaurants and users need this many ratings before they are ranked.
pub const MIN_SAMPLE_SIZE: i64 = 3;

#[derive(Debug, FromRow)]
struct Totals {
    total_events: i64,
    total_ratings: i64,
    total_users: i64,
    events_this_year: i64,
    average_rating: f64,
}

pub async fn get_statistics(pool: &PgPool, now: DateTime<Utc>) -> Result<Statistics, sqlx::Error> {
    let start_of_year = year_bounds(now.year()).map(|(start, _)| start).unwrap_or(now);

    let query = format!(
        r#"SELECT
               (SELECT COUNT(*) FROM event) AS total_events,
               (SELECT COUNT(*) FROM rating) AS total_ratings,
               (SELECT COUNT(*) FROM "user") AS total_users,
               (SELECT COUNT(*) FROM event WHERE date >= $1) AS events_this_year,
               (SELECT COALESCE(AVG({OVERALL_SCORE_SQL}), 0)::float8 FROM rating r) AS average_rating"#
    );
    let totals = sqlx::query_as::<_, Totals>(&query)
        .bind(start_of_year)
        .fetch_one(pool)
        .await?;

    let query = format!(
        r#"SELECT ROUND({OVERALL_SCORE_SQL})::int4 AS score, COUNT(*) AS count
           FROM rating r
           GROUP BY 1"#
    );
    let buckets = sqlx::query_as::<_, ScoreBucket>(&query).fetch_all(pool).await?;

    let query = format!(
        r#"SELECT e.restaurant, AVG({OVERALL_SCORE_SQL}) AS average_rating, COUNT(*) AS rating_count
           FROM event e
           JOIN rating r ON r.event_id = e.id
           GROUP BY e.restaurant"#
    );
    let restaurants = sqlx::query_as::<_, RestaurantAverage>(&query)
        .fetch_all(pool)
        .await?;

    let query = format!(
        r#"SELECT u.id AS user_id, u.name, u.first_name, u.last_name,
                  COUNT(*) AS rating_count, AVG({OVERALL_SCORE_SQL}) AS average_rating
           FROM rating r
           JOIN "user" u ON u.id = r.user_id
           GROUP BY u.id, u.name, u.first_name, u.last_name"#
    );
    let users = sqlx::query_as::<_, UserAggregateRow>(&query)
        .fetch_all(pool)
        .await?;

    let (top_rated_restaurant, worst_rated_restaurant) = restaurant_extremes(restaurants);
    let highlights = user_highlights(&users);

    Ok(Statistics {
        total_events: totals.total_events,
        total_ratings: totals.total_ratings,
        total_users: totals.total_users,
        events_this_year: totals.events_this_year,
        average_rating: totals.average_rating,
        rating_distribution: fill_distribution(&buckets),
        top_rated_restaurant,
        worst_rated_restaurant,
        most_active_user: highlights.most_active,
        most_positive_user: highlights.most_positive,
        most_negative_user: highlights.most_negative,
    })
}

/// Per-day average overall score, oldest day first.
pub async fn rating_timeline(pool: &PgPool) -> Result<Vec<TimelinePoint>, sqlx::Error> {
    let query = format!(
        r#"SELECT (r.created_at AT TIME ZONE 'UTC')::date AS date,
                  AVG({OVERALL_SCORE_SQL}) AS average_rating,
                  COUNT(*) AS count
           FROM rating r
           GROUP BY 1
           ORDER BY 1"#
    );
    sqlx::query_as::<_, TimelinePoint>(&query).fetch_all(pool).await
}

/// One bucket per star from 5 down to 1, missing buckets counted as 0.
pub fn fill_distribution(buckets: &[ScoreBucket]) -> Vec<ScoreBucket> {
    (MIN_SCORE..=MAX_SCORE)
        .rev()
        .map(i32::from)
        .map(|score| ScoreBucket {
            score,
            count: buckets
                .iter()
                .filter(|b| b.score == score)
                .map(|b| b.count)
                .sum(),
        })
        .collect()
}

/// Best and worst restaurant among those with enough ratings. Ties go to the
/// restaurant with more ratings.
pub fn restaurant_extremes(
    restaurants: Vec<RestaurantAverage>,
) -> (Option<RestaurantAverage>, Option<RestaurantAverage>) {
    let eligible: Vec<RestaurantAverage> = restaurants
        .into_iter()
        .filter(|r| r.rating_count >= MIN_SAMPLE_SIZE)
        .collect();

    let top = eligible
        .iter()
        .max_by(|a, b| {
            a.average_rating
                .total_cmp(&b.average_rating)
                .then(a.rating_count.cmp(&b.rating_count))
        })
        .cloned();
    let worst = eligible
        .iter()
        .min_by(|a, b| {
            a.average_rating
                .total_cmp(&b.average_rating)
                .then(b.rating_count.cmp(&a.rating_count))
        })
        .cloned();
    (top, worst)
}

#[derive(Debug, Default)]
pub struct UserHighlights {
    pub most_active: Option<UserActivity>,
    pub most_positive: Option<UserAverage>,
    pub most_negative: Option<UserAverage>,
}

pub fn user_highlights(rows: &[UserAggregateRow]) -> UserHighlights {
    let name_of = |row: &UserAggregateRow| {
        display_name(row.first_name.as_deref(), row.last_name.as_deref(), Some(row.name.as_str()))
    };
    let as_average = |row: &UserAggregateRow| UserAverage {
        user_id: row.user_id,
        name: name_of(row),
        average_rating: row.average_rating,
        rating_count: row.rating_count,
    };

    let most_active = rows
        .iter()
        .max_by_key(|row| row.rating_count)
        .map(|row| UserActivity {
            user_id: row.user_id,
            name: name_of(row),
            rating_count: row.rating_count,
        });

    let eligible = || rows.iter().filter(|row| row.rating_count >= MIN_SAMPLE_SIZE);
    let most_positive = eligible()
        .max_by(|a, b| a.average_rating.total_cmp(&b.average_rating))
        .map(as_average);
    let most_negative = eligible()
        .min_by(|a, b| a.average_rating.total_cmp(&b.average_rating))
        .map(as_average);

    UserHighlights {
        most_active,
        most_positive,
        most_negative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn restaurant(name: &str, average_rating: f64, rating_count: i64) -> RestaurantAverage {
        RestaurantAverage {
            restaurant: name.to_string(),
            average_rating,
            rating_count,
        }
    }

    fn user_row(name: &str, rating_count: i64, average_rating: f64) -> UserAggregateRow {
        UserAggregateRow {
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            first_name: None,
            last_name: None,
            rating_count,
            average_rating,
        }
    }

    #[test]
    fn test_distribution_has_five_descending_buckets() {
        let buckets = vec![
            ScoreBucket { score: 4, count: 7 },
            ScoreBucket { score: 1, count: 2 },
        ];
        let filled = fill_distribution(&buckets);
        let scores: Vec<i32> = filled.iter().map(|b| b.score).collect();
        let counts: Vec<i64> = filled.iter().map(|b| b.count).collect();
        assert_eq!(scores, vec![5, 4, 3, 2, 1]);
        assert_eq!(counts, vec![0, 7, 0, 0, 2]);
    }

    #[test]
    fn test_distribution_when_empty() {
        assert!(fill_distribution(&[]).iter().all(|b| b.count == 0));
        assert_eq!(fill_distribution(&[]).len(), 5);
    }

    #[test]
    fn test_restaurant_extremes_respect_sample_size() {
        let (top, worst) = restaurant_extremes(vec![
            restaurant("Lucky Guess", 5.0, 1),
            restaurant("Trattoria", 4.2, 3),
            restaurant("Kebab Haus", 3.1, 5),
            restaurant("Bad Luck", 1.0, 2),
        ]);
        assert_eq!(top.unwrap().restaurant, "Trattoria");
        assert_eq!(worst.unwrap().restaurant, "Kebab Haus");
    }

    #[test]
    fn test_restaurant_extremes_none_qualify() {
        let (top, worst) = restaurant_extremes(vec![restaurant("Solo", 4.0, 2)]);
        assert!(top.is_none());
        assert!(worst.is_none());
    }

    #[test]
    fn test_restaurant_tie_prefers_more_ratings() {
        let (top, worst) = restaurant_extremes(vec![
            restaurant("Few", 4.0, 3),
            restaurant("Many", 4.0, 8),
        ]);
        assert_eq!(top.unwrap().restaurant, "Many");
        assert_eq!(worst.unwrap().restaurant, "Many");
    }

    #[test]
    fn test_user_highlights() {
        let rows = vec![
            user_row("busy", 10, 3.0),
            user_row("sunny", 3, 4.8),
            user_row("grumpy", 4, 1.5),
            user_row("newbie", 1, 5.0),
        ];
        let highlights = user_highlights(&rows);

        assert_eq!(highlights.most_active.unwrap().name, "busy");
        assert_eq!(highlights.most_positive.unwrap().name, "sunny");
        assert_eq!(highlights.most_negative.unwrap().name, "grumpy");
    }

    #[test]
    fn test_user_highlights_without_enough_ratings() {
        let highlights = user_highlights(&[user_row("newbie", 2, 5.0)]);
        assert_eq!(highlights.most_active.unwrap().rating_count, 2);
        assert!(highlights.most_positive.is_none());
        assert!(highlights.most_negative.is_none());
    }

    #[test]
    fn test_user_highlights_use_display_name() {
        let mut row = user_row("ada.l", 3, 4.0);
        row.first_name = Some("Ada".into());
        row.last_name = Some("Lovelace".into());
        let highlights = user_highlights(&[row]);
        assert_eq!(highlights.most_positive.unwrap().name, "Ada Lovelace");
    }
}
