use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::event::{
    CreateEventRequest, CreatedEvent, Event, EventAverages, EventWithDetails, UpdateEventRequest,
    UpdatedEvent,
};
use crate::models::rating::{Rating, RatingWithUser};
use crate::models::user::{User, UserResponse};
use crate::services::assignments;
use crate::services::users::USER_COLUMNS;
use crate::utils::error::AppError;
use crate::utils::validation::{validate_restaurant, validate_total_cost};

const EVENT_COLUMNS: &str = "id, date, restaurant, total_cost, created_at";

#[derive(Debug, FromRow)]
struct AssignedUserRow {
    event_id: Uuid,
    #[sqlx(flatten)]
    user: User,
}

/// All events, newest first, with ratings, assigned users and averages.
pub async fn list_events(pool: &PgPool) -> Result<Vec<EventWithDetails>, sqlx::Error> {
    let query = format!("SELECT {EVENT_COLUMNS} FROM event ORDER BY date DESC, created_at DESC");
    let events = sqlx::query_as::<_, Event>(&query).fetch_all(pool).await?;
    load_details(pool, events).await
}

pub async fn get_event(pool: &PgPool, event_id: Uuid) -> Result<Option<EventWithDetails>, sqlx::Error> {
    let query = format!("SELECT {EVENT_COLUMNS} FROM event WHERE id = $1");
    let Some(event) = sqlx::query_as::<_, Event>(&query)
        .bind(event_id)
        .fetch_optional(pool)
        .await?
    else {
        return Ok(None);
    };

    Ok(load_details(pool, vec![event]).await?.into_iter().next())
}

async fn load_details(
    pool: &PgPool,
    events: Vec<Event>,
) -> Result<Vec<EventWithDetails>, sqlx::Error> {
    if events.is_empty() {
        return Ok(Vec::new());
    }
    let event_ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();

    let ratings = sqlx::query_as::<_, Rating>(
        r#"SELECT id, user_id, event_id, legacy_score, food_score, ambience_score,
                  price_performance_score, comment, created_at
           FROM rating
           WHERE event_id = ANY($1)
           ORDER BY created_at"#,
    )
    .bind(&event_ids)
    .fetch_all(pool)
    .await?;

    let query = format!(
        r#"SELECT a.event_id, {USER_COLUMNS}
           FROM event_assignment a
           JOIN "user" u ON u.id = a.user_id
           WHERE a.event_id = ANY($1)"#
    );
    let assigned = sqlx::query_as::<_, AssignedUserRow>(&query)
        .bind(&event_ids)
        .fetch_all(pool)
        .await?;

    let mut rater_ids: Vec<Uuid> = ratings.iter().map(|r| r.user_id).collect();
    rater_ids.sort_unstable();
    rater_ids.dedup();
    let query = format!(r#"SELECT {USER_COLUMNS} FROM "user" u WHERE u.id = ANY($1)"#);
    let raters = sqlx::query_as::<_, User>(&query)
        .bind(&rater_ids)
        .fetch_all(pool)
        .await?;

    let assigned = assigned.into_iter().map(|row| (row.event_id, row.user)).collect();
    Ok(assemble(events, ratings, assigned, raters))
}

/// Groups ratings and assigned users under their events and computes averages.
fn assemble(
    events: Vec<Event>,
    ratings: Vec<Rating>,
    assigned: Vec<(Uuid, User)>,
    raters: Vec<User>,
) -> Vec<EventWithDetails> {
    let raters: HashMap<Uuid, User> = raters.into_iter().map(|u| (u.id, u)).collect();

    let mut ratings_by_event: HashMap<Uuid, Vec<Rating>> = HashMap::new();
    for rating in ratings {
        ratings_by_event.entry(rating.event_id).or_default().push(rating);
    }

    let mut assigned_by_event: HashMap<Uuid, Vec<User>> = HashMap::new();
    for (event_id, user) in assigned {
        assigned_by_event.entry(event_id).or_default().push(user);
    }

    events
        .into_iter()
        .map(|event| {
            let ratings = ratings_by_event.remove(&event.id).unwrap_or_default();
            let averages = EventAverages::from_ratings(&ratings);

            let mut assigned_users: Vec<UserResponse> = assigned_by_event
                .remove(&event.id)
                .unwrap_or_default()
                .into_iter()
                .map(UserResponse::from)
                .collect();
            assigned_users.sort_by_key(|u| u.display_name.to_lowercase());

            let ratings: Vec<RatingWithUser> = ratings
                .into_iter()
                .filter_map(|rating| {
                    let user = raters.get(&rating.user_id)?.clone();
                    Some(RatingWithUser {
                        overall_score: rating.overall_score(),
                        user: user.into(),
                        rating,
                    })
                })
                .collect();

            EventWithDetails {
                total_ratings: ratings.len(),
                event,
                ratings,
                assigned_users,
                averages,
                ratings_hidden: false,
            }
        })
        .collect()
}

pub async fn insert_event(
    conn: &mut PgConnection,
    restaurant: &str,
    date: DateTime<Utc>,
    total_cost: Option<Decimal>,
) -> Result<Event, sqlx::Error> {
    let query = format!(
        "INSERT INTO event (id, date, restaurant, total_cost) VALUES ($1, $2, $3, $4) \
         RETURNING {EVENT_COLUMNS}"
    );
    sqlx::query_as::<_, Event>(&query)
        .bind(Uuid::new_v4())
        .bind(date)
        .bind(restaurant)
        .bind(total_cost)
        .fetch_one(conn)
        .await
}

/// Partial update. Returns `None` for an unknown event.
pub async fn update_event(
    conn: &mut PgConnection,
    event_id: Uuid,
    restaurant: Option<&str>,
    date: Option<DateTime<Utc>>,
    total_cost: Option<Decimal>,
) -> Result<Option<Event>, sqlx::Error> {
    let query = format!(
        r#"UPDATE event SET
               restaurant = COALESCE($2, restaurant),
               date = COALESCE($3, date),
               total_cost = COALESCE($4, total_cost)
           WHERE id = $1
           RETURNING {EVENT_COLUMNS}"#
    );
    sqlx::query_as::<_, Event>(&query)
        .bind(event_id)
        .bind(restaurant)
        .bind(date)
        .bind(total_cost)
        .fetch_optional(conn)
        .await
}

pub async fn event_exists(pool: &PgPool, event_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM event WHERE id = $1)")
        .bind(event_id)
        .fetch_one(pool)
        .await
}

/// Deletes an event along with its assignments and ratings.
pub async fn delete_event(pool: &PgPool, event_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM event WHERE id = $1")
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Creates an event and its initial assignments in one transaction.
pub async fn create_event_with_assignments(
    pool: &PgPool,
    admin_id: Uuid,
    request: CreateEventRequest,
) -> Result<CreatedEvent, AppError> {
    let restaurant = validate_restaurant(&request.restaurant)?;
    let total_cost = validate_total_cost(request.total_cost)?;

    let mut tx = pool.begin().await?;
    let event = insert_event(&mut tx, &restaurant, request.date, total_cost).await?;
    let assigned = request.assigned_user_ids.unwrap_or_default();
    let assignments = assignments::assign_users(&mut tx, admin_id, event.id, &assigned).await?;
    tx.commit().await?;

    tracing::info!(
        event_id = %event.id,
        restaurant = %event.restaurant,
        assigned = assignments.len(),
        "Event created"
    );

    Ok(CreatedEvent {
        assigned_count: assignments.len(),
        event,
        assignments,
    })
}

/// Applies a partial update and, when requested, syncs the assignment set.
pub async fn update_event_with_assignments(
    pool: &PgPool,
    admin_id: Uuid,
    event_id: Uuid,
    request: UpdateEventRequest,
) -> Result<UpdatedEvent, AppError> {
    let restaurant = request
        .restaurant
        .as_deref()
        .map(validate_restaurant)
        .transpose()?;
    let total_cost = validate_total_cost(request.total_cost)?;

    let mut tx = pool.begin().await?;
    let event = update_event(&mut tx, event_id, restaurant.as_deref(), request.date, total_cost)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{}' was not found", event_id)))?;

    let assignment_changes = match &request.assigned_user_ids {
        Some(desired) => {
            assignments::update_event_assignments(&mut tx, admin_id, event_id, desired).await?
        }
        None => 0,
    };
    tx.commit().await?;

    tracing::info!(event_id = %event.id, assignment_changes, "Event updated");

    Ok(UpdatedEvent {
        event,
        assignment_changes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            first_name: None,
            last_name: None,
            email: format!("{}@example.com", name.to_lowercase()),
            image: None,
            is_admin: false,
            is_confirmed: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn event(restaurant: &str) -> Event {
        Event {
            id: Uuid::new_v4(),
            date: Utc.with_ymd_and_hms(2025, 2, 14, 19, 0, 0).unwrap(),
            restaurant: restaurant.to_string(),
            total_cost: None,
            created_at: Utc::now(),
        }
    }

    fn rating(user: &User, event: &Event, food: i16, ambience: i16, price: i16) -> Rating {
        Rating {
            id: Uuid::new_v4(),
            user_id: user.id,
            event_id: event.id,
            legacy_score: None,
            food_score: Some(food),
            ambience_score: Some(ambience),
            price_performance_score: Some(price),
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_assemble_groups_by_event() {
        let (anna, bert, carl) = (user("anna"), user("Bert"), user("carl"));
        let (pizza, sushi) = (event("Pizzeria"), event("Sushi Bar"));

        let ratings = vec![
            rating(&anna, &pizza, 5, 5, 5),
            rating(&bert, &pizza, 3, 3, 3),
            rating(&carl, &sushi, 2, 2, 2),
        ];
        let assigned = vec![
            (pizza.id, carl.clone()),
            (pizza.id, anna.clone()),
            (pizza.id, bert.clone()),
            (sushi.id, carl.clone()),
        ];

        let details = assemble(
            vec![pizza.clone(), sushi.clone()],
            ratings,
            assigned,
            vec![anna.clone(), bert.clone(), carl.clone()],
        );

        assert_eq!(details.len(), 2);
        let pizza_details = &details[0];
        assert_eq!(pizza_details.event.id, pizza.id);
        assert_eq!(pizza_details.total_ratings, 2);
        assert_eq!(pizza_details.averages.overall, Some(4.0));
        let names: Vec<&str> = pizza_details
            .assigned_users
            .iter()
            .map(|u| u.name.as_str())
            .collect();
        assert_eq!(names, vec!["anna", "Bert", "carl"]);

        let sushi_details = &details[1];
        assert_eq!(sushi_details.total_ratings, 1);
        assert_eq!(sushi_details.averages.food, Some(2.0));
        assert_eq!(sushi_details.ratings[0].user.id, carl.id);
    }

    #[test]
    fn test_assemble_event_without_activity() {
        let details = assemble(vec![event("Empty")], vec![], vec![], vec![]);
        assert_eq!(details[0].total_ratings, 0);
        assert!(details[0].assigned_users.is_empty());
        assert_eq!(details[0].averages, EventAverages::default());
    }

    #[test]
    fn test_hide_ratings_keeps_only_viewer() {
        let (anna, bert) = (user("anna"), user("bert"));
        let pizza = event("Pizzeria");
        let mut details = assemble(
            vec![pizza.clone()],
            vec![rating(&anna, &pizza, 5, 5, 5), rating(&bert, &pizza, 1, 1, 1)],
            vec![],
            vec![anna.clone(), bert.clone()],
        )
        .remove(0);

        details.hide_ratings(anna.id);

        assert!(details.ratings_hidden);
        assert_eq!(details.ratings.len(), 1);
        assert_eq!(details.ratings[0].user.id, anna.id);
        assert_eq!(details.averages, EventAverages::default());
        assert_eq!(details.total_ratings, 2);
    }
}
