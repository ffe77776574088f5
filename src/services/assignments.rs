use sqlx::{Executor, PgConnection, PgPool, Postgres};
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::assignment::Assignment;
use crate::utils::error::{is_foreign_key_violation, is_unique_violation, AppError};
use crate::utils::validation::dedup_ids;

/// Minimal set of changes turning the current assignment set into the desired one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentDiff {
    pub to_add: Vec<Uuid>,
    pub to_remove: Vec<Uuid>,
}

impl AssignmentDiff {
    pub fn compute(current: &[Uuid], desired: &[Uuid]) -> Self {
        let current_set: HashSet<Uuid> = current.iter().copied().collect();
        let desired = dedup_ids(desired);
        let desired_set: HashSet<Uuid> = desired.iter().copied().collect();

        Self {
            to_add: desired
                .into_iter()
                .filter(|id| !current_set.contains(id))
                .collect(),
            to_remove: dedup_ids(current)
                .into_iter()
                .filter(|id| !desired_set.contains(id))
                .collect(),
        }
    }

    pub fn change_count(&self) -> u64 {
        (self.to_add.len() + self.to_remove.len()) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

pub async fn is_user_assigned(
    pool: &PgPool,
    user_id: Uuid,
    event_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM event_assignment WHERE user_id = $1 AND event_id = $2)",
    )
    .bind(user_id)
    .bind(event_id)
    .fetch_one(pool)
    .await
}

pub async fn current_assignments<'e, E>(executor: E, event_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, Uuid>(
        "SELECT user_id FROM event_assignment WHERE event_id = $1 ORDER BY created_at, user_id",
    )
    .bind(event_id)
    .fetch_all(executor)
    .await
}

/// Bulk-assigns users to an event. Repeated ids are inserted once.
pub async fn assign_users(
    conn: &mut PgConnection,
    assigned_by: Uuid,
    event_id: Uuid,
    user_ids: &[Uuid],
) -> Result<Vec<Assignment>, AppError> {
    let user_ids = dedup_ids(user_ids);
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = user_ids.iter().map(|_| Uuid::new_v4()).collect();

    let assignments = sqlx::query_as::<_, Assignment>(
        r#"INSERT INTO event_assignment (id, user_id, event_id, assigned_by)
           SELECT t.id, t.user_id, $3, $4
           FROM UNNEST($1::uuid[], $2::uuid[]) AS t(id, user_id)
           RETURNING id, user_id, event_id, assigned_by, created_at"#,
    )
    .bind(&ids)
    .bind(&user_ids)
    .bind(event_id)
    .bind(assigned_by)
    .fetch_all(&mut *conn)
    .await
    .map_err(insert_error)?;

    Ok(assignments)
}

/// Replaces the event's assignment set with `desired` using the minimal
/// delete/insert pair. Returns the number of users added plus removed.
pub async fn update_event_assignments(
    conn: &mut PgConnection,
    assigned_by: Uuid,
    event_id: Uuid,
    desired: &[Uuid],
) -> Result<u64, AppError> {
    let current = current_assignments(&mut *conn, event_id).await?;
    let diff = AssignmentDiff::compute(&current, desired);
    if diff.is_empty() {
        return Ok(0);
    }

    if !diff.to_remove.is_empty() {
        sqlx::query("DELETE FROM event_assignment WHERE event_id = $1 AND user_id = ANY($2)")
            .bind(event_id)
            .bind(&diff.to_remove)
            .execute(&mut *conn)
            .await?;
    }

    assign_users(conn, assigned_by, event_id, &diff.to_add).await?;

    tracing::info!(
        event_id = %event_id,
        added = diff.to_add.len(),
        removed = diff.to_remove.len(),
        "Event assignments synced"
    );

    Ok(diff.change_count())
}

fn insert_error(err: sqlx::Error) -> AppError {
    if is_foreign_key_violation(&err) {
        AppError::ValidationError("One or more selected users do not exist".to_string())
    } else if is_unique_violation(&err) {
        // Another admin assigned the same user in the meantime.
        AppError::Conflict("Assignments were changed concurrently, please retry".to_string())
    } else {
        AppError::DatabaseError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_diff_is_set_difference() {
        let u = ids(5);
        let current = vec![u[0], u[1], u[2]];
        let desired = vec![u[1], u[2], u[3], u[4]];

        let diff = AssignmentDiff::compute(&current, &desired);

        assert_eq!(diff.to_add, vec![u[3], u[4]]);
        assert_eq!(diff.to_remove, vec![u[0]]);
        assert_eq!(diff.change_count(), 3);
    }

    #[test]
    fn test_diff_unchanged_set_is_empty() {
        let u = ids(3);
        let diff = AssignmentDiff::compute(&u, &[u[2], u[0], u[1]]);
        assert!(diff.is_empty());
        assert_eq!(diff.change_count(), 0);
    }

    #[test]
    fn test_diff_ignores_duplicates_in_desired() {
        let u = ids(2);
        let diff = AssignmentDiff::compute(&[], &[u[0], u[1], u[0]]);
        assert_eq!(diff.to_add, vec![u[0], u[1]]);
        assert!(diff.to_remove.is_empty());
    }

    #[test]
    fn test_diff_clearing_all() {
        let u = ids(3);
        let diff = AssignmentDiff::compute(&u, &[]);
        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove, u);
        assert_eq!(diff.change_count(), 3);
    }

    #[test]
    fn test_foreign_key_mapping_passes_other_errors_through() {
        assert!(matches!(
            insert_error(sqlx::Error::RowNotFound),
            AppError::DatabaseError(_)
        ));
    }
}
