use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub assigned_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentStatus {
    pub event_id: Uuid,
    pub is_assigned: bool,
}

#[derive(Debug, Serialize)]
pub struct EventAssignments {
    pub event_id: Uuid,
    pub assigned_user_ids: Vec<Uuid>,
}
