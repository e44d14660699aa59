use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A competition instance. Events are owned by the event registration
/// subsystem; teams and memberships are always scoped to one event.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    #[sqlx(rename = "active")]
    Active,
    #[sqlx(rename = "withdrawn")]
    Withdrawn,
}

/// A user's registration for an event. Withdrawn registrations make the
/// user ineligible for team membership in that event.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EventRegistration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}
