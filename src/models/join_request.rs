use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JoinRequestStatus {
    #[sqlx(rename = "pending")]
    Pending,
    #[sqlx(rename = "approved")]
    Approved,
    #[sqlx(rename = "rejected")]
    Rejected,
}

impl std::fmt::Display for JoinRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinRequestStatus::Pending => write!(f, "pending"),
            JoinRequestStatus::Approved => write!(f, "approved"),
            JoinRequestStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A user-initiated petition to join a team. Terminal states are final;
/// answered requests are retained as an audit trail, never deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JoinRequest {
    pub id: Uuid,
    pub team_id: Uuid,
    pub requested_by: Uuid,
    pub message: Option<String>,
    pub status: JoinRequestStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub responded_by: Option<Uuid>,
    /// Set when the platform itself settled the request, e.g. an approval
    /// that could no longer create a membership.
    pub resolution_note: Option<String>,
}

impl JoinRequest {
    pub fn new(team_id: Uuid, requested_by: Uuid, message: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id,
            requested_by,
            message,
            status: JoinRequestStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
            responded_by: None,
            resolution_note: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum JoinRequestDecision {
    Approved,
    Rejected,
}

impl From<JoinRequestDecision> for JoinRequestStatus {
    fn from(decision: JoinRequestDecision) -> Self {
        match decision {
            JoinRequestDecision::Approved => JoinRequestStatus::Approved,
            JoinRequestDecision::Rejected => JoinRequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitJoinRequestRequest {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RespondToJoinRequestRequest {
    pub decision: JoinRequestDecision,
}

#[derive(Debug, Deserialize)]
pub struct BulkRespondRequest {
    pub request_ids: Vec<Uuid>,
    pub decision: JoinRequestDecision,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkRespondFailure {
    pub request_id: Uuid,
    pub reason: String,
}

/// Per-item outcome of a bulk response. One stale request never blocks the
/// rest of the batch.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BulkRespondOutcome {
    pub successful: Vec<Uuid>,
    pub failed: Vec<BulkRespondFailure>,
}
