use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    #[sqlx(rename = "pending")]
    Pending,
    #[sqlx(rename = "accepted")]
    Accepted,
    #[sqlx(rename = "declined")]
    Declined,
    #[sqlx(rename = "expired")]
    Expired,
    #[sqlx(rename = "cancelled")]
    Cancelled,
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvitationStatus::Pending => write!(f, "pending"),
            InvitationStatus::Accepted => write!(f, "accepted"),
            InvitationStatus::Declined => write!(f, "declined"),
            InvitationStatus::Expired => write!(f, "expired"),
            InvitationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A leader-initiated, time-bounded offer for a specific user to join a
/// team. Expiry is a derived property checked at the point of use; a lapsed
/// invitation stays `pending` in storage until the next read normalizes it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub team_id: Uuid,
    pub invited_user_id: Uuid,
    pub invited_by: Uuid,
    pub message: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    /// Set when the platform itself settled the invitation, e.g. an
    /// acceptance that could no longer create a membership.
    pub resolution_note: Option<String>,
}

impl Invitation {
    pub fn new(
        team_id: Uuid,
        invited_user_id: Uuid,
        invited_by: Uuid,
        message: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id,
            invited_user_id,
            invited_by,
            message,
            expires_at,
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
            resolution_note: None,
        }
    }

    /// Derived expiry: true for a pending invitation whose deadline passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && now > self.expires_at
    }
}

#[derive(Debug, Deserialize)]
pub struct SendInvitationRequest {
    pub invitee_email: String,
    pub message: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RespondToInvitationRequest {
    pub accept: bool,
}
