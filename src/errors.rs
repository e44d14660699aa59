use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::common::ApiResponse;

/// Business-rule failures of the membership lifecycle. Every variant maps
/// to a stable, human-readable message with enough context for the
/// presentation layer to render without re-deriving state.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("{0}")]
    Validation(String),

    #[error("{identifier} is not an eligible candidate for this event")]
    IneligibleUser { identifier: String },

    #[error("{username} already holds an active team membership in this event")]
    AlreadyOnTeam { username: String },

    #[error("team '{team_name}' is already full ({max_size} members)")]
    TeamFull { team_name: String, max_size: i32 },

    #[error("cannot shrink maximum size to {requested}: team has {current} active members")]
    Capacity { current: i64, requested: i32 },

    #[error("the member list assigns the captain role to more than one user")]
    DuplicateCaptain,

    #[error("a pending join request for this team already exists")]
    DuplicatePendingRequest,

    #[error("a pending invitation to this user for this team already exists")]
    DuplicatePendingInvitation,

    #[error("{entity} has already been settled (status: {current})")]
    InvalidStateTransition {
        entity: &'static str,
        current: String,
    },

    #[error("this invitation expired at {expired_at}")]
    InvitationExpired { expired_at: DateTime<Utc> },

    #[error("cannot remove the team leader: reassign leadership first")]
    LeaderRemoval,

    #[error("user is not an active member of this team")]
    NotATeamMember,

    #[error("{0}")]
    Forbidden(String),

    #[error("event {0} not found")]
    EventNotFound(Uuid),

    #[error("team {0} not found")]
    TeamNotFound(Uuid),

    #[error("user {0} not found")]
    UserNotFound(Uuid),

    #[error("join request {0} not found")]
    RequestNotFound(Uuid),

    #[error("invitation {0} not found")]
    InvitationNotFound(Uuid),

    #[error("storage error")]
    Storage(#[from] sqlx::Error),
}

impl actix_web::ResponseError for RosterError {
    fn status_code(&self) -> StatusCode {
        match self {
            RosterError::Validation(_) | RosterError::DuplicateCaptain => StatusCode::BAD_REQUEST,
            RosterError::IneligibleUser { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            RosterError::AlreadyOnTeam { .. }
            | RosterError::TeamFull { .. }
            | RosterError::Capacity { .. }
            | RosterError::DuplicatePendingRequest
            | RosterError::DuplicatePendingInvitation
            | RosterError::InvalidStateTransition { .. }
            | RosterError::LeaderRemoval => StatusCode::CONFLICT,
            RosterError::InvitationExpired { .. } => StatusCode::GONE,
            RosterError::Forbidden(_) => StatusCode::FORBIDDEN,
            RosterError::NotATeamMember
            | RosterError::EventNotFound(_)
            | RosterError::TeamNotFound(_)
            | RosterError::UserNotFound(_)
            | RosterError::RequestNotFound(_)
            | RosterError::InvitationNotFound(_) => StatusCode::NOT_FOUND,
            RosterError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let RosterError::Storage(e) = self {
            tracing::error!("Storage failure: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"));
        }

        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::error(self.to_string()))
    }
}
