//! Team formation and membership lifecycle.
//!
//! The services in this module own the rules for how users become members
//! of teams inside an event: direct add during team creation, and the
//! asynchronous join-request / invitation protocol. All team size and
//! leadership mutation funnels through the membership ledger; the
//! workflows never touch team state directly.

pub mod eligibility;
pub mod invitations;
pub mod join_requests;
pub mod lifecycle;
pub mod membership;
pub mod teams;

pub use lifecycle::RosterService;

use uuid::Uuid;

use crate::errors::RosterError;
use crate::middleware::auth::Claims;
use crate::models::team::Team;

/// The authenticated caller, as established by the session layer. The
/// services only perform business-rule authorization on top of it.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Actor {
    pub fn from_claims(claims: &Claims) -> Result<Self, RosterError> {
        let user_id = claims
            .user_id()
            .ok_or_else(|| RosterError::Validation("Invalid user ID".to_string()))?;
        Ok(Self {
            user_id,
            is_admin: claims.is_admin(),
        })
    }
}

/// Roster management is restricted to the team leader and admins.
pub(crate) fn ensure_manager(team: &Team, actor: &Actor) -> Result<(), RosterError> {
    if actor.is_admin || team.leader_id == actor.user_id {
        Ok(())
    } else {
        Err(RosterError::Forbidden(format!(
            "only the leader of team '{}' or an admin may perform this action",
            team.team_name
        )))
    }
}
