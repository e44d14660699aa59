//! Storage port for the membership lifecycle.
//!
//! The domain services are written against [`RosterStore`] so the invariants
//! hold regardless of the backing technology. Mutating operations marked
//! atomic below must be serialized per team by each implementation — via a
//! lock, a compare-and-swap, or a storage transaction — so that two racing
//! callers never both observe room on a team at capacity minus one.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::RosterError;
use crate::models::invitation::{Invitation, InvitationStatus};
use crate::models::join_request::{JoinRequest, JoinRequestStatus};
use crate::models::membership::{LeaderChange, MemberAdded, MemberInfo, Membership, TeamRole};
use crate::models::team::Team;
use crate::models::user::User;

pub use memory::InMemoryRosterStore;
pub use postgres::PgRosterStore;

/// Counts reported by a team disbandment cascade, for logging and the
/// response body.
#[derive(Debug, Default, serde::Serialize)]
pub struct DisbandOutcome {
    pub members_deactivated: u64,
    pub requests_rejected: u64,
    pub invitations_cancelled: u64,
}

#[async_trait]
pub trait RosterStore: Send + Sync {
    // -- accounts and events (owned by external subsystems, read-only here)

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, RosterError>;

    async fn event_exists(&self, event_id: Uuid) -> Result<bool, RosterError>;

    /// Users holding an active (not withdrawn) registration for the event.
    async fn active_registrations(&self, event_id: Uuid) -> Result<Vec<User>, RosterError>;

    /// All active memberships across every team of the event.
    async fn active_memberships_in_event(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<Membership>, RosterError>;

    // -- teams

    async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>, RosterError>;

    async fn get_team_by_invite_code(&self, code: &str) -> Result<Option<Team>, RosterError>;

    async fn list_teams_for_event(&self, event_id: Uuid) -> Result<Vec<Team>, RosterError>;

    /// Atomic: persists the team and its whole initial roster, or nothing.
    /// Partial rosters must never be observable.
    async fn create_team_with_roster(
        &self,
        team: Team,
        memberships: Vec<Membership>,
    ) -> Result<Team, RosterError>;

    async fn update_team(&self, team: &Team) -> Result<(), RosterError>;

    /// Atomic cascade: team status to disbanded, active memberships to
    /// inactive, pending join requests to rejected (system-attributed),
    /// pending invitations to cancelled.
    async fn disband_team(&self, team_id: Uuid) -> Result<DisbandOutcome, RosterError>;

    // -- memberships

    async fn active_members(&self, team_id: Uuid) -> Result<Vec<Membership>, RosterError>;

    /// Active roster joined with account details, leader first.
    async fn member_details(&self, team_id: Uuid) -> Result<Vec<MemberInfo>, RosterError>;

    async fn active_membership_for_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, RosterError>;

    async fn count_active_members(&self, team_id: Uuid) -> Result<i64, RosterError>;

    /// Atomic guarded add: enforces the one-active-membership-per-event rule,
    /// the capacity bound, and — when adding a leader — the single-leader
    /// handoff (the previous leader is demoted in the same step).
    async fn add_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<MemberAdded, RosterError>;

    /// Atomic removal. Rejects removing the active leader; leadership must
    /// be reassigned first. Disbandment goes through [`Self::disband_team`].
    async fn remove_member(&self, team_id: Uuid, user_id: Uuid)
        -> Result<Membership, RosterError>;

    /// Atomic leadership handoff: demotes the current leader and promotes an
    /// existing active member, never leaving zero or two leaders.
    async fn swap_leader(
        &self,
        team_id: Uuid,
        new_leader_user_id: Uuid,
    ) -> Result<LeaderChange, RosterError>;

    // -- join requests

    /// Guarded insert: at most one pending request per (team, user).
    async fn insert_join_request(&self, request: JoinRequest)
        -> Result<JoinRequest, RosterError>;

    async fn get_join_request(&self, id: Uuid) -> Result<Option<JoinRequest>, RosterError>;

    async fn pending_join_requests(&self, team_id: Uuid) -> Result<Vec<JoinRequest>, RosterError>;

    /// Compare-and-set from `pending`. A request already settled fails with
    /// `InvalidStateTransitionError`, which is what makes terminal states
    /// idempotent under racing responders.
    async fn transition_join_request(
        &self,
        id: Uuid,
        to: JoinRequestStatus,
        responded_by: Option<Uuid>,
        note: Option<String>,
    ) -> Result<JoinRequest, RosterError>;

    /// Unconditional override, used only to settle a request whose approval
    /// could no longer create a membership.
    async fn set_join_request_outcome(
        &self,
        id: Uuid,
        to: JoinRequestStatus,
        note: String,
    ) -> Result<(), RosterError>;

    // -- invitations

    /// Guarded insert: at most one live invitation per (team, user).
    async fn insert_invitation(&self, invitation: Invitation)
        -> Result<Invitation, RosterError>;

    async fn get_invitation(&self, id: Uuid) -> Result<Option<Invitation>, RosterError>;

    async fn invitations_for_user(&self, user_id: Uuid) -> Result<Vec<Invitation>, RosterError>;

    async fn invitations_for_team(&self, team_id: Uuid) -> Result<Vec<Invitation>, RosterError>;

    /// Compare-and-set from `pending`, mirroring
    /// [`Self::transition_join_request`].
    async fn transition_invitation(
        &self,
        id: Uuid,
        to: InvitationStatus,
        note: Option<String>,
    ) -> Result<Invitation, RosterError>;

    /// Unconditional override, used only to settle an invitation whose
    /// acceptance could no longer create a membership.
    async fn set_invitation_outcome(
        &self,
        id: Uuid,
        to: InvitationStatus,
        note: String,
    ) -> Result<(), RosterError>;
}
