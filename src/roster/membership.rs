use std::sync::Arc;

use uuid::Uuid;

use crate::errors::RosterError;
use crate::models::membership::{LeaderChange, MemberAdded, Membership, TeamRole};
use crate::store::RosterStore;

/// The membership ledger: the single point that mutates team size and
/// leadership. Both workflows and the registry funnel through it, which is
/// what keeps the capacity bound and the one-leader rule enforceable.
#[derive(Clone)]
pub struct MembershipService {
    store: Arc<dyn RosterStore>,
}

impl MembershipService {
    pub fn new(store: Arc<dyn RosterStore>) -> Self {
        Self { store }
    }

    /// Add a user to a team. Rejected when the user already holds an active
    /// membership in the event or the team is at capacity; adding a leader
    /// demotes the previous leader in the same atomic step.
    pub async fn add_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<MemberAdded, RosterError> {
        let added = self.store.add_member(team_id, user_id, role).await?;
        if let Some(demoted) = added.demoted_leader {
            tracing::info!(
                "Leadership of team {} handed from {} to {}",
                team_id,
                demoted,
                user_id
            );
        } else {
            tracing::info!("Added user {} to team {}", user_id, team_id);
        }
        Ok(added)
    }

    /// Deactivate a membership. The active leader cannot be removed;
    /// leadership has to be reassigned first. Disbandment runs its own
    /// cascade and does not pass through here.
    pub async fn remove_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Membership, RosterError> {
        let removed = self.store.remove_member(team_id, user_id).await?;
        tracing::info!("Removed user {} from team {}", user_id, team_id);
        Ok(removed)
    }

    /// Atomically demote the current leader and promote an existing active
    /// member. The team never observes zero or two leaders.
    pub async fn reassign_leader(
        &self,
        team_id: Uuid,
        new_leader_user_id: Uuid,
    ) -> Result<LeaderChange, RosterError> {
        let change = self.store.swap_leader(team_id, new_leader_user_id).await?;
        tracing::info!(
            "Leadership of team {} handed from {} to {}",
            team_id,
            change.demoted,
            change.promoted
        );
        Ok(change)
    }

    pub async fn current_size(&self, team_id: Uuid) -> Result<i64, RosterError> {
        self.store.count_active_members(team_id).await
    }

    pub async fn is_full(&self, team_id: Uuid) -> Result<bool, RosterError> {
        let team = self
            .store
            .get_team(team_id)
            .await?
            .ok_or(RosterError::TeamNotFound(team_id))?;
        let size = self.store.count_active_members(team_id).await?;
        Ok(size >= team.max_size as i64)
    }
}
