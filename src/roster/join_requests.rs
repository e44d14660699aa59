use std::sync::Arc;

use uuid::Uuid;

use crate::errors::RosterError;
use crate::models::join_request::{
    BulkRespondFailure, BulkRespondOutcome, JoinRequest, JoinRequestDecision, JoinRequestStatus,
};
use crate::models::membership::TeamRole;
use crate::models::team::TeamStatus;
use crate::roster::eligibility::EligibilityService;
use crate::roster::membership::MembershipService;
use crate::roster::{ensure_manager, Actor};
use crate::store::RosterStore;

/// The user-initiated path onto a team: a petition that a leader or admin
/// answers, singly or in bulk. Answered requests stay on record.
#[derive(Clone)]
pub struct JoinRequestService {
    store: Arc<dyn RosterStore>,
    eligibility: EligibilityService,
    membership: MembershipService,
}

impl JoinRequestService {
    pub fn new(
        store: Arc<dyn RosterStore>,
        eligibility: EligibilityService,
        membership: MembershipService,
    ) -> Self {
        Self {
            store,
            eligibility,
            membership,
        }
    }

    /// Capacity is checked here as a courtesy and re-checked at approval
    /// time; it may change while the request sits pending.
    pub async fn submit(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        message: Option<String>,
    ) -> Result<JoinRequest, RosterError> {
        let team = self
            .store
            .get_team(team_id)
            .await?
            .ok_or(RosterError::TeamNotFound(team_id))?;
        if team.status != TeamStatus::Active {
            return Err(RosterError::Validation(format!(
                "team '{}' is not accepting join requests",
                team.team_name
            )));
        }
        if team.is_invite_only {
            return Err(RosterError::Forbidden(format!(
                "team '{}' is invite-only; join with its invite code",
                team.team_name
            )));
        }

        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(RosterError::UserNotFound(user_id))?;

        if self
            .store
            .active_membership_for_user(team.event_id, user_id)
            .await?
            .is_some()
        {
            return Err(RosterError::AlreadyOnTeam {
                username: user.username,
            });
        }

        if !self.eligibility.is_candidate(team.event_id, user_id).await? {
            return Err(RosterError::IneligibleUser {
                identifier: user.username,
            });
        }

        if self.membership.is_full(team_id).await? {
            return Err(RosterError::TeamFull {
                team_name: team.team_name,
                max_size: team.max_size,
            });
        }

        let request = self
            .store
            .insert_join_request(JoinRequest::new(team_id, user_id, message))
            .await?;
        tracing::info!(
            "User {} petitioned to join team '{}' (request {})",
            user_id,
            team.team_name,
            request.id
        );
        Ok(request)
    }

    /// Answer a pending request. Approval goes through the membership
    /// ledger at the moment of commitment, so capacity and cross-team
    /// uniqueness are re-validated here rather than trusted from submission
    /// time. When that late check fails, the request is settled as rejected
    /// with a system-attributed reason — its terminal status always
    /// reflects whether a membership was actually created.
    pub async fn respond(
        &self,
        request_id: Uuid,
        decision: JoinRequestDecision,
        actor: &Actor,
    ) -> Result<JoinRequest, RosterError> {
        let request = self
            .store
            .get_join_request(request_id)
            .await?
            .ok_or(RosterError::RequestNotFound(request_id))?;
        let team = self
            .store
            .get_team(request.team_id)
            .await?
            .ok_or(RosterError::TeamNotFound(request.team_id))?;
        ensure_manager(&team, actor)?;

        let request = self
            .store
            .transition_join_request(request_id, decision.into(), Some(actor.user_id), None)
            .await?;

        if decision == JoinRequestDecision::Approved {
            if let Err(e) = self
                .membership
                .add_member(request.team_id, request.requested_by, TeamRole::Member)
                .await
            {
                self.store
                    .set_join_request_outcome(
                        request_id,
                        JoinRequestStatus::Rejected,
                        format!("approval could not be honored: {}", e),
                    )
                    .await?;
                tracing::warn!(
                    "Join request {} auto-rejected at approval time: {}",
                    request_id,
                    e
                );
                return Err(e);
            }
        }

        Ok(request)
    }

    /// Answer a batch of requests independently. One stale or already
    /// answered request must not block the rest, so this reports per-item
    /// outcomes instead of failing the batch.
    pub async fn bulk_respond(
        &self,
        request_ids: &[Uuid],
        decision: JoinRequestDecision,
        actor: &Actor,
    ) -> BulkRespondOutcome {
        let mut outcome = BulkRespondOutcome::default();
        for &request_id in request_ids {
            match self.respond(request_id, decision, actor).await {
                Ok(_) => outcome.successful.push(request_id),
                Err(e) => outcome.failed.push(BulkRespondFailure {
                    request_id,
                    reason: e.to_string(),
                }),
            }
        }
        outcome
    }

    pub async fn pending_for_team(
        &self,
        team_id: Uuid,
        actor: &Actor,
    ) -> Result<Vec<JoinRequest>, RosterError> {
        let team = self
            .store
            .get_team(team_id)
            .await?
            .ok_or(RosterError::TeamNotFound(team_id))?;
        ensure_manager(&team, actor)?;
        self.store.pending_join_requests(team_id).await
    }
}
