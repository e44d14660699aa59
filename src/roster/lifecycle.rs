use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::errors::RosterError;
use crate::models::invitation::{Invitation, InvitationStatus, SendInvitationRequest};
use crate::models::join_request::{
    BulkRespondOutcome, JoinRequest, JoinRequestDecision, SubmitJoinRequestRequest,
};
use crate::models::membership::{AddTeamMemberRequest, LeaderChange, Membership, TeamRole};
use crate::models::team::{CreateTeamRequest, Team, TeamStatus, TeamUpdateRequest, TeamWithMembers};
use crate::models::user::User;
use crate::roster::eligibility::EligibilityService;
use crate::roster::invitations::InvitationService;
use crate::roster::join_requests::JoinRequestService;
use crate::roster::membership::MembershipService;
use crate::roster::teams::TeamService;
use crate::roster::{ensure_manager, Actor};
use crate::services::notifier::{Notifier, RosterEvent};
use crate::store::{DisbandOutcome, RosterStore};

/// Facade that sequences the roster components for the multi-step flows
/// exposed at the boundary. It holds no state of its own; it exists so
/// checks are re-verified at the point of commitment, not only at the
/// point of the user-initiated request.
pub struct RosterService {
    store: Arc<dyn RosterStore>,
    eligibility: EligibilityService,
    teams: TeamService,
    membership: MembershipService,
    join_requests: JoinRequestService,
    invitations: InvitationService,
    notifier: Notifier,
}

impl RosterService {
    pub fn new(store: Arc<dyn RosterStore>, notifier: Notifier) -> Self {
        let eligibility = EligibilityService::new(store.clone());
        let membership = MembershipService::new(store.clone());
        Self {
            eligibility: eligibility.clone(),
            teams: TeamService::new(store.clone(), eligibility.clone()),
            join_requests: JoinRequestService::new(
                store.clone(),
                eligibility.clone(),
                membership.clone(),
            ),
            invitations: InvitationService::new(store.clone(), eligibility, membership.clone()),
            membership,
            notifier,
            store,
        }
    }

    // -- eligibility

    pub async fn eligible_candidates(
        &self,
        event_id: Uuid,
        exclude_team_id: Option<Uuid>,
    ) -> Result<Vec<User>, RosterError> {
        self.eligibility
            .eligible_candidates(event_id, exclude_team_id)
            .await
    }

    // -- teams

    pub async fn create_team(
        &self,
        request: CreateTeamRequest,
        actor: &Actor,
    ) -> Result<TeamWithMembers, RosterError> {
        let created = self.teams.create_team(request, actor).await?;
        self.notifier
            .publish(RosterEvent::TeamCreated {
                team_id: created.team.id,
                team_name: created.team.team_name.clone(),
                leader_id: created.team.leader_id,
                timestamp: Utc::now(),
            })
            .await;
        Ok(created)
    }

    pub async fn get_team_with_members(
        &self,
        team_id: Uuid,
    ) -> Result<TeamWithMembers, RosterError> {
        self.teams.get_team_with_members(team_id).await
    }

    pub async fn list_teams_for_event(&self, event_id: Uuid) -> Result<Vec<Team>, RosterError> {
        self.teams.list_teams_for_event(event_id).await
    }

    pub async fn update_team(
        &self,
        team_id: Uuid,
        request: TeamUpdateRequest,
        actor: &Actor,
    ) -> Result<Team, RosterError> {
        let disbanding = request.status == Some(TeamStatus::Disbanded);
        let team = self.teams.update_team(team_id, request, actor).await?;
        if disbanding {
            self.notifier
                .publish(RosterEvent::TeamDisbanded {
                    team_id,
                    timestamp: Utc::now(),
                })
                .await;
        }
        Ok(team)
    }

    pub async fn delete_team(
        &self,
        team_id: Uuid,
        actor: &Actor,
    ) -> Result<DisbandOutcome, RosterError> {
        let outcome = self.teams.delete_team(team_id, actor).await?;
        self.notifier
            .publish(RosterEvent::TeamDisbanded {
                team_id,
                timestamp: Utc::now(),
            })
            .await;
        Ok(outcome)
    }

    pub async fn rotate_invite_code(
        &self,
        team_id: Uuid,
        actor: &Actor,
    ) -> Result<Team, RosterError> {
        self.teams.rotate_invite_code(team_id, actor).await
    }

    /// Direct join for invite-only teams: a valid code grants membership
    /// without a petition, subject to the same eligibility and capacity
    /// rules as every other entry path.
    pub async fn join_by_code(
        &self,
        invite_code: &str,
        actor: &Actor,
    ) -> Result<TeamWithMembers, RosterError> {
        let team = self
            .store
            .get_team_by_invite_code(invite_code)
            .await?
            .ok_or_else(|| RosterError::Validation("Unknown invite code".to_string()))?;

        let user = self
            .store
            .get_user(actor.user_id)
            .await?
            .ok_or(RosterError::UserNotFound(actor.user_id))?;

        if self
            .store
            .active_membership_for_user(team.event_id, actor.user_id)
            .await?
            .is_some()
        {
            return Err(RosterError::AlreadyOnTeam {
                username: user.username,
            });
        }
        if !self
            .eligibility
            .is_candidate(team.event_id, actor.user_id)
            .await?
        {
            return Err(RosterError::IneligibleUser {
                identifier: user.username,
            });
        }

        self.membership
            .add_member(team.id, actor.user_id, TeamRole::Member)
            .await?;
        self.notifier
            .publish(RosterEvent::MemberAdded {
                team_id: team.id,
                user_id: actor.user_id,
                timestamp: Utc::now(),
            })
            .await;

        self.teams.get_team_with_members(team.id).await
    }

    // -- membership ledger, with boundary authorization

    pub async fn add_member(
        &self,
        team_id: Uuid,
        request: AddTeamMemberRequest,
        actor: &Actor,
    ) -> Result<Membership, RosterError> {
        let team = self.teams.get_team(team_id).await?;
        ensure_manager(&team, actor)?;

        let role = request.role.unwrap_or(TeamRole::Member);
        let added = self
            .membership
            .add_member(team_id, request.user_id, role)
            .await?;

        self.notifier
            .publish(RosterEvent::MemberAdded {
                team_id,
                user_id: request.user_id,
                timestamp: Utc::now(),
            })
            .await;
        if let Some(demoted) = added.demoted_leader {
            self.notifier
                .publish(RosterEvent::LeaderChanged {
                    team_id,
                    demoted,
                    promoted: request.user_id,
                    timestamp: Utc::now(),
                })
                .await;
        }
        Ok(added.membership)
    }

    /// Members may leave on their own; removing someone else takes the
    /// leader or an admin.
    pub async fn remove_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        actor: &Actor,
    ) -> Result<Membership, RosterError> {
        let team = self.teams.get_team(team_id).await?;
        if actor.user_id != user_id {
            ensure_manager(&team, actor)?;
        }

        let removed = self.membership.remove_member(team_id, user_id).await?;
        self.notifier
            .publish(RosterEvent::MemberRemoved {
                team_id,
                user_id,
                timestamp: Utc::now(),
            })
            .await;
        Ok(removed)
    }

    pub async fn reassign_leader(
        &self,
        team_id: Uuid,
        new_leader_user_id: Uuid,
        actor: &Actor,
    ) -> Result<LeaderChange, RosterError> {
        let team = self.teams.get_team(team_id).await?;
        ensure_manager(&team, actor)?;

        let change = self
            .membership
            .reassign_leader(team_id, new_leader_user_id)
            .await?;
        self.notifier
            .publish(RosterEvent::LeaderChanged {
                team_id,
                demoted: change.demoted,
                promoted: change.promoted,
                timestamp: Utc::now(),
            })
            .await;
        Ok(change)
    }

    // -- join requests

    pub async fn submit_join_request(
        &self,
        team_id: Uuid,
        request: SubmitJoinRequestRequest,
        actor: &Actor,
    ) -> Result<JoinRequest, RosterError> {
        let submitted = self
            .join_requests
            .submit(team_id, actor.user_id, request.message)
            .await?;
        self.notifier
            .publish(RosterEvent::JoinRequestSubmitted {
                request_id: submitted.id,
                team_id,
                requested_by: actor.user_id,
                timestamp: Utc::now(),
            })
            .await;
        Ok(submitted)
    }

    pub async fn respond_join_request(
        &self,
        request_id: Uuid,
        decision: JoinRequestDecision,
        actor: &Actor,
    ) -> Result<JoinRequest, RosterError> {
        let request = self.join_requests.respond(request_id, decision, actor).await?;
        self.notifier
            .publish(RosterEvent::JoinRequestSettled {
                request_id,
                team_id: request.team_id,
                status: request.status.clone(),
                timestamp: Utc::now(),
            })
            .await;
        Ok(request)
    }

    pub async fn bulk_respond_join_requests(
        &self,
        request_ids: &[Uuid],
        decision: JoinRequestDecision,
        actor: &Actor,
    ) -> BulkRespondOutcome {
        let outcome = self
            .join_requests
            .bulk_respond(request_ids, decision, actor)
            .await;
        for &request_id in &outcome.successful {
            if let Ok(Some(request)) = self.store.get_join_request(request_id).await {
                self.notifier
                    .publish(RosterEvent::JoinRequestSettled {
                        request_id,
                        team_id: request.team_id,
                        status: request.status.clone(),
                        timestamp: Utc::now(),
                    })
                    .await;
            }
        }
        outcome
    }

    pub async fn pending_join_requests(
        &self,
        team_id: Uuid,
        actor: &Actor,
    ) -> Result<Vec<JoinRequest>, RosterError> {
        self.join_requests.pending_for_team(team_id, actor).await
    }

    // -- invitations

    pub async fn send_invitation(
        &self,
        team_id: Uuid,
        request: SendInvitationRequest,
        actor: &Actor,
    ) -> Result<Invitation, RosterError> {
        let invitation = self.invitations.send(team_id, request, actor).await?;
        self.notifier
            .publish(RosterEvent::InvitationSent {
                invitation_id: invitation.id,
                team_id,
                invited_user_id: invitation.invited_user_id,
                timestamp: Utc::now(),
            })
            .await;
        Ok(invitation)
    }

    pub async fn respond_invitation(
        &self,
        invitation_id: Uuid,
        accept: bool,
        actor: &Actor,
    ) -> Result<Invitation, RosterError> {
        let invitation = self
            .invitations
            .respond(invitation_id, accept, actor.user_id)
            .await?;
        self.notifier
            .publish(RosterEvent::InvitationSettled {
                invitation_id,
                team_id: invitation.team_id,
                status: invitation.status.clone(),
                timestamp: Utc::now(),
            })
            .await;
        Ok(invitation)
    }

    pub async fn cancel_invitation(
        &self,
        invitation_id: Uuid,
        actor: &Actor,
    ) -> Result<Invitation, RosterError> {
        let invitation = self.invitations.cancel(invitation_id, actor).await?;
        self.notifier
            .publish(RosterEvent::InvitationSettled {
                invitation_id,
                team_id: invitation.team_id,
                status: InvitationStatus::Cancelled,
                timestamp: Utc::now(),
            })
            .await;
        Ok(invitation)
    }

    pub async fn my_invitations(&self, actor: &Actor) -> Result<Vec<Invitation>, RosterError> {
        self.invitations.list_for_user(actor.user_id).await
    }

    pub async fn team_invitations(
        &self,
        team_id: Uuid,
        actor: &Actor,
    ) -> Result<Vec<Invitation>, RosterError> {
        self.invitations.list_for_team(team_id, actor).await
    }
}
