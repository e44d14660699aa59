use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::errors::RosterError;
use crate::models::invitation::{Invitation, InvitationStatus, SendInvitationRequest};
use crate::models::membership::TeamRole;
use crate::models::team::TeamStatus;
use crate::roster::eligibility::EligibilityService;
use crate::roster::membership::MembershipService;
use crate::roster::{ensure_manager, Actor};
use crate::store::RosterStore;

/// The leader-initiated path onto a team: a time-bounded offer to one
/// eligible user. Expiry is enforced lazily at the point of use; there is
/// no background sweep.
#[derive(Clone)]
pub struct InvitationService {
    store: Arc<dyn RosterStore>,
    eligibility: EligibilityService,
    membership: MembershipService,
}

impl InvitationService {
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

    /// Invite an event-registered user by email. The email must resolve to
    /// an eligible candidate for the team's event, the expiry must be
    /// strictly in the future, and at most one invitation per (team, user)
    /// pair may be live at a time.
    pub async fn send(
        &self,
        team_id: Uuid,
        request: SendInvitationRequest,
        actor: &Actor,
    ) -> Result<Invitation, RosterError> {
        let team = self
            .store
            .get_team(team_id)
            .await?
            .ok_or(RosterError::TeamNotFound(team_id))?;
        if team.status != TeamStatus::Active {
            return Err(RosterError::Validation(format!(
                "team '{}' is not active",
                team.team_name
            )));
        }
        ensure_manager(&team, actor)?;

        if request.expires_at <= Utc::now() {
            return Err(RosterError::Validation(
                "Invitation expiry must be in the future".to_string(),
            ));
        }

        let invitee = self
            .eligibility
            .resolve_candidate_by_email(team.event_id, &request.invitee_email)
            .await?;

        if self.membership.is_full(team_id).await? {
            return Err(RosterError::TeamFull {
                team_name: team.team_name,
                max_size: team.max_size,
            });
        }

        let invitation = self
            .store
            .insert_invitation(Invitation::new(
                team_id,
                invitee.id,
                actor.user_id,
                request.message,
                request.expires_at,
            ))
            .await?;
        tracing::info!(
            "Invited {} to team '{}' (invitation {}, expires {})",
            invitee.username,
            team.team_name,
            invitation.id,
            invitation.expires_at
        );
        Ok(invitation)
    }

    /// Accept or decline. An invitation past its deadline is normalized to
    /// `expired` before anything else and the response fails, whatever the
    /// body asked for. Acceptance commits through the membership ledger;
    /// when that late check fails, the invitation is settled as declined
    /// with a system-attributed reason.
    pub async fn respond(
        &self,
        invitation_id: Uuid,
        accept: bool,
        responding_user_id: Uuid,
    ) -> Result<Invitation, RosterError> {
        let invitation = self
            .store
            .get_invitation(invitation_id)
            .await?
            .ok_or(RosterError::InvitationNotFound(invitation_id))?;

        if let Some(expired) = self.normalize_expiry(&invitation).await {
            return Err(expired);
        }

        if invitation.invited_user_id != responding_user_id {
            return Err(RosterError::Forbidden(
                "only the invited user may respond to this invitation".to_string(),
            ));
        }

        let to = if accept {
            InvitationStatus::Accepted
        } else {
            InvitationStatus::Declined
        };
        let invitation = self
            .store
            .transition_invitation(invitation_id, to, None)
            .await?;

        if accept {
            if let Err(e) = self
                .membership
                .add_member(invitation.team_id, responding_user_id, TeamRole::Member)
                .await
            {
                self.store
                    .set_invitation_outcome(
                        invitation_id,
                        InvitationStatus::Declined,
                        format!("acceptance could not be honored: {}", e),
                    )
                    .await?;
                tracing::warn!(
                    "Invitation {} auto-declined at acceptance time: {}",
                    invitation_id,
                    e
                );
                return Err(e);
            }
        }

        Ok(invitation)
    }

    /// Withdraw a pending invitation. Only the inviter, the team leader or
    /// an admin may cancel.
    pub async fn cancel(
        &self,
        invitation_id: Uuid,
        actor: &Actor,
    ) -> Result<Invitation, RosterError> {
        let invitation = self
            .store
            .get_invitation(invitation_id)
            .await?
            .ok_or(RosterError::InvitationNotFound(invitation_id))?;
        let team = self
            .store
            .get_team(invitation.team_id)
            .await?
            .ok_or(RosterError::TeamNotFound(invitation.team_id))?;

        let may_cancel = actor.is_admin
            || invitation.invited_by == actor.user_id
            || team.leader_id == actor.user_id;
        if !may_cancel {
            return Err(RosterError::Forbidden(
                "only the inviter, the team leader or an admin may cancel an invitation"
                    .to_string(),
            ));
        }

        if let Some(expired) = self.normalize_expiry(&invitation).await {
            return Err(expired);
        }

        self.store
            .transition_invitation(invitation_id, InvitationStatus::Cancelled, None)
            .await
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Invitation>, RosterError> {
        let invitations = self.store.invitations_for_user(user_id).await?;
        self.normalize_list(invitations).await
    }

    pub async fn list_for_team(
        &self,
        team_id: Uuid,
        actor: &Actor,
    ) -> Result<Vec<Invitation>, RosterError> {
        let team = self
            .store
            .get_team(team_id)
            .await?
            .ok_or(RosterError::TeamNotFound(team_id))?;
        ensure_manager(&team, actor)?;

        let invitations = self.store.invitations_for_team(team_id).await?;
        self.normalize_list(invitations).await
    }

    /// Settle a lapsed pending invitation as expired. Returns the error the
    /// caller must surface, or None when the invitation is still live. A
    /// racing transition losing here is fine: the stored status is already
    /// terminal either way.
    async fn normalize_expiry(&self, invitation: &Invitation) -> Option<RosterError> {
        if !invitation.is_expired(Utc::now()) {
            return None;
        }
        let _ = self
            .store
            .transition_invitation(
                invitation.id,
                InvitationStatus::Expired,
                Some("lapsed before a response".to_string()),
            )
            .await;
        Some(RosterError::InvitationExpired {
            expired_at: invitation.expires_at,
        })
    }

    async fn normalize_list(
        &self,
        invitations: Vec<Invitation>,
    ) -> Result<Vec<Invitation>, RosterError> {
        let now = Utc::now();
        let mut normalized = Vec::with_capacity(invitations.len());
        for invitation in invitations {
            if invitation.is_expired(now) {
                match self
                    .store
                    .transition_invitation(
                        invitation.id,
                        InvitationStatus::Expired,
                        Some("lapsed before a response".to_string()),
                    )
                    .await
                {
                    Ok(updated) => normalized.push(updated),
                    // Lost a race against another reader; re-read the winner.
                    Err(_) => {
                        if let Some(current) = self.store.get_invitation(invitation.id).await? {
                            normalized.push(current);
                        }
                    }
                }
            } else {
                normalized.push(invitation);
            }
        }
        Ok(normalized)
    }
}
