//! In-memory storage adapter.
//!
//! Backs the integration tests and local development. A single `RwLock`
//! over the whole state serializes every mutation, so the per-team
//! atomicity contract of the port holds trivially. Accounts, events and
//! registrations are owned by out-of-scope subsystems; the seed methods
//! below are the wiring through which their data enters this adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::RosterError;
use crate::models::event::{Event, EventRegistration, RegistrationStatus};
use crate::models::invitation::{Invitation, InvitationStatus};
use crate::models::join_request::{JoinRequest, JoinRequestStatus};
use crate::models::membership::{
    LeaderChange, MemberAdded, MemberInfo, MemberStatus, Membership, TeamRole,
};
use crate::models::team::{Team, TeamStatus};
use crate::models::user::{User, UserStatus};
use crate::store::{DisbandOutcome, RosterStore};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    events: HashMap<Uuid, Event>,
    registrations: Vec<EventRegistration>,
    teams: HashMap<Uuid, Team>,
    memberships: HashMap<Uuid, Membership>,
    join_requests: HashMap<Uuid, JoinRequest>,
    invitations: HashMap<Uuid, Invitation>,
}

#[derive(Default)]
pub struct InMemoryRosterStore {
    state: RwLock<State>,
}

impl InMemoryRosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    pub async fn seed_event(&self, event: Event) {
        self.state.write().await.events.insert(event.id, event);
    }

    pub async fn seed_registration(&self, registration: EventRegistration) {
        self.state.write().await.registrations.push(registration);
    }
}

impl State {
    fn username(&self, user_id: Uuid) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.username.clone())
            .unwrap_or_else(|| user_id.to_string())
    }

    fn active_count(&self, team_id: Uuid) -> i64 {
        self.memberships
            .values()
            .filter(|m| m.team_id == team_id && m.status == MemberStatus::Active)
            .count() as i64
    }

    fn active_membership(&self, team_id: Uuid, user_id: Uuid) -> Option<&Membership> {
        self.memberships
            .values()
            .find(|m| m.team_id == team_id && m.user_id == user_id && m.status == MemberStatus::Active)
    }

    fn active_membership_in_event(&self, event_id: Uuid, user_id: Uuid) -> Option<&Membership> {
        self.memberships.values().find(|m| {
            m.user_id == user_id
                && m.status == MemberStatus::Active
                && self
                    .teams
                    .get(&m.team_id)
                    .map(|t| t.event_id == event_id)
                    .unwrap_or(false)
        })
    }

    fn active_leader_id(&self, team_id: Uuid) -> Option<Uuid> {
        self.memberships
            .values()
            .find(|m| {
                m.team_id == team_id
                    && m.role == TeamRole::Leader
                    && m.status == MemberStatus::Active
            })
            .map(|m| m.id)
    }
}

#[async_trait]
impl RosterStore for InMemoryRosterStore {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, RosterError> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn event_exists(&self, event_id: Uuid) -> Result<bool, RosterError> {
        Ok(self.state.read().await.events.contains_key(&event_id))
    }

    async fn active_registrations(&self, event_id: Uuid) -> Result<Vec<User>, RosterError> {
        let state = self.state.read().await;
        let users = state
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id && r.status == RegistrationStatus::Active)
            .filter_map(|r| state.users.get(&r.user_id))
            .filter(|u| u.status == UserStatus::Active)
            .cloned()
            .collect();
        Ok(users)
    }

    async fn active_memberships_in_event(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<Membership>, RosterError> {
        let state = self.state.read().await;
        let memberships = state
            .memberships
            .values()
            .filter(|m| m.status == MemberStatus::Active)
            .filter(|m| {
                state
                    .teams
                    .get(&m.team_id)
                    .map(|t| t.event_id == event_id)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        Ok(memberships)
    }

    async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>, RosterError> {
        Ok(self.state.read().await.teams.get(&team_id).cloned())
    }

    async fn get_team_by_invite_code(&self, code: &str) -> Result<Option<Team>, RosterError> {
        let state = self.state.read().await;
        Ok(state
            .teams
            .values()
            .find(|t| t.invite_code.as_deref() == Some(code))
            .cloned())
    }

    async fn list_teams_for_event(&self, event_id: Uuid) -> Result<Vec<Team>, RosterError> {
        let state = self.state.read().await;
        let mut teams: Vec<Team> = state
            .teams
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect();
        teams.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(teams)
    }

    async fn create_team_with_roster(
        &self,
        team: Team,
        memberships: Vec<Membership>,
    ) -> Result<Team, RosterError> {
        let mut state = self.state.write().await;

        // Re-check the cross-team uniqueness rule under the write lock so a
        // racing creation cannot slip the same user into two rosters.
        for membership in &memberships {
            if state
                .active_membership_in_event(team.event_id, membership.user_id)
                .is_some()
            {
                return Err(RosterError::AlreadyOnTeam {
                    username: state.username(membership.user_id),
                });
            }
        }

        for membership in memberships {
            state.memberships.insert(membership.id, membership);
        }
        state.teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn update_team(&self, team: &Team) -> Result<(), RosterError> {
        let mut state = self.state.write().await;
        if !state.teams.contains_key(&team.id) {
            return Err(RosterError::TeamNotFound(team.id));
        }
        state.teams.insert(team.id, team.clone());
        Ok(())
    }

    async fn disband_team(&self, team_id: Uuid) -> Result<DisbandOutcome, RosterError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let team = state
            .teams
            .get_mut(&team_id)
            .ok_or(RosterError::TeamNotFound(team_id))?;
        team.status = TeamStatus::Disbanded;
        team.updated_at = now;

        let mut outcome = DisbandOutcome::default();

        for membership in state.memberships.values_mut() {
            if membership.team_id == team_id && membership.status == MemberStatus::Active {
                membership.status = MemberStatus::Inactive;
                membership.left_at = Some(now);
                outcome.members_deactivated += 1;
            }
        }

        for request in state.join_requests.values_mut() {
            if request.team_id == team_id && request.status == JoinRequestStatus::Pending {
                request.status = JoinRequestStatus::Rejected;
                request.responded_at = Some(now);
                request.resolution_note = Some("team was disbanded".to_string());
                outcome.requests_rejected += 1;
            }
        }

        for invitation in state.invitations.values_mut() {
            if invitation.team_id == team_id && invitation.status == InvitationStatus::Pending {
                invitation.status = InvitationStatus::Cancelled;
                invitation.responded_at = Some(now);
                invitation.resolution_note = Some("team was disbanded".to_string());
                outcome.invitations_cancelled += 1;
            }
        }

        Ok(outcome)
    }

    async fn active_members(&self, team_id: Uuid) -> Result<Vec<Membership>, RosterError> {
        let state = self.state.read().await;
        let mut members: Vec<Membership> = state
            .memberships
            .values()
            .filter(|m| m.team_id == team_id && m.status == MemberStatus::Active)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(members)
    }

    async fn member_details(&self, team_id: Uuid) -> Result<Vec<MemberInfo>, RosterError> {
        let state = self.state.read().await;
        let mut details: Vec<MemberInfo> = state
            .memberships
            .values()
            .filter(|m| m.team_id == team_id && m.status == MemberStatus::Active)
            .filter_map(|m| {
                state.users.get(&m.user_id).map(|u| MemberInfo {
                    id: m.id,
                    team_id: m.team_id,
                    user_id: m.user_id,
                    username: u.username.clone(),
                    email: u.email.clone(),
                    role: m.role.clone(),
                    status: m.status.clone(),
                    joined_at: m.joined_at,
                })
            })
            .collect();
        details.sort_by(|a, b| {
            let rank = |r: &TeamRole| match r {
                TeamRole::Leader => 0,
                TeamRole::Member => 1,
            };
            rank(&a.role)
                .cmp(&rank(&b.role))
                .then(a.joined_at.cmp(&b.joined_at))
        });
        Ok(details)
    }

    async fn active_membership_for_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, RosterError> {
        let state = self.state.read().await;
        Ok(state.active_membership_in_event(event_id, user_id).cloned())
    }

    async fn count_active_members(&self, team_id: Uuid) -> Result<i64, RosterError> {
        Ok(self.state.read().await.active_count(team_id))
    }

    async fn add_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<MemberAdded, RosterError> {
        let mut state = self.state.write().await;

        let team = state
            .teams
            .get(&team_id)
            .ok_or(RosterError::TeamNotFound(team_id))?;
        if team.status != TeamStatus::Active {
            return Err(RosterError::Validation(format!(
                "team '{}' is not active",
                team.team_name
            )));
        }
        let team_name = team.team_name.clone();
        let event_id = team.event_id;
        let max_size = team.max_size;

        if !state.users.contains_key(&user_id) {
            return Err(RosterError::UserNotFound(user_id));
        }

        if state.active_membership_in_event(event_id, user_id).is_some() {
            return Err(RosterError::AlreadyOnTeam {
                username: state.username(user_id),
            });
        }

        if state.active_count(team_id) >= max_size as i64 {
            return Err(RosterError::TeamFull {
                team_name,
                max_size,
            });
        }

        let mut demoted_leader = None;
        if role == TeamRole::Leader {
            if let Some(leader_membership_id) = state.active_leader_id(team_id) {
                let leader = state
                    .memberships
                    .get_mut(&leader_membership_id)
                    .expect("leader membership disappeared under write lock");
                leader.role = TeamRole::Member;
                demoted_leader = Some(leader.user_id);
            }
            let team = state
                .teams
                .get_mut(&team_id)
                .expect("team disappeared under write lock");
            team.leader_id = user_id;
            team.updated_at = Utc::now();
        }

        let membership = Membership::new(team_id, user_id, role);
        state.memberships.insert(membership.id, membership.clone());

        Ok(MemberAdded {
            membership,
            demoted_leader,
        })
    }

    async fn remove_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Membership, RosterError> {
        let mut state = self.state.write().await;

        let membership_id = state
            .active_membership(team_id, user_id)
            .map(|m| m.id)
            .ok_or(RosterError::NotATeamMember)?;

        let membership = state
            .memberships
            .get_mut(&membership_id)
            .expect("membership disappeared under write lock");
        if membership.role == TeamRole::Leader {
            return Err(RosterError::LeaderRemoval);
        }

        membership.status = MemberStatus::Inactive;
        membership.left_at = Some(Utc::now());
        Ok(membership.clone())
    }

    async fn swap_leader(
        &self,
        team_id: Uuid,
        new_leader_user_id: Uuid,
    ) -> Result<LeaderChange, RosterError> {
        let mut state = self.state.write().await;

        if !state.teams.contains_key(&team_id) {
            return Err(RosterError::TeamNotFound(team_id));
        }

        let new_leader_membership_id = state
            .active_membership(team_id, new_leader_user_id)
            .map(|m| m.id)
            .ok_or(RosterError::NotATeamMember)?;

        let current_leader_id = state.active_leader_id(team_id);
        let mut demoted = new_leader_user_id;
        if let Some(leader_membership_id) = current_leader_id {
            let leader = state
                .memberships
                .get_mut(&leader_membership_id)
                .expect("leader membership disappeared under write lock");
            demoted = leader.user_id;
            leader.role = TeamRole::Member;
        }

        let promoted = state
            .memberships
            .get_mut(&new_leader_membership_id)
            .expect("membership disappeared under write lock");
        promoted.role = TeamRole::Leader;

        let team = state
            .teams
            .get_mut(&team_id)
            .expect("team disappeared under write lock");
        team.leader_id = new_leader_user_id;
        team.updated_at = Utc::now();

        Ok(LeaderChange {
            demoted,
            promoted: new_leader_user_id,
        })
    }

    async fn insert_join_request(
        &self,
        request: JoinRequest,
    ) -> Result<JoinRequest, RosterError> {
        let mut state = self.state.write().await;

        let duplicate = state.join_requests.values().any(|r| {
            r.team_id == request.team_id
                && r.requested_by == request.requested_by
                && r.status == JoinRequestStatus::Pending
        });
        if duplicate {
            return Err(RosterError::DuplicatePendingRequest);
        }

        state.join_requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get_join_request(&self, id: Uuid) -> Result<Option<JoinRequest>, RosterError> {
        Ok(self.state.read().await.join_requests.get(&id).cloned())
    }

    async fn pending_join_requests(
        &self,
        team_id: Uuid,
    ) -> Result<Vec<JoinRequest>, RosterError> {
        let state = self.state.read().await;
        let mut requests: Vec<JoinRequest> = state
            .join_requests
            .values()
            .filter(|r| r.team_id == team_id && r.status == JoinRequestStatus::Pending)
            .cloned()
            .collect();
        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(requests)
    }

    async fn transition_join_request(
        &self,
        id: Uuid,
        to: JoinRequestStatus,
        responded_by: Option<Uuid>,
        note: Option<String>,
    ) -> Result<JoinRequest, RosterError> {
        let mut state = self.state.write().await;

        let request = state
            .join_requests
            .get_mut(&id)
            .ok_or(RosterError::RequestNotFound(id))?;
        if request.status != JoinRequestStatus::Pending {
            return Err(RosterError::InvalidStateTransition {
                entity: "join request",
                current: request.status.to_string(),
            });
        }

        request.status = to;
        request.responded_at = Some(Utc::now());
        request.responded_by = responded_by;
        request.resolution_note = note;
        Ok(request.clone())
    }

    async fn set_join_request_outcome(
        &self,
        id: Uuid,
        to: JoinRequestStatus,
        note: String,
    ) -> Result<(), RosterError> {
        let mut state = self.state.write().await;

        let request = state
            .join_requests
            .get_mut(&id)
            .ok_or(RosterError::RequestNotFound(id))?;
        request.status = to;
        request.responded_at = Some(Utc::now());
        request.resolution_note = Some(note);
        Ok(())
    }

    async fn insert_invitation(
        &self,
        invitation: Invitation,
    ) -> Result<Invitation, RosterError> {
        let mut state = self.state.write().await;

        let duplicate = state.invitations.values().any(|i| {
            i.team_id == invitation.team_id
                && i.invited_user_id == invitation.invited_user_id
                && i.status == InvitationStatus::Pending
        });
        if duplicate {
            return Err(RosterError::DuplicatePendingInvitation);
        }

        state.invitations.insert(invitation.id, invitation.clone());
        Ok(invitation)
    }

    async fn get_invitation(&self, id: Uuid) -> Result<Option<Invitation>, RosterError> {
        Ok(self.state.read().await.invitations.get(&id).cloned())
    }

    async fn invitations_for_user(&self, user_id: Uuid) -> Result<Vec<Invitation>, RosterError> {
        let state = self.state.read().await;
        let mut invitations: Vec<Invitation> = state
            .invitations
            .values()
            .filter(|i| i.invited_user_id == user_id)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| {
            let rank = |s: &InvitationStatus| match s {
                InvitationStatus::Pending => 0,
                _ => 1,
            };
            rank(&a.status)
                .cmp(&rank(&b.status))
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(invitations)
    }

    async fn invitations_for_team(&self, team_id: Uuid) -> Result<Vec<Invitation>, RosterError> {
        let state = self.state.read().await;
        let mut invitations: Vec<Invitation> = state
            .invitations
            .values()
            .filter(|i| i.team_id == team_id)
            .cloned()
            .collect();
        invitations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invitations)
    }

    async fn transition_invitation(
        &self,
        id: Uuid,
        to: InvitationStatus,
        note: Option<String>,
    ) -> Result<Invitation, RosterError> {
        let mut state = self.state.write().await;

        let invitation = state
            .invitations
            .get_mut(&id)
            .ok_or(RosterError::InvitationNotFound(id))?;
        if invitation.status != InvitationStatus::Pending {
            return Err(RosterError::InvalidStateTransition {
                entity: "invitation",
                current: invitation.status.to_string(),
            });
        }

        invitation.status = to;
        invitation.responded_at = Some(Utc::now());
        invitation.resolution_note = note;
        Ok(invitation.clone())
    }

    async fn set_invitation_outcome(
        &self,
        id: Uuid,
        to: InvitationStatus,
        note: String,
    ) -> Result<(), RosterError> {
        let mut state = self.state.write().await;

        let invitation = state
            .invitations
            .get_mut(&id)
            .ok_or(RosterError::InvitationNotFound(id))?;
        invitation.status = to;
        invitation.responded_at = Some(Utc::now());
        invitation.resolution_note = Some(note);
        Ok(())
    }
}
