use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use crate::errors::RosterError;
use crate::models::membership::{Membership, TeamRole};
use crate::models::team::{CreateTeamRequest, Team, TeamStatus, TeamUpdateRequest, TeamWithMembers};
use crate::roster::eligibility::EligibilityService;
use crate::roster::{ensure_manager, Actor};
use crate::store::{DisbandOutcome, RosterStore};

const INVITE_CODE_LEN: usize = 12;

fn generate_invite_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Owns team entities: creation with the initial roster, configuration
/// edits, and status transitions. Size changes go through the membership
/// ledger, never through this registry.
#[derive(Clone)]
pub struct TeamService {
    store: Arc<dyn RosterStore>,
    eligibility: EligibilityService,
}

impl TeamService {
    pub fn new(store: Arc<dyn RosterStore>, eligibility: EligibilityService) -> Self {
        Self { store, eligibility }
    }

    /// Create a team and materialize its whole roster in one step: the
    /// captain's leader membership plus one member membership per listed
    /// user, all of them or none. The captain defaults to the creating
    /// actor, and a captain also listed as a member collapses to a single
    /// leader membership.
    pub async fn create_team(
        &self,
        request: CreateTeamRequest,
        actor: &Actor,
    ) -> Result<TeamWithMembers, RosterError> {
        request.validate().map_err(RosterError::Validation)?;

        let captain = request.captain_user_id.unwrap_or(actor.user_id);
        let mut roster: Vec<(Uuid, TeamRole)> = vec![(captain, TeamRole::Leader)];
        for entry in &request.members {
            if entry.user_id == captain {
                continue;
            }
            if entry.role == Some(TeamRole::Leader) {
                return Err(RosterError::DuplicateCaptain);
            }
            if roster.iter().any(|(id, _)| *id == entry.user_id) {
                continue;
            }
            roster.push((entry.user_id, TeamRole::Member));
        }

        if roster.len() as i32 > request.max_size {
            return Err(RosterError::Validation(format!(
                "a roster of {} members does not fit the maximum team size of {}",
                roster.len(),
                request.max_size
            )));
        }

        let candidates: HashSet<Uuid> = self
            .eligibility
            .eligible_candidates(request.event_id, None)
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect();
        for (user_id, _) in &roster {
            if !candidates.contains(user_id) {
                let identifier = self
                    .store
                    .get_user(*user_id)
                    .await?
                    .map(|u| u.username)
                    .unwrap_or_else(|| user_id.to_string());
                return Err(RosterError::IneligibleUser { identifier });
            }
        }

        let now = Utc::now();
        let team = Team {
            id: Uuid::new_v4(),
            event_id: request.event_id,
            team_name: request.get_sanitized_name(),
            team_description: request.team_description.clone(),
            min_size: request.min_size,
            max_size: request.max_size,
            is_invite_only: request.is_invite_only,
            invite_code: request.is_invite_only.then(generate_invite_code),
            leader_id: captain,
            status: TeamStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let memberships: Vec<Membership> = roster
            .into_iter()
            .map(|(user_id, role)| Membership::new(team.id, user_id, role))
            .collect();

        let team = self.store.create_team_with_roster(team, memberships).await?;
        tracing::info!(
            "Created team '{}' ({}) with captain {}",
            team.team_name,
            team.id,
            captain
        );

        self.get_team_with_members(team.id).await
    }

    pub async fn get_team(&self, team_id: Uuid) -> Result<Team, RosterError> {
        self.store
            .get_team(team_id)
            .await?
            .ok_or(RosterError::TeamNotFound(team_id))
    }

    pub async fn get_team_with_members(
        &self,
        team_id: Uuid,
    ) -> Result<TeamWithMembers, RosterError> {
        let team = self.get_team(team_id).await?;
        let members = self.store.member_details(team_id).await?;
        let member_count = members.len();
        Ok(TeamWithMembers {
            team,
            members,
            member_count,
        })
    }

    pub async fn list_teams_for_event(&self, event_id: Uuid) -> Result<Vec<Team>, RosterError> {
        if !self.store.event_exists(event_id).await? {
            return Err(RosterError::EventNotFound(event_id));
        }
        self.store.list_teams_for_event(event_id).await
    }

    /// Apply configuration edits. Shrinking the maximum size below the
    /// current roster is rejected; a transition to `disbanded` cascades to
    /// memberships, pending join requests and pending invitations.
    pub async fn update_team(
        &self,
        team_id: Uuid,
        request: TeamUpdateRequest,
        actor: &Actor,
    ) -> Result<Team, RosterError> {
        request.validate().map_err(RosterError::Validation)?;

        let mut team = self.get_team(team_id).await?;
        ensure_manager(&team, actor)?;

        if let Some(name) = &request.team_name {
            team.team_name = name.trim().to_string();
        }
        if let Some(description) = &request.team_description {
            team.team_description = Some(description.clone());
        }
        if let Some(min_size) = request.min_size {
            team.min_size = min_size;
        }
        if let Some(max_size) = request.max_size {
            let current = self.store.count_active_members(team_id).await?;
            if (max_size as i64) < current {
                return Err(RosterError::Capacity {
                    current,
                    requested: max_size,
                });
            }
            team.max_size = max_size;
        }
        if team.min_size > team.max_size {
            return Err(RosterError::Validation(
                "Minimum team size cannot exceed maximum team size".to_string(),
            ));
        }
        if let Some(is_invite_only) = request.is_invite_only {
            team.is_invite_only = is_invite_only;
            if is_invite_only && team.invite_code.is_none() {
                team.invite_code = Some(generate_invite_code());
            }
            if !is_invite_only {
                team.invite_code = None;
            }
        }

        let disbanding = request.status == Some(TeamStatus::Disbanded)
            && team.status != TeamStatus::Disbanded;
        if let Some(status) = request.status {
            if !disbanding {
                team.status = status;
            }
        }

        self.store.update_team(&team).await?;

        if disbanding {
            let outcome = self.disband(team_id).await?;
            tracing::info!(
                "Disbanded team '{}': {} memberships closed, {} requests rejected, {} invitations cancelled",
                team.team_name,
                outcome.members_deactivated,
                outcome.requests_rejected,
                outcome.invitations_cancelled
            );
            return self.get_team(team_id).await;
        }

        Ok(team)
    }

    /// Deleting a team is a status transition, not a hard delete: the team
    /// and its audit trail of requests remain on record.
    pub async fn delete_team(
        &self,
        team_id: Uuid,
        actor: &Actor,
    ) -> Result<DisbandOutcome, RosterError> {
        let team = self.get_team(team_id).await?;
        ensure_manager(&team, actor)?;

        let outcome = self.disband(team_id).await?;
        tracing::info!(
            "Disbanded team '{}': {} memberships closed, {} requests rejected, {} invitations cancelled",
            team.team_name,
            outcome.members_deactivated,
            outcome.requests_rejected,
            outcome.invitations_cancelled
        );
        Ok(outcome)
    }

    /// Replace the invite code of an invite-only team, revoking join rights
    /// granted by the previous code.
    pub async fn rotate_invite_code(
        &self,
        team_id: Uuid,
        actor: &Actor,
    ) -> Result<Team, RosterError> {
        let mut team = self.get_team(team_id).await?;
        ensure_manager(&team, actor)?;

        if !team.is_invite_only {
            return Err(RosterError::Validation(format!(
                "team '{}' is not invite-only",
                team.team_name
            )));
        }

        team.invite_code = Some(generate_invite_code());
        self.store.update_team(&team).await?;
        Ok(team)
    }

    async fn disband(&self, team_id: Uuid) -> Result<DisbandOutcome, RosterError> {
        self.store.disband_team(team_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::team::RosterEntry;
    use crate::roster::test_support::{event, seeded_store, user};

    fn request(event_id: Uuid) -> CreateTeamRequest {
        CreateTeamRequest {
            team_name: "Null Dereference".to_string(),
            team_description: Some("we segfault on purpose".to_string()),
            event_id,
            min_size: 1,
            max_size: 4,
            is_invite_only: false,
            captain_user_id: None,
            members: Vec::new(),
        }
    }

    #[tokio::test]
    async fn duplicated_roster_entries_collapse_to_one_membership() {
        let ev = event("finals");
        let alice = user("alice");
        let bob = user("bob");
        let store = seeded_store(&ev, &[&alice, &bob]).await;
        let service = TeamService::new(store.clone(), EligibilityService::new(store));

        let mut req = request(ev.id);
        req.captain_user_id = Some(alice.id);
        req.members = vec![
            RosterEntry {
                user_id: alice.id,
                role: None,
            },
            RosterEntry {
                user_id: bob.id,
                role: None,
            },
            RosterEntry {
                user_id: alice.id,
                role: None,
            },
        ];

        let actor = Actor {
            user_id: alice.id,
            is_admin: false,
        };
        let created = service.create_team(req, &actor).await.unwrap();
        assert_eq!(created.member_count, 2);
        let leaders: Vec<_> = created
            .members
            .iter()
            .filter(|m| m.role == TeamRole::Leader)
            .collect();
        assert_eq!(leaders.len(), 1);
        assert_eq!(leaders[0].user_id, alice.id);
    }

    #[tokio::test]
    async fn a_second_captain_in_the_member_list_is_rejected() {
        let ev = event("finals");
        let alice = user("alice");
        let bob = user("bob");
        let store = seeded_store(&ev, &[&alice, &bob]).await;
        let service = TeamService::new(store.clone(), EligibilityService::new(store));

        let mut req = request(ev.id);
        req.captain_user_id = Some(alice.id);
        req.members = vec![RosterEntry {
            user_id: bob.id,
            role: Some(TeamRole::Leader),
        }];

        let actor = Actor {
            user_id: alice.id,
            is_admin: false,
        };
        let result = service.create_team(req, &actor).await;
        assert!(matches!(result, Err(RosterError::DuplicateCaptain)));
    }

    #[tokio::test]
    async fn unregistered_users_cannot_be_rostered() {
        let ev = event("finals");
        let alice = user("alice");
        let outsider = user("outsider");
        let store = seeded_store(&ev, &[&alice]).await;
        store.seed_user(outsider.clone()).await;
        let service = TeamService::new(store.clone(), EligibilityService::new(store));

        let mut req = request(ev.id);
        req.members = vec![RosterEntry {
            user_id: outsider.id,
            role: None,
        }];

        let actor = Actor {
            user_id: alice.id,
            is_admin: false,
        };
        let result = service.create_team(req, &actor).await;
        match result {
            Err(RosterError::IneligibleUser { identifier }) => {
                assert_eq!(identifier, "outsider")
            }
            other => panic!("expected IneligibleUser, got {:?}", other.map(|t| t.team.id)),
        }
    }

    #[tokio::test]
    async fn max_size_cannot_shrink_below_the_roster() {
        let ev = event("finals");
        let alice = user("alice");
        let bob = user("bob");
        let store = seeded_store(&ev, &[&alice, &bob]).await;
        let service = TeamService::new(store.clone(), EligibilityService::new(store));

        let mut req = request(ev.id);
        req.members = vec![RosterEntry {
            user_id: bob.id,
            role: None,
        }];
        let actor = Actor {
            user_id: alice.id,
            is_admin: false,
        };
        let created = service.create_team(req, &actor).await.unwrap();

        let patch = TeamUpdateRequest {
            team_name: None,
            team_description: None,
            min_size: None,
            max_size: Some(1),
            is_invite_only: None,
            status: None,
        };
        let result = service.update_team(created.team.id, patch, &actor).await;
        assert!(matches!(
            result,
            Err(RosterError::Capacity {
                current: 2,
                requested: 1
            })
        ));
    }
}
