use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::errors::RosterError;
use crate::models::user::User;
use crate::store::RosterStore;

/// Resolves which users are admissible candidates for team membership in an
/// event: registered (and not withdrawn), with no active membership in any
/// team of that event.
#[derive(Clone)]
pub struct EligibilityService {
    store: Arc<dyn RosterStore>,
}

impl EligibilityService {
    pub fn new(store: Arc<dyn RosterStore>) -> Self {
        Self { store }
    }

    /// An empty result is a normal terminal state, not a failure.
    ///
    /// `exclude_team_id` exempts that team's own active members from the
    /// membership filter — used when re-validating a roster that is being
    /// assembled or edited, where those members are already accounted for
    /// by the caller.
    pub async fn eligible_candidates(
        &self,
        event_id: Uuid,
        exclude_team_id: Option<Uuid>,
    ) -> Result<Vec<User>, RosterError> {
        if !self.store.event_exists(event_id).await? {
            return Err(RosterError::EventNotFound(event_id));
        }

        let registered = self.store.active_registrations(event_id).await?;
        let taken: HashSet<Uuid> = self
            .store
            .active_memberships_in_event(event_id)
            .await?
            .into_iter()
            .filter(|m| Some(m.team_id) != exclude_team_id)
            .map(|m| m.user_id)
            .collect();

        let mut candidates: Vec<User> = registered
            .into_iter()
            .filter(|u| !taken.contains(&u.id))
            .collect();
        candidates.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(candidates)
    }

    pub async fn is_candidate(&self, event_id: Uuid, user_id: Uuid) -> Result<bool, RosterError> {
        let candidates = self.eligible_candidates(event_id, None).await?;
        Ok(candidates.iter().any(|u| u.id == user_id))
    }

    /// Resolve an event-registered email to a candidate, as invitation
    /// sending does.
    pub async fn resolve_candidate_by_email(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<User, RosterError> {
        let candidates = self.eligible_candidates(event_id, None).await?;
        candidates
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .ok_or_else(|| RosterError::IneligibleUser {
                identifier: email.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{EventRegistration, RegistrationStatus};
    use crate::models::membership::TeamRole;
    use crate::roster::test_support::{event, seeded_store, user};
    use crate::roster::teams::TeamService;
    use crate::roster::Actor;
    use crate::models::team::CreateTeamRequest;
    use chrono::Utc;

    fn create_request(event_id: Uuid, name: &str) -> CreateTeamRequest {
        CreateTeamRequest {
            team_name: name.to_string(),
            team_description: None,
            event_id,
            min_size: 1,
            max_size: 4,
            is_invite_only: false,
            captain_user_id: None,
            members: Vec::new(),
        }
    }

    #[tokio::test]
    async fn unknown_event_is_an_error() {
        let ev = event("qualifiers");
        let store = seeded_store(&ev, &[]).await;
        let eligibility = EligibilityService::new(store);

        let result = eligibility.eligible_candidates(Uuid::new_v4(), None).await;
        assert!(matches!(result, Err(RosterError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn no_candidates_is_an_empty_set_not_an_error() {
        let ev = event("qualifiers");
        let store = seeded_store(&ev, &[]).await;
        let eligibility = EligibilityService::new(store);

        let candidates = eligibility
            .eligible_candidates(ev.id, None)
            .await
            .expect("empty candidate set should not fail");
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn withdrawn_registrations_are_ineligible() {
        let ev = event("qualifiers");
        let alice = user("alice");
        let bob = user("bob");
        let store = seeded_store(&ev, &[&alice]).await;
        store.seed_user(bob.clone()).await;
        store
            .seed_registration(EventRegistration {
                id: Uuid::new_v4(),
                event_id: ev.id,
                user_id: bob.id,
                status: RegistrationStatus::Withdrawn,
                registered_at: Utc::now(),
            })
            .await;

        let eligibility = EligibilityService::new(store);
        let candidates = eligibility.eligible_candidates(ev.id, None).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, alice.id);
    }

    #[tokio::test]
    async fn team_members_drop_out_unless_their_team_is_excluded() {
        let ev = event("qualifiers");
        let alice = user("alice");
        let bob = user("bob");
        let store = seeded_store(&ev, &[&alice, &bob]).await;
        let eligibility = EligibilityService::new(store.clone());
        let teams = TeamService::new(store, eligibility.clone());

        let actor = Actor {
            user_id: alice.id,
            is_admin: false,
        };
        let created = teams
            .create_team(create_request(ev.id, "Alice Crew"), &actor)
            .await
            .unwrap();
        assert_eq!(created.members[0].role, TeamRole::Leader);

        let candidates = eligibility.eligible_candidates(ev.id, None).await.unwrap();
        assert_eq!(candidates.iter().map(|u| u.id).collect::<Vec<_>>(), vec![bob.id]);

        let with_exclusion = eligibility
            .eligible_candidates(ev.id, Some(created.team.id))
            .await
            .unwrap();
        assert!(with_exclusion.iter().any(|u| u.id == alice.id));
    }
}
