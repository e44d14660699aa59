//! Postgres storage adapter.
//!
//! Every guarded mutation runs in a transaction that first locks the team
//! row with `SELECT ... FOR UPDATE`, which serializes roster mutation per
//! team: of two racing adds on a team at capacity minus one, exactly one
//! observes the free slot.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::errors::RosterError;
use crate::models::invitation::{Invitation, InvitationStatus};
use crate::models::join_request::{JoinRequest, JoinRequestStatus};
use crate::models::membership::{
    LeaderChange, MemberAdded, MemberInfo, Membership, TeamRole,
};
use crate::models::team::{Team, TeamStatus};
use crate::models::user::User;
use crate::store::{DisbandOutcome, RosterStore};

pub struct PgRosterStore {
    pool: PgPool,
}

impl PgRosterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the team row for the duration of the transaction.
    async fn lock_team(
        tx: &mut Transaction<'_, Postgres>,
        team_id: Uuid,
    ) -> Result<Team, RosterError> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, event_id, team_name, team_description, min_size, max_size,
                   is_invite_only, invite_code, leader_id, status, created_at, updated_at
            FROM teams
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(team_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RosterError::TeamNotFound(team_id))?;

        Ok(team)
    }

    async fn username(&self, user_id: Uuid) -> Result<String, RosterError> {
        let username = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(username.unwrap_or_else(|| user_id.to_string()))
    }

    async fn count_active_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        team_id: Uuid,
    ) -> Result<i64, RosterError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM team_members WHERE team_id = $1 AND status = 'active'",
        )
        .bind(team_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(count)
    }

    async fn insert_membership(
        tx: &mut Transaction<'_, Postgres>,
        membership: &Membership,
    ) -> Result<(), RosterError> {
        sqlx::query(
            r#"
            INSERT INTO team_members (id, team_id, user_id, role, status, joined_at, left_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(membership.id)
        .bind(membership.team_id)
        .bind(membership.user_id)
        .bind(membership.role.to_string())
        .bind(membership.status.to_string())
        .bind(membership.joined_at)
        .bind(membership.left_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

const SELECT_MEMBERSHIP: &str = r#"
    SELECT id, team_id, user_id, role, status, joined_at, left_at
    FROM team_members
"#;

const SELECT_JOIN_REQUEST: &str = r#"
    SELECT id, team_id, requested_by, message, status, created_at,
           responded_at, responded_by, resolution_note
    FROM team_join_requests
"#;

const SELECT_INVITATION: &str = r#"
    SELECT id, team_id, invited_user_id, invited_by, message, expires_at,
           status, created_at, responded_at, resolution_note
    FROM team_invitations
"#;

#[async_trait]
impl RosterStore for PgRosterStore {
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, RosterError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, role, status, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn event_exists(&self, event_id: Uuid) -> Result<bool, RosterError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM events WHERE id = $1)",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn active_registrations(&self, event_id: Uuid) -> Result<Vec<User>, RosterError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.role, u.status, u.created_at
            FROM event_registrations er
            INNER JOIN users u ON er.user_id = u.id
            WHERE er.event_id = $1 AND er.status = 'active' AND u.status = 'active'
            ORDER BY u.username
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn active_memberships_in_event(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<Membership>, RosterError> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT tm.id, tm.team_id, tm.user_id, tm.role, tm.status, tm.joined_at, tm.left_at
            FROM team_members tm
            INNER JOIN teams t ON tm.team_id = t.id
            WHERE t.event_id = $1 AND tm.status = 'active'
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(memberships)
    }

    async fn get_team(&self, team_id: Uuid) -> Result<Option<Team>, RosterError> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, event_id, team_name, team_description, min_size, max_size,
                   is_invite_only, invite_code, leader_id, status, created_at, updated_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(team)
    }

    async fn get_team_by_invite_code(&self, code: &str) -> Result<Option<Team>, RosterError> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, event_id, team_name, team_description, min_size, max_size,
                   is_invite_only, invite_code, leader_id, status, created_at, updated_at
            FROM teams
            WHERE invite_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(team)
    }

    async fn list_teams_for_event(&self, event_id: Uuid) -> Result<Vec<Team>, RosterError> {
        let teams = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, event_id, team_name, team_description, min_size, max_size,
                   is_invite_only, invite_code, leader_id, status, created_at, updated_at
            FROM teams
            WHERE event_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(teams)
    }

    async fn create_team_with_roster(
        &self,
        team: Team,
        memberships: Vec<Membership>,
    ) -> Result<Team, RosterError> {
        let mut tx = self.pool.begin().await?;

        // Re-check cross-team uniqueness inside the transaction so a racing
        // creation cannot slip the same user into two rosters.
        for membership in &memberships {
            let taken = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1
                    FROM team_members tm
                    INNER JOIN teams t ON tm.team_id = t.id
                    WHERE t.event_id = $1 AND tm.user_id = $2 AND tm.status = 'active'
                )
                "#,
            )
            .bind(team.event_id)
            .bind(membership.user_id)
            .fetch_one(&mut *tx)
            .await?;

            if taken {
                tx.rollback().await?;
                return Err(RosterError::AlreadyOnTeam {
                    username: self.username(membership.user_id).await?,
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO teams (id, event_id, team_name, team_description, min_size, max_size,
                               is_invite_only, invite_code, leader_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(team.id)
        .bind(team.event_id)
        .bind(&team.team_name)
        .bind(&team.team_description)
        .bind(team.min_size)
        .bind(team.max_size)
        .bind(team.is_invite_only)
        .bind(&team.invite_code)
        .bind(team.leader_id)
        .bind(team.status.to_string())
        .bind(team.created_at)
        .bind(team.updated_at)
        .execute(&mut *tx)
        .await?;

        for membership in &memberships {
            Self::insert_membership(&mut tx, membership).await?;
        }

        tx.commit().await?;
        Ok(team)
    }

    async fn update_team(&self, team: &Team) -> Result<(), RosterError> {
        let result = sqlx::query(
            r#"
            UPDATE teams
            SET team_name = $1, team_description = $2, min_size = $3, max_size = $4,
                is_invite_only = $5, invite_code = $6, leader_id = $7, status = $8,
                updated_at = NOW()
            WHERE id = $9
            "#,
        )
        .bind(&team.team_name)
        .bind(&team.team_description)
        .bind(team.min_size)
        .bind(team.max_size)
        .bind(team.is_invite_only)
        .bind(&team.invite_code)
        .bind(team.leader_id)
        .bind(team.status.to_string())
        .bind(team.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RosterError::TeamNotFound(team.id));
        }
        Ok(())
    }

    async fn disband_team(&self, team_id: Uuid) -> Result<DisbandOutcome, RosterError> {
        let mut tx = self.pool.begin().await?;
        Self::lock_team(&mut tx, team_id).await?;
        let now = Utc::now();

        sqlx::query("UPDATE teams SET status = 'disbanded', updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(team_id)
            .execute(&mut *tx)
            .await?;

        let members = sqlx::query(
            r#"
            UPDATE team_members
            SET status = 'inactive', left_at = $1
            WHERE team_id = $2 AND status = 'active'
            "#,
        )
        .bind(now)
        .bind(team_id)
        .execute(&mut *tx)
        .await?;

        let requests = sqlx::query(
            r#"
            UPDATE team_join_requests
            SET status = 'rejected', responded_at = $1, resolution_note = 'team was disbanded'
            WHERE team_id = $2 AND status = 'pending'
            "#,
        )
        .bind(now)
        .bind(team_id)
        .execute(&mut *tx)
        .await?;

        let invitations = sqlx::query(
            r#"
            UPDATE team_invitations
            SET status = 'cancelled', responded_at = $1, resolution_note = 'team was disbanded'
            WHERE team_id = $2 AND status = 'pending'
            "#,
        )
        .bind(now)
        .bind(team_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DisbandOutcome {
            members_deactivated: members.rows_affected(),
            requests_rejected: requests.rows_affected(),
            invitations_cancelled: invitations.rows_affected(),
        })
    }

    async fn active_members(&self, team_id: Uuid) -> Result<Vec<Membership>, RosterError> {
        let members = sqlx::query_as::<_, Membership>(&format!(
            "{} WHERE team_id = $1 AND status = 'active' ORDER BY joined_at",
            SELECT_MEMBERSHIP
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn member_details(&self, team_id: Uuid) -> Result<Vec<MemberInfo>, RosterError> {
        let details = sqlx::query_as::<_, MemberInfo>(
            r#"
            SELECT tm.id, tm.team_id, tm.user_id, u.username, u.email,
                   tm.role, tm.status, tm.joined_at
            FROM team_members tm
            INNER JOIN users u ON tm.user_id = u.id
            WHERE tm.team_id = $1 AND tm.status = 'active'
            ORDER BY
                CASE tm.role WHEN 'leader' THEN 1 ELSE 2 END,
                tm.joined_at
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(details)
    }

    async fn active_membership_for_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, RosterError> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT tm.id, tm.team_id, tm.user_id, tm.role, tm.status, tm.joined_at, tm.left_at
            FROM team_members tm
            INNER JOIN teams t ON tm.team_id = t.id
            WHERE t.event_id = $1 AND tm.user_id = $2 AND tm.status = 'active'
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    async fn count_active_members(&self, team_id: Uuid) -> Result<i64, RosterError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM team_members WHERE team_id = $1 AND status = 'active'",
        )
        .bind(team_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn add_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<MemberAdded, RosterError> {
        let mut tx = self.pool.begin().await?;

        let team = Self::lock_team(&mut tx, team_id).await?;
        if team.status != TeamStatus::Active {
            tx.rollback().await?;
            return Err(RosterError::Validation(format!(
                "team '{}' is not active",
                team.team_name
            )));
        }

        let user_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if !user_exists {
            tx.rollback().await?;
            return Err(RosterError::UserNotFound(user_id));
        }

        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM team_members tm
                INNER JOIN teams t ON tm.team_id = t.id
                WHERE t.event_id = $1 AND tm.user_id = $2 AND tm.status = 'active'
            )
            "#,
        )
        .bind(team.event_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            tx.rollback().await?;
            return Err(RosterError::AlreadyOnTeam {
                username: self.username(user_id).await?,
            });
        }

        if Self::count_active_in_tx(&mut tx, team_id).await? >= team.max_size as i64 {
            tx.rollback().await?;
            return Err(RosterError::TeamFull {
                team_name: team.team_name,
                max_size: team.max_size,
            });
        }

        let mut demoted_leader = None;
        if role == TeamRole::Leader {
            let demoted = sqlx::query(
                r#"
                UPDATE team_members
                SET role = 'member'
                WHERE team_id = $1 AND role = 'leader' AND status = 'active'
                RETURNING user_id
                "#,
            )
            .bind(team_id)
            .fetch_optional(&mut *tx)
            .await?;
            demoted_leader = demoted.map(|row| row.get("user_id"));

            sqlx::query("UPDATE teams SET leader_id = $1, updated_at = NOW() WHERE id = $2")
                .bind(user_id)
                .bind(team_id)
                .execute(&mut *tx)
                .await?;
        }

        let membership = Membership::new(team_id, user_id, role);
        Self::insert_membership(&mut tx, &membership).await?;

        tx.commit().await?;
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
        let mut tx = self.pool.begin().await?;
        Self::lock_team(&mut tx, team_id).await?;

        let membership = sqlx::query_as::<_, Membership>(&format!(
            "{} WHERE team_id = $1 AND user_id = $2 AND status = 'active'",
            SELECT_MEMBERSHIP
        ))
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RosterError::NotATeamMember)?;

        if membership.role == TeamRole::Leader {
            tx.rollback().await?;
            return Err(RosterError::LeaderRemoval);
        }

        let removed = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE team_members
            SET status = 'inactive', left_at = NOW()
            WHERE id = $1
            RETURNING id, team_id, user_id, role, status, joined_at, left_at
            "#,
        )
        .bind(membership.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(removed)
    }

    async fn swap_leader(
        &self,
        team_id: Uuid,
        new_leader_user_id: Uuid,
    ) -> Result<LeaderChange, RosterError> {
        let mut tx = self.pool.begin().await?;
        Self::lock_team(&mut tx, team_id).await?;

        let is_member = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM team_members
                WHERE team_id = $1 AND user_id = $2 AND status = 'active'
            )
            "#,
        )
        .bind(team_id)
        .bind(new_leader_user_id)
        .fetch_one(&mut *tx)
        .await?;
        if !is_member {
            tx.rollback().await?;
            return Err(RosterError::NotATeamMember);
        }

        let demoted = sqlx::query(
            r#"
            UPDATE team_members
            SET role = 'member'
            WHERE team_id = $1 AND role = 'leader' AND status = 'active'
            RETURNING user_id
            "#,
        )
        .bind(team_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| row.get::<Uuid, _>("user_id"))
        .unwrap_or(new_leader_user_id);

        sqlx::query(
            r#"
            UPDATE team_members
            SET role = 'leader'
            WHERE team_id = $1 AND user_id = $2 AND status = 'active'
            "#,
        )
        .bind(team_id)
        .bind(new_leader_user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE teams SET leader_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(new_leader_user_id)
            .bind(team_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(LeaderChange {
            demoted,
            promoted: new_leader_user_id,
        })
    }

    async fn insert_join_request(
        &self,
        request: JoinRequest,
    ) -> Result<JoinRequest, RosterError> {
        let result = sqlx::query(
            r#"
            INSERT INTO team_join_requests (id, team_id, requested_by, message, status, created_at)
            SELECT $1, $2, $3, $4, $5, $6
            WHERE NOT EXISTS (
                SELECT 1 FROM team_join_requests
                WHERE team_id = $2 AND requested_by = $3 AND status = 'pending'
            )
            "#,
        )
        .bind(request.id)
        .bind(request.team_id)
        .bind(request.requested_by)
        .bind(&request.message)
        .bind(request.status.to_string())
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RosterError::DuplicatePendingRequest);
        }
        Ok(request)
    }

    async fn get_join_request(&self, id: Uuid) -> Result<Option<JoinRequest>, RosterError> {
        let request =
            sqlx::query_as::<_, JoinRequest>(&format!("{} WHERE id = $1", SELECT_JOIN_REQUEST))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(request)
    }

    async fn pending_join_requests(
        &self,
        team_id: Uuid,
    ) -> Result<Vec<JoinRequest>, RosterError> {
        let requests = sqlx::query_as::<_, JoinRequest>(&format!(
            "{} WHERE team_id = $1 AND status = 'pending' ORDER BY created_at",
            SELECT_JOIN_REQUEST
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn transition_join_request(
        &self,
        id: Uuid,
        to: JoinRequestStatus,
        responded_by: Option<Uuid>,
        note: Option<String>,
    ) -> Result<JoinRequest, RosterError> {
        let updated = sqlx::query_as::<_, JoinRequest>(
            r#"
            UPDATE team_join_requests
            SET status = $1, responded_at = NOW(), responded_by = $2, resolution_note = $3
            WHERE id = $4 AND status = 'pending'
            RETURNING id, team_id, requested_by, message, status, created_at,
                      responded_at, responded_by, resolution_note
            "#,
        )
        .bind(to.to_string())
        .bind(responded_by)
        .bind(&note)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(request) => Ok(request),
            None => {
                let current = self
                    .get_join_request(id)
                    .await?
                    .ok_or(RosterError::RequestNotFound(id))?;
                Err(RosterError::InvalidStateTransition {
                    entity: "join request",
                    current: current.status.to_string(),
                })
            }
        }
    }

    async fn set_join_request_outcome(
        &self,
        id: Uuid,
        to: JoinRequestStatus,
        note: String,
    ) -> Result<(), RosterError> {
        let result = sqlx::query(
            r#"
            UPDATE team_join_requests
            SET status = $1, responded_at = NOW(), resolution_note = $2
            WHERE id = $3
            "#,
        )
        .bind(to.to_string())
        .bind(&note)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RosterError::RequestNotFound(id));
        }
        Ok(())
    }

    async fn insert_invitation(
        &self,
        invitation: Invitation,
    ) -> Result<Invitation, RosterError> {
        let result = sqlx::query(
            r#"
            INSERT INTO team_invitations
                (id, team_id, invited_user_id, invited_by, message, expires_at, status, created_at)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8
            WHERE NOT EXISTS (
                SELECT 1 FROM team_invitations
                WHERE team_id = $2 AND invited_user_id = $3 AND status = 'pending'
            )
            "#,
        )
        .bind(invitation.id)
        .bind(invitation.team_id)
        .bind(invitation.invited_user_id)
        .bind(invitation.invited_by)
        .bind(&invitation.message)
        .bind(invitation.expires_at)
        .bind(invitation.status.to_string())
        .bind(invitation.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RosterError::DuplicatePendingInvitation);
        }
        Ok(invitation)
    }

    async fn get_invitation(&self, id: Uuid) -> Result<Option<Invitation>, RosterError> {
        let invitation =
            sqlx::query_as::<_, Invitation>(&format!("{} WHERE id = $1", SELECT_INVITATION))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(invitation)
    }

    async fn invitations_for_user(&self, user_id: Uuid) -> Result<Vec<Invitation>, RosterError> {
        let invitations = sqlx::query_as::<_, Invitation>(&format!(
            r#"{}
            WHERE invited_user_id = $1
            ORDER BY CASE WHEN status = 'pending' THEN 0 ELSE 1 END, created_at DESC
            "#,
            SELECT_INVITATION
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(invitations)
    }

    async fn invitations_for_team(&self, team_id: Uuid) -> Result<Vec<Invitation>, RosterError> {
        let invitations = sqlx::query_as::<_, Invitation>(&format!(
            "{} WHERE team_id = $1 ORDER BY created_at DESC",
            SELECT_INVITATION
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(invitations)
    }

    async fn transition_invitation(
        &self,
        id: Uuid,
        to: InvitationStatus,
        note: Option<String>,
    ) -> Result<Invitation, RosterError> {
        let updated = sqlx::query_as::<_, Invitation>(
            r#"
            UPDATE team_invitations
            SET status = $1, responded_at = NOW(), resolution_note = $2
            WHERE id = $3 AND status = 'pending'
            RETURNING id, team_id, invited_user_id, invited_by, message, expires_at,
                      status, created_at, responded_at, resolution_note
            "#,
        )
        .bind(to.to_string())
        .bind(&note)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(invitation) => Ok(invitation),
            None => {
                let current = self
                    .get_invitation(id)
                    .await?
                    .ok_or(RosterError::InvitationNotFound(id))?;
                Err(RosterError::InvalidStateTransition {
                    entity: "invitation",
                    current: current.status.to_string(),
                })
            }
        }
    }

    async fn set_invitation_outcome(
        &self,
        id: Uuid,
        to: InvitationStatus,
        note: String,
    ) -> Result<(), RosterError> {
        let result = sqlx::query(
            r#"
            UPDATE team_invitations
            SET status = $1, responded_at = NOW(), resolution_note = $2
            WHERE id = $3
            "#,
        )
        .bind(to.to_string())
        .bind(&note)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RosterError::InvitationNotFound(id));
        }
        Ok(())
    }
}
