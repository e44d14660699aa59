use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    #[sqlx(rename = "leader")]
    Leader,
    #[sqlx(rename = "member")]
    Member,
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamRole::Leader => write!(f, "leader"),
            TeamRole::Member => write!(f, "member"),
        }
    }
}

impl FromStr for TeamRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leader" => Ok(TeamRole::Leader),
            "member" => Ok(TeamRole::Member),
            other => Err(format!("unknown team role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    #[sqlx(rename = "active")]
    Active,
    #[sqlx(rename = "inactive")]
    Inactive,
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberStatus::Active => write!(f, "active"),
            MemberStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// The relationship binding one user to one team. A user holds at most one
/// active membership across all teams of the same event; a team holds
/// exactly one active leader membership while it is active.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
}

impl Membership {
    pub fn new(team_id: Uuid, user_id: Uuid, role: TeamRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id,
            user_id,
            role,
            status: MemberStatus::Active,
            joined_at: Utc::now(),
            left_at: None,
        }
    }
}

/// Roster entry joined with account details for the presentation layer
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MemberInfo {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: TeamRole,
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
}

/// Outcome of a ledger add: the created membership plus the leader that was
/// demoted when the new member took the leader role.
#[derive(Debug)]
pub struct MemberAdded {
    pub membership: Membership,
    pub demoted_leader: Option<Uuid>,
}

/// Outcome of an atomic leadership handoff
#[derive(Debug, Serialize)]
pub struct LeaderChange {
    pub demoted: Uuid,
    pub promoted: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AddTeamMemberRequest {
    pub user_id: Uuid,
    pub role: Option<TeamRole>,
}

#[derive(Debug, Deserialize)]
pub struct ReassignLeaderRequest {
    pub new_leader_user_id: Uuid,
}
