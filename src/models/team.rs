// src/models/team.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::membership::{MemberInfo, TeamRole};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamStatus {
    #[sqlx(rename = "active")]
    Active,
    #[sqlx(rename = "inactive")]
    Inactive,
    #[sqlx(rename = "disbanded")]
    Disbanded,
    #[sqlx(rename = "pending")]
    Pending,
}

impl std::fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamStatus::Active => write!(f, "active"),
            TeamStatus::Inactive => write!(f, "inactive"),
            TeamStatus::Disbanded => write!(f, "disbanded"),
            TeamStatus::Pending => write!(f, "pending"),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub event_id: Uuid,
    pub team_name: String,
    pub team_description: Option<String>,
    pub min_size: i32,
    pub max_size: i32,
    pub is_invite_only: bool,
    /// Opaque token granting direct join rights while the team is invite-only.
    pub invite_code: Option<String>,
    pub leader_id: Uuid,
    pub status: TeamStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One roster entry in a team creation request. The role is optional; it
/// only exists so a payload can make captain intent explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub user_id: Uuid,
    pub role: Option<TeamRole>,
}

/// Request to create a new team with its initial roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeamRequest {
    pub team_name: String,
    pub team_description: Option<String>,
    pub event_id: Uuid,
    pub min_size: i32,
    pub max_size: i32,
    #[serde(default)]
    pub is_invite_only: bool,
    /// Defaults to the creating actor when unspecified.
    pub captain_user_id: Option<Uuid>,
    #[serde(default)]
    pub members: Vec<RosterEntry>,
}

/// Request to update team configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamUpdateRequest {
    pub team_name: Option<String>,
    pub team_description: Option<String>,
    pub min_size: Option<i32>,
    pub max_size: Option<i32>,
    pub is_invite_only: Option<bool>,
    pub status: Option<TeamStatus>,
}

#[derive(Debug, Deserialize)]
pub struct JoinByCodeRequest {
    pub invite_code: String,
}

/// Team read model with its active roster
#[derive(Debug, Serialize, Deserialize)]
pub struct TeamWithMembers {
    pub team: Team,
    pub members: Vec<MemberInfo>,
    pub member_count: usize,
}

fn validate_team_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Team name cannot be empty".to_string());
    }

    if name.len() < 2 {
        return Err("Team name must be at least 2 characters".to_string());
    }

    if name.len() > 50 {
        return Err("Team name cannot exceed 50 characters".to_string());
    }

    if !name.chars().any(|c| c.is_alphanumeric()) {
        return Err("Team name must contain at least one letter or number".to_string());
    }

    Ok(())
}

fn validate_description(desc: &str) -> Result<(), String> {
    if desc.len() > 500 {
        return Err("Team description cannot exceed 500 characters".to_string());
    }
    Ok(())
}

impl CreateTeamRequest {
    /// Validate the shape of the request. Eligibility and capacity of the
    /// listed users are checked against storage by the team registry.
    pub fn validate(&self) -> Result<(), String> {
        validate_team_name(&self.team_name)?;

        if let Some(desc) = &self.team_description {
            validate_description(desc)?;
        }

        if self.min_size < 1 {
            return Err("Minimum team size must be at least 1".to_string());
        }

        if self.min_size > self.max_size {
            return Err("Minimum team size cannot exceed maximum team size".to_string());
        }

        Ok(())
    }

    /// Get sanitized team name
    pub fn get_sanitized_name(&self) -> String {
        self.team_name
            .trim()
            .chars()
            .filter(|&c| c != '\0' && c != '\t' && c != '\r' && c != '\n')
            .collect::<String>()
            .trim()
            .to_string()
    }
}

impl TeamUpdateRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.team_name.is_none()
            && self.team_description.is_none()
            && self.min_size.is_none()
            && self.max_size.is_none()
            && self.is_invite_only.is_none()
            && self.status.is_none()
        {
            return Err("At least one field must be provided for update".to_string());
        }

        if let Some(name) = &self.team_name {
            validate_team_name(name)?;
        }

        if let Some(desc) = &self.team_description {
            validate_description(desc)?;
        }

        if let Some(min_size) = self.min_size {
            if min_size < 1 {
                return Err("Minimum team size must be at least 1".to_string());
            }
        }

        if let Some(max_size) = self.max_size {
            if max_size < 1 {
                return Err("Maximum team size must be at least 1".to_string());
            }
        }

        Ok(())
    }
}
