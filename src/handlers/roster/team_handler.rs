use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::RosterError;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::team::{CreateTeamRequest, JoinByCodeRequest, TeamUpdateRequest};
use crate::roster::{Actor, RosterService};

#[derive(Debug, Deserialize)]
pub struct CandidateQuery {
    pub exclude_team_id: Option<Uuid>,
}

/// Create a team and materialize its initial roster in one step
#[tracing::instrument(
    name = "Create team",
    skip(request, service, claims),
    fields(
        team_name = %request.team_name,
        user = %claims.username
    )
)]
pub async fn create_team(
    request: web::Json<CreateTeamRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let created = service.create_team(request.into_inner(), &actor).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        "Team created successfully",
        created,
    )))
}

pub async fn get_team(
    team_id: web::Path<Uuid>,
    service: web::Data<RosterService>,
) -> Result<HttpResponse, RosterError> {
    let team = service.get_team_with_members(team_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Team retrieved successfully", team)))
}

/// Edit team configuration; setting status to disbanded cascades
#[tracing::instrument(
    name = "Update team",
    skip(request, service, claims),
    fields(user = %claims.username, team_id = %team_id)
)]
pub async fn update_team(
    team_id: web::Path<Uuid>,
    request: web::Json<TeamUpdateRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let team = service
        .update_team(team_id.into_inner(), request.into_inner(), &actor)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Team updated successfully", team)))
}

/// Disband a team: memberships close, pending requests and invitations are
/// settled, the record stays
#[tracing::instrument(
    name = "Disband team",
    skip(service, claims),
    fields(user = %claims.username, team_id = %team_id)
)]
pub async fn delete_team(
    team_id: web::Path<Uuid>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let outcome = service.delete_team(team_id.into_inner(), &actor).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Team disbanded", outcome)))
}

#[tracing::instrument(
    name = "Rotate invite code",
    skip(service, claims),
    fields(user = %claims.username, team_id = %team_id)
)]
pub async fn rotate_invite_code(
    team_id: web::Path<Uuid>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let team = service
        .rotate_invite_code(team_id.into_inner(), &actor)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Invite code rotated", team)))
}

/// Join an invite-only team directly with its invite code
#[tracing::instrument(
    name = "Join team by invite code",
    skip(request, service, claims),
    fields(user = %claims.username)
)]
pub async fn join_by_code(
    request: web::Json<JoinByCodeRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let team = service.join_by_code(&request.invite_code, &actor).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Joined team successfully", team)))
}

/// List users admissible for team membership in an event
pub async fn get_candidates(
    event_id: web::Path<Uuid>,
    query: web::Query<CandidateQuery>,
    service: web::Data<RosterService>,
) -> Result<HttpResponse, RosterError> {
    let candidates = service
        .eligible_candidates(event_id.into_inner(), query.exclude_team_id)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Candidates retrieved successfully",
        serde_json::json!({
            "candidates": candidates,
            "total_count": candidates.len()
        }),
    )))
}
