use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::errors::RosterError;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::membership::{AddTeamMemberRequest, ReassignLeaderRequest};
use crate::roster::{Actor, RosterService};

/// Add a user to a team directly, bypassing the request/invitation
/// protocol. Restricted to the team leader and admins.
#[tracing::instrument(
    name = "Add team member",
    skip(request, service, claims),
    fields(
        user = %claims.username,
        team_id = %team_id
    )
)]
pub async fn add_team_member(
    team_id: web::Path<Uuid>,
    request: web::Json<AddTeamMemberRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let membership = service
        .add_member(team_id.into_inner(), request.into_inner(), &actor)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        "User added to team successfully",
        membership,
    )))
}

pub async fn get_team_members(
    team_id: web::Path<Uuid>,
    service: web::Data<RosterService>,
) -> Result<HttpResponse, RosterError> {
    let team = service.get_team_with_members(team_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Team members retrieved successfully",
        team,
    )))
}

/// Remove a member, or leave the team when acting on oneself
#[tracing::instrument(
    name = "Remove team member",
    skip(service, claims, path),
    fields(user = %claims.username)
)]
pub async fn remove_team_member(
    path: web::Path<(Uuid, Uuid)>, // (team_id, user_id)
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let (team_id, user_id) = path.into_inner();
    let actor = Actor::from_claims(&claims)?;
    service.remove_member(team_id, user_id, &actor).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message(
        "User removed from team successfully",
    )))
}

/// Hand team leadership to an existing active member
#[tracing::instrument(
    name = "Reassign team leader",
    skip(request, service, claims),
    fields(user = %claims.username, team_id = %team_id)
)]
pub async fn reassign_leader(
    team_id: web::Path<Uuid>,
    request: web::Json<ReassignLeaderRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let change = service
        .reassign_leader(team_id.into_inner(), request.new_leader_user_id, &actor)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Team leadership reassigned", change)))
}
