use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::errors::RosterError;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::invitation::{RespondToInvitationRequest, SendInvitationRequest};
use crate::roster::{Actor, RosterService};

/// Invite an event-registered user to the team by email
#[tracing::instrument(
    name = "Send team invitation",
    skip(request, service, claims),
    fields(user = %claims.username, team_id = %team_id)
)]
pub async fn send_invitation(
    team_id: web::Path<Uuid>,
    request: web::Json<SendInvitationRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let invitation = service
        .send_invitation(team_id.into_inner(), request.into_inner(), &actor)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        "Invitation sent successfully",
        invitation,
    )))
}

/// Accept or decline an invitation addressed to the caller
#[tracing::instrument(
    name = "Respond to team invitation",
    skip(request, service, claims),
    fields(user = %claims.username, invitation_id = %invitation_id)
)]
pub async fn respond_to_invitation(
    invitation_id: web::Path<Uuid>,
    request: web::Json<RespondToInvitationRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let invitation = service
        .respond_invitation(invitation_id.into_inner(), request.accept, &actor)
        .await?;

    let action = if request.accept { "accepted" } else { "declined" };
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        format!("Invitation {} successfully", action),
        invitation,
    )))
}

/// Withdraw a pending invitation
#[tracing::instrument(
    name = "Cancel team invitation",
    skip(service, claims),
    fields(user = %claims.username, invitation_id = %invitation_id)
)]
pub async fn cancel_invitation(
    invitation_id: web::Path<Uuid>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let invitation = service
        .cancel_invitation(invitation_id.into_inner(), &actor)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Invitation cancelled successfully",
        invitation,
    )))
}

/// Invitations addressed to the current user, pending first
pub async fn get_my_invitations(
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let invitations = service.my_invitations(&actor).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Invitations retrieved successfully",
        serde_json::json!({
            "invitations": invitations,
            "total_count": invitations.len()
        }),
    )))
}

pub async fn get_team_invitations(
    team_id: web::Path<Uuid>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let invitations = service
        .team_invitations(team_id.into_inner(), &actor)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Team invitations retrieved successfully",
        serde_json::json!({
            "invitations": invitations,
            "total_count": invitations.len()
        }),
    )))
}
