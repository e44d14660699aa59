// src/routes/roster.rs
use actix_web::{delete, get, post, put, web, HttpResponse};
use uuid::Uuid;

use crate::errors::RosterError;
use crate::handlers::roster::{
    invitation_handler, join_request_handler, team_handler, team_member_handler,
};
use crate::handlers::roster::team_handler::CandidateQuery;
use crate::middleware::auth::Claims;
use crate::models::invitation::{RespondToInvitationRequest, SendInvitationRequest};
use crate::models::join_request::{
    BulkRespondRequest, RespondToJoinRequestRequest, SubmitJoinRequestRequest,
};
use crate::models::membership::{AddTeamMemberRequest, ReassignLeaderRequest};
use crate::models::team::{CreateTeamRequest, JoinByCodeRequest, TeamUpdateRequest};
use crate::roster::RosterService;

/// Create a new team with its initial roster
#[post("/teams")]
async fn create_team(
    request: web::Json<CreateTeamRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    team_handler::create_team(request, service, claims).await
}

/// Get a team with its active roster
#[get("/teams/{team_id}")]
async fn get_team(
    path: web::Path<Uuid>,
    service: web::Data<RosterService>,
) -> Result<HttpResponse, RosterError> {
    team_handler::get_team(path, service).await
}

/// Update team configuration
#[put("/teams/{team_id}")]
async fn update_team(
    path: web::Path<Uuid>,
    request: web::Json<TeamUpdateRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    team_handler::update_team(path, request, service, claims).await
}

/// Disband a team
#[delete("/teams/{team_id}")]
async fn delete_team(
    path: web::Path<Uuid>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    team_handler::delete_team(path, service, claims).await
}

/// Replace the invite code of an invite-only team
#[post("/teams/{team_id}/invite_code/rotate")]
async fn rotate_invite_code(
    path: web::Path<Uuid>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    team_handler::rotate_invite_code(path, service, claims).await
}

/// Join an invite-only team with its invite code
#[post("/teams/join_by_code")]
async fn join_by_code(
    request: web::Json<JoinByCodeRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    team_handler::join_by_code(request, service, claims).await
}

/// List eligible candidates for an event
#[get("/events/{event_id}/candidates")]
async fn get_candidates(
    path: web::Path<Uuid>,
    query: web::Query<CandidateQuery>,
    service: web::Data<RosterService>,
) -> Result<HttpResponse, RosterError> {
    team_handler::get_candidates(path, query, service).await
}

/// Add a member directly
#[post("/teams/{team_id}/members")]
async fn add_team_member(
    path: web::Path<Uuid>,
    request: web::Json<AddTeamMemberRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    team_member_handler::add_team_member(path, request, service, claims).await
}

/// Get the active roster of a team
#[get("/teams/{team_id}/members")]
async fn get_team_members(
    path: web::Path<Uuid>,
    service: web::Data<RosterService>,
) -> Result<HttpResponse, RosterError> {
    team_member_handler::get_team_members(path, service).await
}

/// Remove a member (or leave the team)
#[delete("/teams/{team_id}/members/{user_id}")]
async fn remove_team_member(
    path: web::Path<(Uuid, Uuid)>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    team_member_handler::remove_team_member(path, service, claims).await
}

/// Hand leadership to another active member
#[put("/teams/{team_id}/leader")]
async fn reassign_leader(
    path: web::Path<Uuid>,
    request: web::Json<ReassignLeaderRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    team_member_handler::reassign_leader(path, request, service, claims).await
}

/// Petition to join a team
#[post("/teams/{team_id}/join_requests")]
async fn submit_join_request(
    path: web::Path<Uuid>,
    request: web::Json<SubmitJoinRequestRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    join_request_handler::submit_join_request(path, request, service, claims).await
}

/// Pending join requests of a team
#[get("/teams/{team_id}/join_requests")]
async fn get_pending_join_requests(
    path: web::Path<Uuid>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    join_request_handler::get_pending_join_requests(path, service, claims).await
}

/// Approve or reject a join request
#[post("/join_requests/{request_id}/respond")]
async fn respond_to_join_request(
    path: web::Path<Uuid>,
    request: web::Json<RespondToJoinRequestRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    join_request_handler::respond_to_join_request(path, request, service, claims).await
}

/// Answer a batch of join requests independently
#[post("/join_requests/bulk_respond")]
async fn bulk_respond_join_requests(
    request: web::Json<BulkRespondRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    join_request_handler::bulk_respond_join_requests(request, service, claims).await
}

/// Invite a user to a team by email
#[post("/teams/{team_id}/invitations")]
async fn send_invitation(
    path: web::Path<Uuid>,
    request: web::Json<SendInvitationRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    invitation_handler::send_invitation(path, request, service, claims).await
}

/// Invitations sent for a team
#[get("/teams/{team_id}/invitations")]
async fn get_team_invitations(
    path: web::Path<Uuid>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    invitation_handler::get_team_invitations(path, service, claims).await
}

/// Invitations addressed to the current user
#[get("/invitations")]
async fn get_my_invitations(
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    invitation_handler::get_my_invitations(service, claims).await
}

/// Accept or decline an invitation
#[post("/invitations/{invitation_id}/respond")]
async fn respond_to_invitation(
    path: web::Path<Uuid>,
    request: web::Json<RespondToInvitationRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    invitation_handler::respond_to_invitation(path, request, service, claims).await
}

/// Withdraw a pending invitation
#[post("/invitations/{invitation_id}/cancel")]
async fn cancel_invitation(
    path: web::Path<Uuid>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    invitation_handler::cancel_invitation(path, service, claims).await
}
