use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::errors::RosterError;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::join_request::{
    BulkRespondRequest, RespondToJoinRequestRequest, SubmitJoinRequestRequest,
};
use crate::roster::{Actor, RosterService};

/// Petition to join an open team
#[tracing::instrument(
    name = "Submit join request",
    skip(request, service, claims),
    fields(user = %claims.username, team_id = %team_id)
)]
pub async fn submit_join_request(
    team_id: web::Path<Uuid>,
    request: web::Json<SubmitJoinRequestRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let submitted = service
        .submit_join_request(team_id.into_inner(), request.into_inner(), &actor)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        "Join request submitted successfully",
        submitted,
    )))
}

/// Approve or reject a pending request
#[tracing::instrument(
    name = "Respond to join request",
    skip(request, service, claims),
    fields(user = %claims.username, request_id = %request_id)
)]
pub async fn respond_to_join_request(
    request_id: web::Path<Uuid>,
    request: web::Json<RespondToJoinRequestRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let answered = service
        .respond_join_request(request_id.into_inner(), request.decision, &actor)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        format!("Join request {}", answered.status),
        answered,
    )))
}

/// Answer a batch of requests; each is evaluated independently and the
/// response reports per-request outcomes
#[tracing::instrument(
    name = "Bulk respond to join requests",
    skip(request, service, claims),
    fields(user = %claims.username, batch_size = request.request_ids.len())
)]
pub async fn bulk_respond_join_requests(
    request: web::Json<BulkRespondRequest>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let outcome = service
        .bulk_respond_join_requests(&request.request_ids, request.decision, &actor)
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        format!(
            "{} settled, {} failed",
            outcome.successful.len(),
            outcome.failed.len()
        ),
        outcome,
    )))
}

pub async fn get_pending_join_requests(
    team_id: web::Path<Uuid>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let requests = service
        .pending_join_requests(team_id.into_inner(), &actor)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Pending join requests retrieved successfully",
        serde_json::json!({
            "requests": requests,
            "total_count": requests.len()
        }),
    )))
}
