use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::errors::RosterError;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::roster::{Actor, RosterService};

/// All teams of an event, for the admin console
pub async fn list_event_teams(
    event_id: web::Path<Uuid>,
    service: web::Data<RosterService>,
) -> Result<HttpResponse, RosterError> {
    let teams = service.list_teams_for_event(event_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Teams retrieved successfully",
        serde_json::json!({
            "teams": teams,
            "total_count": teams.len()
        }),
    )))
}

/// Disband any team, regardless of who leads it
#[tracing::instrument(
    name = "Admin disband team",
    skip(service, claims),
    fields(user = %claims.username, team_id = %team_id)
)]
pub async fn disband_team(
    team_id: web::Path<Uuid>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    let actor = Actor::from_claims(&claims)?;
    let outcome = service.delete_team(team_id.into_inner(), &actor).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Team disbanded", outcome)))
}
