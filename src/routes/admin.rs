use actix_web::{delete, get, web, HttpResponse};
use uuid::Uuid;

use crate::errors::RosterError;
use crate::handlers::admin::team_admin_handler;
use crate::middleware::auth::Claims;
use crate::roster::RosterService;

/// All teams of an event
#[get("/events/{event_id}/teams")]
async fn list_event_teams(
    path: web::Path<Uuid>,
    service: web::Data<RosterService>,
) -> Result<HttpResponse, RosterError> {
    team_admin_handler::list_event_teams(path, service).await
}

/// Disband any team
#[delete("/teams/{team_id}")]
async fn disband_team(
    path: web::Path<Uuid>,
    service: web::Data<RosterService>,
    claims: web::ReqData<Claims>,
) -> Result<HttpResponse, RosterError> {
    team_admin_handler::disband_team(path, service, claims).await
}
