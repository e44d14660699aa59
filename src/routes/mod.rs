use actix_web::web;

pub mod admin;
pub mod backend_health;
pub mod roster;

use crate::middleware::admin::AdminMiddleware;
use crate::middleware::auth::AuthMiddleware;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(backend_health::backend_health);

    // Roster routes (require authentication)
    cfg.service(
        web::scope("/roster")
            .wrap(AuthMiddleware)
            .service(roster::create_team)
            .service(roster::join_by_code)
            .service(roster::get_team)
            .service(roster::update_team)
            .service(roster::delete_team)
            .service(roster::rotate_invite_code)
            .service(roster::get_candidates)
            .service(roster::add_team_member)
            .service(roster::get_team_members)
            .service(roster::remove_team_member)
            .service(roster::reassign_leader)
            .service(roster::submit_join_request)
            .service(roster::get_pending_join_requests)
            .service(roster::respond_to_join_request)
            .service(roster::bulk_respond_join_requests)
            .service(roster::send_invitation)
            .service(roster::get_team_invitations)
            .service(roster::get_my_invitations)
            .service(roster::respond_to_invitation)
            .service(roster::cancel_invitation),
    );
    // Admin routes (require admin role)
    cfg.service(
        web::scope("/admin")
            .wrap(AdminMiddleware)
            .service(admin::list_event_teams)
            .service(admin::disband_team),
    );
}
