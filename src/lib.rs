use std::net::TcpListener;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{http, web, App, HttpServer};
use tracing_actix_web::TracingLogger;

pub mod config;
pub mod errors;
mod handlers;
mod middleware;
pub mod models;
pub mod roster;
mod routes;
pub mod services;
pub mod store;
pub mod telemetry;

use crate::config::jwt::JwtSettings;
use crate::roster::RosterService;
use crate::routes::init_routes;
use crate::services::Notifier;
use crate::store::RosterStore;

pub use crate::middleware::auth::Claims;

pub fn run(
    listener: TcpListener,
    store: Arc<dyn RosterStore>,
    jwt_settings: JwtSettings,
    redis_client: Option<Arc<redis::Client>>,
) -> Result<Server, std::io::Error> {
    let notifier = Notifier::new(redis_client);
    let roster_service = web::Data::new(RosterService::new(store, notifier));
    let jwt_settings = web::Data::new(jwt_settings);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://localhost:3001")
            .allowed_origin("https://ctfarena.fly.dev")
            .allowed_origin("https://ctfarena-admin.fly.dev")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH"])
            .allowed_headers(vec![
                http::header::AUTHORIZATION,
                http::header::ACCEPT,
                http::header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(roster_service.clone())
            .app_data(jwt_settings.clone())
            .configure(init_routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
