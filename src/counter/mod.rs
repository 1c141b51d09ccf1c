//! Counter API: service rules, HTTP handlers and the route table.

pub mod handlers;
pub mod service;

pub use handlers::CounterResponse;
pub use service::CounterService;

use actix_web::web;

use crate::auth::BearerAuth;

/// Register the counter routes, each behind `gate`, plus `/health`.
pub fn configure(cfg: &mut web::ServiceConfig, gate: &BearerAuth) {
    cfg.app_data(web::JsonConfig::default().error_handler(handlers::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(handlers::query_error_handler))
        .route("/health", web::get().to(crate::health_check))
        .service(
            web::resource("/counter/create")
                .wrap(gate.clone())
                .route(web::post().to(handlers::create_counter)),
        )
        .service(
            web::resource("/counter/increment")
                .wrap(gate.clone())
                .route(web::post().to(handlers::increment_counter)),
        )
        .service(
            web::resource("/counter/delete")
                .wrap(gate.clone())
                .route(web::delete().to(handlers::delete_counter)),
        );
}
