use actix_web::{middleware::Logger, web, App, HttpServer};
use chrono::{Duration, Utc};
use counter_server::auth::{sign_hs256, Claims};
use counter_server::{auth_gate, counter, AppError, AppState, DbOperations, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Log a short-lived token so the API can be exercised by hand.
fn log_development_token(settings: &Settings) {
    let claims = Claims::expiring_at(Utc::now() + Duration::minutes(5));
    match sign_hs256(&claims, settings.auth.jwt_secret.as_bytes()) {
        Ok(token) => info!("Development token (valid for 5 minutes): {}", token),
        Err(e) => warn!("Could not sign development token: {}", e),
    }
}

#[actix_web::main]
async fn main() -> counter_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = Settings::new().map_err(|e| {
        error!("Could not load configuration: {}", e);
        AppError::from(e)
    })?;
    config.validate()?;
    info!("Configuration loaded successfully");

    let db = DbOperations::connect(&config.database).await?;
    db.migrate().await?;
    info!("Database migrations applied");

    if config.environment == "development" {
        log_development_token(&config);
    }

    let state = web::Data::new(AppState::new(Arc::new(db.clone())));
    let gate = auth_gate(&config);

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!("Starting server at {}:{}", config.server.host, config.server.port);

    let result = HttpServer::new(move || {
        let gate = gate.clone();
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(|cfg| counter::configure(cfg, &gate))
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()));

    db.close().await;
    info!("Server stopped");
    result
}
