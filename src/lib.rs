pub mod auth;
pub mod config;
pub mod counter;
pub mod db;
pub mod error;

use std::sync::Arc;
use actix_web::HttpResponse;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{BearerAuth, Claims, ExpiryPolicy, TokenValidator};
pub use counter::CounterService;
pub use db::{Counter, CounterStore, DbOperations};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub counters: Arc<CounterService>,
}

impl AppState {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            counters: Arc::new(CounterService::new(store)),
        }
    }
}

/// Build the auth gate from settings. The secret is copied into the
/// validator here and nowhere else.
pub fn auth_gate(settings: &Settings) -> BearerAuth {
    let validator = TokenValidator::new(
        settings.auth.jwt_secret.as_bytes(),
        ExpiryPolicy::from_required(settings.auth.require_expiry),
    );
    BearerAuth::new(Arc::new(validator))
}
