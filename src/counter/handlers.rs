use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::db::Counter;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCounterRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct IncrementCounterRequest {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCounterQuery {
    pub id: Uuid,
}

/// Public view of a counter.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CounterResponse {
    pub id: Uuid,
    pub name: String,
    pub value: i64,
}

impl From<Counter> for CounterResponse {
    fn from(counter: Counter) -> Self {
        Self {
            id: counter.id,
            name: counter.name,
            value: counter.value,
        }
    }
}

pub async fn create_counter(
    req: web::Json<CreateCounterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    match state.counters.create_counter(&req.name).await {
        Ok(counter) => Ok(HttpResponse::Created().json(CounterResponse::from(counter))),
        Err(e) => {
            error!("Create counter failed for name {:?}: {}", req.name, e);
            Err(e)
        }
    }
}

pub async fn increment_counter(
    req: web::Json<IncrementCounterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    match state.counters.increment_counter(req.id).await {
        Ok(counter) => Ok(HttpResponse::Ok().json(CounterResponse::from(counter))),
        Err(e) => {
            error!("Increment failed for counter {}: {}", req.id, e);
            Err(e)
        }
    }
}

pub async fn delete_counter(
    query: web::Query<DeleteCounterQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let affected = state.counters.soft_delete_counter(query.id).await.map_err(|e| {
        error!("Delete failed for counter {}: {}", query.id, e);
        e
    })?;

    if affected == 0 {
        info!("Counter {} was unknown or already deleted", query.id);
    }
    Ok(HttpResponse::Ok().finish())
}

/// Turn JSON body errors into the API's 400 body.
pub fn json_error_handler(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}

/// Turn query string errors into the API's 400 body.
pub fn query_error_handler(err: actix_web::error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(format!("Please provide a valid uuid: {}", err)).into()
}
