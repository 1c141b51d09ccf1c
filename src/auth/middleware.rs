use std::future::{ready, Ready};
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use tracing::{debug, warn};

use crate::auth::token::{Claims, TokenValidator};
use crate::error::{AppError, AuthError};

/// Scheme prefix, matched case-sensitively.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Claims of the token that let the request through.
///
/// Inserted into the request extensions by [`BearerAuth`], so handlers behind
/// the gate can take it as an extractor.
#[derive(Debug, Clone)]
pub struct AuthenticatedClaims(pub Claims);

impl FromRequest for AuthenticatedClaims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedClaims>()
                .cloned()
                .ok_or(AppError::AuthError(AuthError::MissingCredential)),
        )
    }
}

/// Decide whether the `Authorization` header in `headers` admits the request.
pub fn authorize(
    headers: &HeaderMap,
    validator: &TokenValidator,
    now: DateTime<Utc>,
) -> Result<Claims, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?;
    let header = header
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?
        .trim_start();

    // Only trailing whitespace is dropped from the token. `"Bearer "` reaches
    // the validator as an empty token; `"Bearer  <token>"` keeps its extra
    // space and fails there.
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MalformedCredential)?
        .trim_end();

    Ok(validator.validate(token, now)?)
}

/// Middleware factory that rejects requests without a valid bearer token.
#[derive(Clone)]
pub struct BearerAuth {
    validator: Arc<TokenValidator>,
}

impl BearerAuth {
    pub fn new(validator: Arc<TokenValidator>) -> Self {
        Self { validator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = BearerAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service,
            validator: Arc::clone(&self.validator),
        }))
    }
}

pub struct BearerAuthMiddleware<S> {
    service: S,
    validator: Arc<TokenValidator>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authorize(req.headers(), &self.validator, Utc::now()) {
            Ok(claims) => {
                debug!(path = %req.path(), "request authorized");
                req.extensions_mut().insert(AuthenticatedClaims(claims));
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(e) => {
                warn!(path = %req.path(), reason = %e, "rejected request");
                let res = req.error_response(AppError::from(e)).map_into_right_body();
                Box::pin(async move { Ok(res) })
            }
        }
    }
}
