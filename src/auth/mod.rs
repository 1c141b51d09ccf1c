//! Bearer-token authentication for the counter API.
//!
//! `token` verifies HMAC-signed JWTs against the configured secret and
//! `middleware` gates routes on the result.

pub mod middleware;
pub mod token;

pub use middleware::{authorize, AuthenticatedClaims, BearerAuth, BEARER_PREFIX};
pub use token::{sign_hs256, Claims, ExpiryPolicy, TokenError, TokenValidator};
