use std::collections::HashSet;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;
use thiserror::Error;

/// The only algorithms a shared HMAC secret can verify.
pub const PINNED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Claim set carried by a bearer token.
///
/// Every field is optional; the issuer only guarantees what it puts in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiry as a NumericDate: seconds since the Unix epoch, possibly
    /// fractional. Anything other than a JSON number is rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub iat: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub sub: Option<String>,
}

impl Claims {
    /// Claims holding only an expiry at `at`, in whole seconds.
    pub fn expiring_at(at: DateTime<Utc>) -> Self {
        Self {
            exp: Some(Number::from(at.timestamp())),
            ..Default::default()
        }
    }

    /// Expiry in seconds since the Unix epoch.
    pub fn expires_at(&self) -> Option<f64> {
        self.exp.as_ref().and_then(Number::as_f64)
    }
}

/// Decode a claim the service does not rely on; a value of the wrong type
/// reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Whether a token without `exp` is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Tokens without `exp` never expire.
    #[default]
    Optional,
    /// Tokens without `exp` are rejected.
    Required,
}

impl ExpiryPolicy {
    pub fn from_required(required: bool) -> Self {
        if required {
            ExpiryPolicy::Required
        } else {
            ExpiryPolicy::Optional
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not a well-formed JWT")]
    Malformed,

    #[error("signing algorithm {0:?} is not accepted")]
    UnsupportedAlgorithm(String),

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("claims could not be decoded")]
    MalformedClaims,

    #[error("token has no expiry")]
    MissingExpiry,

    #[error("token has expired")]
    Expired,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Verifies HMAC-signed bearer tokens against a shared secret.
///
/// The accepted algorithm family is fixed here, not taken from the token.
/// A header naming `none` or an asymmetric algorithm is rejected before any
/// signature work is done.
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
    expiry: ExpiryPolicy,
}

impl TokenValidator {
    pub fn new(secret: &[u8], expiry: ExpiryPolicy) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = PINNED_ALGORITHMS.to_vec();
        // Expiry is checked against the injected clock below.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
            expiry,
        }
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.expiry
    }

    /// Validate `token` as of `now`, returning its claims.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let alg = declared_algorithm(token)?;
        let pinned = alg
            .parse::<Algorithm>()
            .ok()
            .filter(|parsed| PINNED_ALGORITHMS.contains(parsed));
        if pinned.is_none() {
            return Err(TokenError::UnsupportedAlgorithm(alg));
        }
        // Header schema errors surface here, so a Json error from decode
        // below can only come from the claims.
        jsonwebtoken::decode_header(token).map_err(|_| TokenError::Malformed)?;

        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    TokenError::UnsupportedAlgorithm(alg.clone())
                }
                ErrorKind::Json(_) => TokenError::MalformedClaims,
                _ => TokenError::Malformed,
            }
        })?;

        let claims = data.claims;
        let now_secs = now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9;
        match claims.exp.as_ref().map(Number::as_f64) {
            Some(None) => Err(TokenError::MalformedClaims),
            Some(Some(exp)) if exp <= now_secs => Err(TokenError::Expired),
            Some(Some(_)) => Ok(claims),
            None if self.expiry == ExpiryPolicy::Required => Err(TokenError::MissingExpiry),
            None => Ok(claims),
        }
    }
}

/// Read the `alg` a token declares without trusting anything else in it.
fn declared_algorithm(token: &str) -> Result<String, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(TokenError::Malformed);
    };
    if header.is_empty() {
        return Err(TokenError::Malformed);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| TokenError::Malformed)?;
    let raw: RawHeader = serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)?;
    Ok(raw.alg)
}

/// Sign `claims` with HS256. Used for local development tokens and tests.
pub fn sign_hs256(claims: &Claims, secret: &[u8]) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
}
