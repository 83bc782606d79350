//! Request authentication: end-user bearer tokens and service shared secrets.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::api::response::ApiError;
use crate::service::Identity;
use crate::AppState;

pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub scope: Option<ScopeClaim>,
}

/// Scopes arrive either space-separated or as a JSON array.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeClaim {
    Joined(String),
    List(Vec<String>),
}

impl ScopeClaim {
    fn into_scopes(self) -> Vec<String> {
        match self {
            ScopeClaim::Joined(s) => s.split_whitespace().map(str::to_string).collect(),
            ScopeClaim::List(list) => list.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }
}

/// Verify an HMAC-signed bearer token and turn its claims into an identity.
/// `exp` is checked when present but not required.
pub fn verify_bearer(token: &str, secret: &str) -> Result<Identity, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.required_spec_claims.clear();
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;
    let claims = data.claims;

    Ok(Identity {
        user_id: claims.sub,
        scopes: claims.scope.map(ScopeClaim::into_scopes).unwrap_or_default(),
    })
}

/// The end user behind a request, if any. A request without a bearer token is
/// anonymous; a request with a bad one is rejected.
pub struct Requester(pub Option<Identity>);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Requester {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        let Some(token) = token else {
            return Ok(Requester(None));
        };

        match verify_bearer(token.trim(), &state.config.auth.jwt_secret) {
            Ok(identity) => Ok(Requester(Some(identity))),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                Err(ApiError::unauthorized("invalid or expired token"))
            }
        }
    }
}

/// Another backend service, authenticated by `x-internal-token`.
pub struct InternalCaller;

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for InternalCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        check_shared_secret(
            parts,
            INTERNAL_TOKEN_HEADER,
            &state.config.auth.internal_secret,
        )?;
        Ok(InternalCaller)
    }
}

/// The storage provider's event notifier, authenticated by `x-webhook-secret`.
pub struct WebhookCaller;

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for WebhookCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        check_shared_secret(
            parts,
            WEBHOOK_SECRET_HEADER,
            &state.config.auth.webhook_secret,
        )?;
        Ok(WebhookCaller)
    }
}

fn check_shared_secret(parts: &Parts, header: &str, expected: &str) -> Result<(), ApiError> {
    let provided = parts
        .headers
        .get(header)
        .map(|v| v.as_bytes())
        .ok_or_else(|| ApiError::unauthorized(format!("{header} header is missing")))?;

    if expected.is_empty() || !bool::from(provided.ct_eq(expected.as_bytes())) {
        return Err(ApiError::unauthorized(format!("invalid {header}")));
    }
    Ok(())
}
