//! Session token verification endpoint.

use crate::errors::ServiceError;
use crate::routes::AppState;
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
};
use std::sync::Arc;
use tracing::instrument;

/// Extract the Bearer token from the Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ServiceError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "reddlone.tokens", "Missing Authorization header");
            ServiceError::MissingToken
        })?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::debug!(target: "reddlone.tokens", "Invalid Authorization header format");
        ServiceError::MissingToken
    })
}

/// Handler for POST /api/v1/tokens/verify
///
/// # Response
///
/// - 204 No Content if the bearer token verifies
/// - 401 Unauthorized if it is missing, malformed, forged or expired
#[instrument(skip_all, name = "reddlone.tokens.verify")]
pub async fn verify_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ServiceError> {
    let token = extract_bearer_token(&headers)?;
    state.tokens.verify(token)?;
    Ok(StatusCode::NO_CONTENT)
}
