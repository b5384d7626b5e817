//! Error types.
//!
//! Domain errors (`ValidationError`, `AuthError`, `LifecycleError`) are
//! returned to the immediate caller. `ServiceError` is the HTTP-facing type;
//! its `IntoResponse` impl maps each kind to a status code and logs internal
//! details server-side while returning a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Which credential string a [`ValidationError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    Username,
    Name,
    Email,
    Password,
}

impl CredentialField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialField::Username => "username",
            CredentialField::Name => "name",
            CredentialField::Email => "email",
            CredentialField::Password => "password",
        }
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A credential string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: CredentialField,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: CredentialField, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Token issuance and verification failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Unparseable, badly signed, or expired token. Deliberately uninformative.
    #[error("The session token is invalid or expired")]
    InvalidToken,

    #[error("Token subject must not be empty")]
    EmptySubject,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Server lifecycle failures.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The listener could not be bound. Fatal at startup.
    #[error("Failed to bind listener on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] io::Error),

    /// In-flight requests outlived the grace period. Logged, never fatal.
    #[error("Graceful shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),

    /// OS signal handling is process-global and may be installed only once.
    #[error("Signal handler is already installed")]
    SignalHandlerAlreadyInstalled,
}

/// HTTP-facing error type.
///
/// Maps to:
/// - Validation: 400 Bad Request
/// - Auth(InvalidToken), MissingToken: 401 Unauthorized
/// - Auth(EmptySubject): 400 Bad Request
/// - Auth(Signing): 500 Internal Server Error
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Missing bearer token")]
    MissingToken,
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Auth(AuthError::InvalidToken) | ServiceError::MissingToken => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::Auth(AuthError::EmptySubject) => StatusCode::BAD_REQUEST,
            ServiceError::Auth(AuthError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message, field) = match &self {
            ServiceError::Validation(err) => (
                "INVALID_CREDENTIAL",
                err.reason.clone(),
                Some(err.field.as_str().to_string()),
            ),
            ServiceError::Auth(AuthError::InvalidToken) => {
                ("INVALID_TOKEN", AuthError::InvalidToken.to_string(), None)
            }
            ServiceError::Auth(AuthError::EmptySubject) => {
                ("EMPTY_SUBJECT", AuthError::EmptySubject.to_string(), None)
            }
            ServiceError::MissingToken => (
                "INVALID_TOKEN",
                "A bearer token is required".to_string(),
                None,
            ),
            ServiceError::Auth(AuthError::Signing(err)) => {
                tracing::error!(target: "reddlone.errors", error = %err, "Internal error");
                (
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                field,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(CredentialField::Email, "missing @");
        assert_eq!(err.to_string(), "invalid email: missing @");
    }

    #[test]
    fn test_status_codes() {
        let validation: ServiceError =
            ValidationError::new(CredentialField::Password, "too short").into();
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);

        let invalid: ServiceError = AuthError::InvalidToken.into();
        assert_eq!(invalid.status_code(), StatusCode::UNAUTHORIZED);

        assert_eq!(
            ServiceError::MissingToken.status_code(),
            StatusCode::UNAUTHORIZED
        );

        let signing: ServiceError = AuthError::Signing("boom".to_string()).into();
        assert_eq!(signing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_validation_response_names_field() {
        let err: ServiceError =
            ValidationError::new(CredentialField::Username, "must be 3-32 characters").into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIAL");
        assert_eq!(body["error"]["field"], "username");
        assert_eq!(body["error"]["message"], "must be 3-32 characters");
    }

    #[tokio::test]
    async fn test_signing_failure_response_hides_details() {
        let err: ServiceError = AuthError::Signing("key material leaked here".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(body["error"].get("field").is_none());
    }

    #[test]
    fn test_shutdown_timeout_display() {
        let err = LifecycleError::ShutdownTimeout(Duration::from_secs(10));
        assert_eq!(
            err.to_string(),
            "Graceful shutdown did not complete within 10s"
        );
    }
}
