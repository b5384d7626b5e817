//! Credential format validation endpoint.

use crate::errors::{CredentialField, ServiceError, ValidationError};
use crate::models::CredentialsRequest;
use crate::observability::metrics::record_credential_validation;
use crate::validation::{validate_email, validate_name, validate_password, validate_username};
use axum::{http::StatusCode, Json};
use common::secret::ExposeSecret;
use tracing::instrument;

/// Handler for POST /api/v1/credentials/validate
///
/// Checks every field present in the body, in the order username, name,
/// email, password, and stops at the first rejection.
///
/// # Response
///
/// - 204 No Content if every present field is well-formed
/// - 400 Bad Request naming the first rejected field and the reason
#[instrument(skip_all, name = "reddlone.credentials.validate")]
pub async fn validate_credentials(
    Json(request): Json<CredentialsRequest>,
) -> Result<StatusCode, ServiceError> {
    if let Some(username) = &request.username {
        check(CredentialField::Username, validate_username(username))?;
    }
    if let Some(name) = &request.name {
        check(CredentialField::Name, validate_name(name))?;
    }
    if let Some(email) = &request.email {
        check(CredentialField::Email, validate_email(email))?;
    }
    if let Some(password) = &request.password {
        check(
            CredentialField::Password,
            validate_password(password.expose_secret()),
        )?;
    }

    Ok(StatusCode::NO_CONTENT)
}

fn check(
    field: CredentialField,
    result: Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    match &result {
        Ok(()) => record_credential_validation(field.as_str(), "success"),
        Err(e) => {
            tracing::debug!(
                target: "reddlone.credentials",
                field = %field,
                reason = %e.reason,
                "Credential rejected"
            );
            record_credential_validation(field.as_str(), "error");
        }
    }
    result
}
