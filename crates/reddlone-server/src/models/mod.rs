//! Request and response bodies for the HTTP glue.

use common::secret::SecretString;
use serde::{Deserialize, Serialize};

/// Returned by `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Body of `POST /api/v1/credentials/validate`.
///
/// Every field is optional; only the ones present are checked.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    /// Redacted in Debug output.
    #[serde(default)]
    pub password: Option<SecretString>,
}
