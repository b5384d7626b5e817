//! HMAC-signed session tokens.
//!
//! A [`TokenAuthority`] holds the process signing key and is shared between
//! handlers through `Arc`. Tokens are standard HS256 JWTs carrying `sub`,
//! `iat` and `exp`, so any conforming verifier holding the same key can
//! check them.
//!
//! # Security
//!
//! - Tokens are format- and size-checked before the signature is computed
//! - Only HS256 is accepted
//! - Expiry is strict: a token is rejected once `now >= exp`, with no leeway
//! - Only `exp` is decoded; it may be fractional, and `sub`/`iat` are not
//!   type-checked
//! - All verification failures collapse into [`AuthError::InvalidToken`]
//! - Neither the key, the subject, nor the token is ever logged

use crate::config::Config;
use crate::errors::AuthError;
use crate::observability::metrics::{record_token_issued, record_token_verification};
use common::jwt::{check_token_format, SessionClaims, TokenExpiry};
use common::secret::SecretString;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use std::time::Duration;
use tracing::instrument;

/// Issues and verifies session tokens with a single process-wide key.
///
/// The key is fixed at construction; there is no rotation.
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    validity: Duration,
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("key", &"[REDACTED]")
            .field("validity", &self.validity)
            .finish()
    }
}

impl TokenAuthority {
    /// Create an authority signing with `secret`, issuing tokens valid for
    /// `validity`.
    pub fn new(secret: &[u8], validity: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against our own clock in `verify_at`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        // `exp` presence and type are enforced by decoding into `TokenExpiry`.
        validation.set_required_spec_claims::<&str>(&[]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            validity,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.secret_key_bytes(), config.token_validity())
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a token for `subject`, expiring `validity` from now.
    ///
    /// # Errors
    ///
    /// - `EmptySubject` if `subject` is empty
    /// - `Signing` if the encoder fails
    pub fn issue(&self, subject: &str) -> Result<SecretString, AuthError> {
        self.issue_at(subject, chrono::Utc::now().timestamp())
    }

    /// Verify `token` against the signing key and the current time.
    ///
    /// # Errors
    ///
    /// `InvalidToken` if the token is malformed, signed with another key or
    /// algorithm, or expired.
    pub fn verify(&self, token: &str) -> Result<(), AuthError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
            .map(|_| ())
    }

    /// Issue a token as if the current time were `now` (Unix seconds).
    #[instrument(skip_all)]
    pub fn issue_at(&self, subject: &str, now: i64) -> Result<SecretString, AuthError> {
        if subject.is_empty() {
            record_token_issued("error");
            return Err(AuthError::EmptySubject);
        }

        let validity_secs = i64::try_from(self.validity.as_secs()).unwrap_or(i64::MAX);
        let claims = SessionClaims::new(subject, now, now.saturating_add(validity_secs));

        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, &claims, &self.encoding_key).map_err(|e| {
            record_token_issued("error");
            AuthError::Signing(e.to_string())
        })?;

        record_token_issued("success");
        tracing::debug!(target: "reddlone.auth.token", exp = claims.exp, "Session token issued");
        Ok(SecretString::from(token))
    }

    /// Verify `token` as if the current time were `now` and return its expiry.
    #[instrument(skip_all)]
    pub fn verify_at(&self, token: &str, now: i64) -> Result<TokenExpiry, AuthError> {
        let result = self.decode_claims(token, now);
        record_token_verification(if result.is_ok() { "success" } else { "error" });
        result
    }

    fn decode_claims(&self, token: &str, now: i64) -> Result<TokenExpiry, AuthError> {
        check_token_format(token).map_err(|e| {
            tracing::debug!(target: "reddlone.auth.token", error = ?e, "Token format check failed");
            AuthError::InvalidToken
        })?;

        let token_data =
            decode::<TokenExpiry>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!(target: "reddlone.auth.token", error = %e, "Token verification failed");
                AuthError::InvalidToken
            })?;

        if !token_data.claims.is_live_at(now) {
            tracing::debug!(
                target: "reddlone.auth.token",
                exp = token_data.claims.exp,
                now = now,
                "Token rejected: expired"
            );
            return Err(AuthError::InvalidToken);
        }

        Ok(token_data.claims)
    }
}
