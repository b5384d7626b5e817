//! Session token utilities shared by the server and its test tooling.
//!
//! Session tokens are compact JWS strings (`header.payload.signature`) signed
//! with HMAC-SHA256. This module owns the claims layout and the checks that
//! run before any signature work:
//! - Size limit for DoS prevention
//! - Segment count and header decoding
//! - Algorithm pinning to `HS256`
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only HS256 is accepted; `none` and asymmetric algorithms are rejected
//!   before a key is ever consulted
//! - Error messages are generic; details go to debug logs
//! - The `sub` field in [`SessionClaims`] is redacted in Debug output
//! - Verification reads only `exp` ([`TokenExpiry`]); other claims may carry
//!   any JSON type

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum accepted token size in bytes (8KB).
///
/// A session token with a typical email subject is well under 300 bytes.
/// Anything above this limit is rejected before base64 decoding.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// The only signing algorithm session tokens may carry.
pub const SESSION_TOKEN_ALGORITHM: &str = "HS256";

// =============================================================================
// Error Types
// =============================================================================

/// Errors from the pre-verification format checks.
///
/// All variants render the same message so callers cannot learn which check
/// failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The session token is invalid or expired")]
    TokenTooLarge,

    /// Token is not three base64url segments with a JSON header.
    #[error("The session token is invalid or expired")]
    MalformedToken,

    /// Header names an algorithm other than HS256.
    #[error("The session token is invalid or expired")]
    UnsupportedAlgorithm,
}

// =============================================================================
// Claims Types
// =============================================================================

/// Claims written into every issued session token.
///
/// - `sub`: the verified email or username
/// - `iat`: issued-at, Unix epoch seconds
/// - `exp`: expiry, Unix epoch seconds; the token is valid only while
///   `now < exp`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject - redacted in Debug output.
    pub sub: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,
}

impl fmt::Debug for SessionClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClaims")
            .field("sub", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

impl SessionClaims {
    /// Creates claims for `sub` issued at `iat` and expiring at `exp`.
    #[must_use]
    pub fn new(sub: impl Into<String>, iat: i64, exp: i64) -> Self {
        Self {
            sub: sub.into(),
            iat,
            exp,
        }
    }

    /// Returns true when `now` is strictly before the expiry instant.
    #[must_use]
    pub fn is_live_at(&self, now: i64) -> bool {
        now < self.exp
    }
}

/// The only claim verification reads.
///
/// Other HS256 issuers sharing the key may encode `exp` as a JSON float and
/// put anything in `sub` or `iat`; those tokens are still accepted as long
/// as the signature matches and `exp` is in the future.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TokenExpiry {
    /// Expiration timestamp (Unix epoch seconds, possibly fractional).
    pub exp: f64,
}

impl TokenExpiry {
    /// Returns true when `now` is strictly before the expiry instant.
    /// A non-finite `exp` is never live.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_live_at(&self, now: i64) -> bool {
        self.exp.is_finite() && (now as f64) < self.exp
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Check the token's shape without touching the signature.
///
/// Verifies, in order: size, segment count, header base64url and JSON, and
/// that the header's `alg` is exactly `HS256`.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` - wrong segment count, bad base64, or header is not JSON
/// - `UnsupportedAlgorithm` - header `alg` is missing or not `HS256`
pub fn check_token_format(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    match header.get("alg").and_then(|v| v.as_str()) {
        Some(SESSION_TOKEN_ALGORITHM) => Ok(()),
        other => {
            tracing::debug!(target: "common.jwt", alg = ?other, "Token rejected: unsupported algorithm");
            Err(JwtValidationError::UnsupportedAlgorithm)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn token_with_header(header: &str) -> String {
        format!("{}.e30.c2ln", URL_SAFE_NO_PAD.encode(header.as_bytes()))
    }

    #[test]
    fn test_max_jwt_size_is_8kb() {
        assert_eq!(MAX_JWT_SIZE_BYTES, 8192);
    }

    #[test]
    fn test_check_format_accepts_hs256_header() {
        let token = token_with_header(r#"{"alg":"HS256","typ":"JWT"}"#);
        assert_eq!(check_token_format(&token), Ok(()));
    }

    #[test]
    fn test_check_format_rejects_wrong_segment_count() {
        assert_eq!(
            check_token_format("not-a-token"),
            Err(JwtValidationError::MalformedToken)
        );
        assert_eq!(
            check_token_format("a.b"),
            Err(JwtValidationError::MalformedToken)
        );
        assert_eq!(
            check_token_format("a.b.c.d"),
            Err(JwtValidationError::MalformedToken)
        );
        assert_eq!(check_token_format(""), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_check_format_rejects_empty_segment() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
        let token = format!("{header}.e30.");
        assert_eq!(
            check_token_format(&token),
            Err(JwtValidationError::MalformedToken)
        );
    }

    #[test]
    fn test_check_format_rejects_invalid_base64() {
        assert_eq!(
            check_token_format("!!!invalid!!!.payload.signature"),
            Err(JwtValidationError::MalformedToken)
        );
    }

    #[test]
    fn test_check_format_rejects_non_json_header() {
        let token = token_with_header("not json");
        assert_eq!(
            check_token_format(&token),
            Err(JwtValidationError::MalformedToken)
        );
    }

    #[test]
    fn test_check_format_rejects_alg_none() {
        let token = token_with_header(r#"{"alg":"none","typ":"JWT"}"#);
        assert_eq!(
            check_token_format(&token),
            Err(JwtValidationError::UnsupportedAlgorithm)
        );
    }

    #[test]
    fn test_check_format_rejects_missing_alg() {
        let token = token_with_header(r#"{"typ":"JWT"}"#);
        assert_eq!(
            check_token_format(&token),
            Err(JwtValidationError::UnsupportedAlgorithm)
        );
    }

    #[test]
    fn test_check_format_rejects_oversized_token() {
        let token = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        assert_eq!(
            check_token_format(&token),
            Err(JwtValidationError::TokenTooLarge)
        );
    }

    #[test]
    fn test_session_claims_debug_redacts_sub() {
        let claims = SessionClaims::new("alice@example.com", 1_700_000_000, 1_700_604_800);
        let debug = format!("{claims:?}");

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("alice@example.com"));
        assert!(debug.contains("1700604800"));
    }

    #[test]
    fn test_session_claims_liveness_is_strict() {
        let claims = SessionClaims::new("a@b.com", 100, 200);
        assert!(claims.is_live_at(199));
        assert!(!claims.is_live_at(200));
        assert!(!claims.is_live_at(201));
    }

    #[test]
    fn test_token_expiry_ignores_other_claims() {
        let expiry: TokenExpiry =
            serde_json::from_str(r#"{"sub":42,"iat":1.5,"exp":1700000000.5}"#).unwrap();
        assert!((expiry.exp - 1_700_000_000.5).abs() < f64::EPSILON);

        assert!(serde_json::from_str::<TokenExpiry>(r#"{"sub":"a@b.com"}"#).is_err());
        assert!(serde_json::from_str::<TokenExpiry>(r#"{"exp":"soon"}"#).is_err());
    }

    #[test]
    fn test_token_expiry_fractional_liveness_is_strict() {
        let expiry = TokenExpiry { exp: 200.5 };
        assert!(expiry.is_live_at(199));
        assert!(expiry.is_live_at(200));
        assert!(!expiry.is_live_at(201));

        let whole = TokenExpiry { exp: 200.0 };
        assert!(!whole.is_live_at(200));
    }

    #[test]
    fn test_session_claims_serialize_standard_names() {
        let claims = SessionClaims::new("a@b.com", 10, 20);
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["sub"], "a@b.com");
        assert_eq!(json["iat"], 10);
        assert_eq!(json["exp"], 20);
    }
}
