//! Builder patterns for test token construction
//!
//! Session tokens are normally minted by `TokenAuthority`. These builders
//! produce the tokens it should reject: expired, signed with another key,
//! signed with another algorithm, or not signed at all.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;

/// Builder for session tokens with arbitrary claims.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_subject("alice@example.com")
///     .expires_in(-60)
///     .sign(TEST_SECRET_KEY);
/// ```
pub struct TestTokenBuilder {
    sub: String,
    iat: i64,
    exp: i64,
    algorithm: Algorithm,
}

impl TestTokenBuilder {
    /// Create a new token builder valid for one hour.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject@example.com".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            algorithm: Algorithm::HS256,
        }
    }

    /// Set the subject.
    pub fn for_subject(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set expiration in seconds from now. Negative values are in the past.
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set an absolute expiration timestamp.
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.exp = timestamp;
        self
    }

    /// Set issued-at timestamp.
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Sign with an HMAC algorithm other than HS256.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Build the claims as a JSON value.
    pub fn claims(&self) -> serde_json::Value {
        json!({
            "sub": self.sub,
            "iat": self.iat,
            "exp": self.exp,
        })
    }

    /// Sign the claims with `secret`.
    pub fn sign(self, secret: &str) -> String {
        encode(
            &Header::new(self.algorithm),
            &self.claims(),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("HMAC signing of JSON claims cannot fail")
    }

    /// Emit the claims under an `alg: none` header with an empty-ish signature.
    pub fn unsigned(self) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(self.claims().to_string());
        format!("{header}.{payload}.unsigned")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_produces_three_segments() {
        let token = TestTokenBuilder::new().sign("secret");
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_expires_in_past() {
        let builder = TestTokenBuilder::new().expires_in(-60);
        assert!(builder.exp < Utc::now().timestamp());
    }

    #[test]
    fn test_unsigned_header_is_alg_none() {
        let token = TestTokenBuilder::new().unsigned();
        let header = token.split('.').next().unwrap();
        let decoded = URL_SAFE_NO_PAD.decode(header).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(value["alg"], "none");
    }
}
