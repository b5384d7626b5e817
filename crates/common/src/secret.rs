//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports from the [`secrecy`] crate. The token signing key, submitted
//! passwords and bearer tokens are carried in these wrappers so that any
//! struct deriving `Debug` around them prints `[REDACTED]` instead of the
//! value.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct SignupForm {
//!     username: String,
//!     password: SecretString,
//! }
//!
//! let form = SignupForm {
//!     username: "alice".to_string(),
//!     password: SecretString::from("P@ssw0rd"),
//! };
//!
//! assert!(!format!("{form:?}").contains("P@ssw0rd"));
//! assert_eq!(form.password.expose_secret(), "P@ssw0rd");
//! ```
//!
//! Secrets are zeroized when dropped.

pub use secrecy::{ExposeSecret, SecretString};

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("hunter2");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_expose_secret_returns_inner_value() {
        let secret = SecretString::from("signing-key");
        assert_eq!(secret.expose_secret(), "signing-key");
    }

    #[test]
    fn test_deserialized_password_is_redacted() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct Credentials {
            email: String,
            password: SecretString,
        }

        let json = r#"{"email": "bob@example.com", "password": "Secr3tValue"}"#;
        let creds: Credentials = serde_json::from_str(json).expect("deserialize");

        assert_eq!(creds.password.expose_secret(), "Secr3tValue");

        let debug = format!("{creds:?}");
        assert!(debug.contains("bob@example.com"));
        assert!(!debug.contains("Secr3tValue"));
    }
}
