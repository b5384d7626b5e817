//! Server configuration.
//!
//! Configuration is loaded from environment variables once at startup.
//! The token signing key is held in a [`SecretString`] and never appears in
//! Debug output.

use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::lifecycle::LifecycleSettings;

/// Default listener address when `IP_ADDR` is unset.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default directory served under `/static/`.
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Default session token lifetime: 7 days.
pub const DEFAULT_TOKEN_VALIDITY_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Token lifetime bounds.
pub const MIN_TOKEN_VALIDITY_SECONDS: u64 = 60;
pub const MAX_TOKEN_VALIDITY_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Default grace period for in-flight requests during shutdown.
pub const DEFAULT_SHUTDOWN_GRACE_SECONDS: u64 = 10;
pub const MAX_SHUTDOWN_GRACE_SECONDS: u64 = 300;

/// Default per-request read and write timeouts.
pub const DEFAULT_READ_TIMEOUT_SECONDS: u64 = 15;
pub const DEFAULT_WRITE_TIMEOUT_SECONDS: u64 = 15;
pub const MAX_IO_TIMEOUT_SECONDS: u64 = 300;

/// Default keep-alive idle timeout.
pub const DEFAULT_IDLE_TIMEOUT_SECONDS: u64 = 60;
pub const MAX_IDLE_TIMEOUT_SECONDS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    /// Listener bind address (`IP_ADDR`).
    pub bind_address: String,

    /// HMAC key for session tokens (`SECRET_KEY`).
    pub secret_key: SecretString,

    /// Directory served under `/static/` (`STATIC_DIR`).
    pub static_dir: PathBuf,

    /// Session token lifetime in seconds.
    pub token_validity_seconds: u64,

    /// Bound on graceful connection close during shutdown.
    pub shutdown_grace_seconds: u64,

    /// Request header and body read timeout.
    pub read_timeout_seconds: u64,

    /// Handler/response timeout.
    pub write_timeout_seconds: u64,

    /// Close a connection after this long with no socket activity.
    pub idle_timeout_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("SECRET_KEY must not be empty")]
    EmptySecretKey,

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("IP_ADDR")
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        // Refuse to start without a key: an empty HMAC key makes tokens forgeable.
        let secret_key = vars
            .get("SECRET_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("SECRET_KEY".to_string()))?;
        if secret_key.is_empty() {
            return Err(ConfigError::EmptySecretKey);
        }
        let secret_key = SecretString::from(secret_key.as_str());

        let static_dir = vars
            .get("STATIC_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        let token_validity_seconds = parse_bounded_seconds(
            vars,
            "TOKEN_VALIDITY_SECONDS",
            DEFAULT_TOKEN_VALIDITY_SECONDS,
            MIN_TOKEN_VALIDITY_SECONDS,
            MAX_TOKEN_VALIDITY_SECONDS,
        )?;

        let shutdown_grace_seconds = parse_bounded_seconds(
            vars,
            "SHUTDOWN_GRACE_SECONDS",
            DEFAULT_SHUTDOWN_GRACE_SECONDS,
            1,
            MAX_SHUTDOWN_GRACE_SECONDS,
        )?;

        let read_timeout_seconds = parse_bounded_seconds(
            vars,
            "READ_TIMEOUT_SECONDS",
            DEFAULT_READ_TIMEOUT_SECONDS,
            1,
            MAX_IO_TIMEOUT_SECONDS,
        )?;

        let write_timeout_seconds = parse_bounded_seconds(
            vars,
            "WRITE_TIMEOUT_SECONDS",
            DEFAULT_WRITE_TIMEOUT_SECONDS,
            1,
            MAX_IO_TIMEOUT_SECONDS,
        )?;

        let idle_timeout_seconds = parse_bounded_seconds(
            vars,
            "IDLE_TIMEOUT_SECONDS",
            DEFAULT_IDLE_TIMEOUT_SECONDS,
            1,
            MAX_IDLE_TIMEOUT_SECONDS,
        )?;

        Ok(Config {
            bind_address,
            secret_key,
            static_dir,
            token_validity_seconds,
            shutdown_grace_seconds,
            read_timeout_seconds,
            write_timeout_seconds,
            idle_timeout_seconds,
        })
    }

    /// Raw signing key bytes.
    pub fn secret_key_bytes(&self) -> &[u8] {
        self.secret_key.expose_secret().as_bytes()
    }

    pub fn token_validity(&self) -> Duration {
        Duration::from_secs(self.token_validity_seconds)
    }

    /// Timeouts the lifecycle manager applies to the served router.
    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            bind_address: self.bind_address.clone(),
            grace_period: Duration::from_secs(self.shutdown_grace_seconds),
            read_timeout: Duration::from_secs(self.read_timeout_seconds),
            write_timeout: Duration::from_secs(self.write_timeout_seconds),
            idle_timeout: Duration::from_secs(self.idle_timeout_seconds),
        }
    }
}

/// Parse an optional integer number of seconds within `[min, max]`.
fn parse_bounded_seconds(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
    min: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: u64 = value_str.parse().map_err(|e| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("must be a valid positive integer, got '{}': {}", value_str, e),
    })?;

    if value < min || value > max {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: format!("must be between {} and {} seconds, got {}", min, max, value),
        });
    }

    Ok(value)
}
