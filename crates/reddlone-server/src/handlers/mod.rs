//! HTTP request handlers.

pub mod credentials;
pub mod health;
pub mod metrics;
pub mod tokens;

pub use credentials::validate_credentials;
pub use health::health_check;
pub use metrics::metrics_handler;
pub use tokens::verify_token;
