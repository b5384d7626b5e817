//! Reddlone server library.
//!
//! Two pieces of real logic sit behind a thin HTTP surface:
//!
//! - Authentication: credential format rules (`validation`) and HS256
//!   session tokens (`auth`)
//! - Lifecycle: a managed listener that serves until a termination signal,
//!   then closes connections within a grace period and waits for every
//!   registered background task (`lifecycle`)
//!
//! ```text
//! main.rs -> lifecycle::LifecycleManager -> routes/mod.rs -> handlers/*.rs
//!                                                           -> validation.rs, auth/
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `models` - Request and response bodies
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod routes;
pub mod validation;
