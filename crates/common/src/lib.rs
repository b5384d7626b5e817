//! Common utilities and types shared across Reddlone crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for session token claims and pre-parse format checks
pub mod jwt;
