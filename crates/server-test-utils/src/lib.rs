//! # Server Test Utilities
//!
//! Shared test utilities for the Reddlone server.
//!
//! This crate provides:
//! - Server test harness (`TestServer` for E2E tests)
//! - Token builders for expired, foreign-key and unsigned tokens
//!
//! ## Usage
//!
//! ```rust,ignore
//! use server_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let server = TestServer::spawn().await?;
//!     let client = reqwest::Client::new();
//!
//!     let response = client
//!         .get(format!("{}/api/health", server.url()))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use server_harness::*;
pub use token_builders::*;
