//! Session token issuance and verification.

pub mod token;

pub use token::TokenAuthority;
