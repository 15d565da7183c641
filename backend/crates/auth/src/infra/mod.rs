//! Infrastructure Layer
//!
//! External service integrations.

pub mod oidc;

pub use oidc::OidcClient;
