//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Session entity, PKCE, token payloads, provider trait
//! - `application/` - Use cases and application services
//! - `infra/` - OpenID Connect client
//! - `presentation/` - HTTP handlers, DTOs, relay pages, route guard
//!
//! ## Features
//! - OpenID Connect authorization code flow with PKCE (S256)
//! - Lazily discovered, process-wide provider metadata
//! - ID token verification against the provider JWKS
//! - Stateless sessions carried in an httpOnly cookie
//! - PKCE material kept redundantly in every browser store
//!
//! ## Security Model
//! - The httpOnly `session` cookie is the only trust anchor
//! - Client-side session copies are for display, never for access control
//! - State is checked in constant time before the code leaves the server
//! - Provider errors and tokens never reach response bodies

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{AuthConfig, OidcConfig};
pub use domain::provider::IdentityProvider;
pub use domain::session::Session;
pub use error::{AuthError, AuthResult};
pub use infra::oidc::OidcClient;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::session::*;
    pub use crate::domain::token::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::extractor::{CurrentSession, RequireSession};
    pub use crate::presentation::middleware::*;
}
