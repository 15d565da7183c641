//! Directory Backend Module
//!
//! What a signed-in user sees: the service catalog filtered by the groups in
//! their session, and a browsable static file tree.
//!
//! Clean Architecture structure:
//! - `domain/` - Service catalog and access rules
//! - `application/` - Configuration
//! - `infra/` - Filesystem-backed CDN
//! - `presentation/` - HTTP handlers, DTOs, router

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::DirectoryConfig;
pub use domain::catalog::{Catalog, Service, ServiceAccess, ServiceCategory};
pub use error::{DirectoryError, DirectoryResult};
pub use infra::cdn::CdnRoot;
pub use presentation::router::directory_router;
