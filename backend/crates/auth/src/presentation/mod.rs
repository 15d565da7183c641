//! Presentation Layer
//!
//! HTTP handlers, DTOs, relay pages, router, and the route guard.

pub mod dto;
pub mod extractor;
pub mod handlers;
pub mod middleware;
pub mod pages;
pub mod router;


pub use extractor::{CurrentSession, RequireSession};
pub use handlers::AuthAppState;
pub use middleware::{GuardOutcome, GuardState, RouteGuard, resolve_session, route_guard};
pub use router::auth_router;
