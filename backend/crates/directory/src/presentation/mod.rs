//! Presentation Layer
//!
//! HTTP handlers, DTOs, and router.

pub mod dto;
pub mod handlers;
pub mod router;

#[cfg(test)]
mod tests;

pub use handlers::DirectoryAppState;
pub use router::directory_router;
