//! Shared Kernel
//!
//! The error vocabulary every portal crate answers with: an [`ErrorKind`]
//! that fixes the HTTP status, and an [`AppError`] that carries the message
//! a browser may see. With the `axum` feature, `AppError` renders itself as
//! `{"error": "..."}` JSON.
//!
//! [`ErrorKind`]: error::kind::ErrorKind
//! [`AppError`]: error::app_error::AppError

pub mod error {
    pub mod app_error;
    pub mod kind;
    #[cfg(feature = "axum")]
    pub mod response;
}
