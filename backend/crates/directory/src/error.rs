//! Directory Error Types

use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppError;
use kernel::error::kind::ErrorKind;
use thiserror::Error;

pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Path leaves the CDN root
    #[error("Access denied")]
    AccessDenied,

    #[error("Not found")]
    NotFound,

    /// Filesystem failure; detail is logged, not returned
    #[error("I/O error: {0}")]
    Io(String),
}

impl DirectoryError {
    pub fn to_app_error(&self) -> AppError {
        match self {
            DirectoryError::AccessDenied => AppError::from_kind(ErrorKind::Forbidden),
            DirectoryError::NotFound => AppError::from_kind(ErrorKind::NotFound),
            DirectoryError::Io(_) => AppError::from_kind(ErrorKind::InternalServerError),
        }
    }
}

impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        if let DirectoryError::Io(detail) = &self {
            tracing::error!(error = %detail, "CDN error");
        }
        self.to_app_error().into_response()
    }
}
