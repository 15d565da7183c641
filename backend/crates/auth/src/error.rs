//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! Provider responses and token material only ever reach the log. The
//! response body carries a fixed public message per status class.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::storage::StoreError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Provider metadata could not be fetched or is inconsistent
    #[error("OIDC discovery failed: {0}")]
    DiscoveryFailed(String),

    /// Callback `state` differs from the one stored at login
    #[error("State mismatch")]
    StateMismatch,

    /// PKCE verifier or state lost between login and callback
    #[error("Missing PKCE parameters")]
    MissingPkce,

    /// Provider refused or failed the code exchange
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Token response carried no ID token
    #[error("No ID token in token response")]
    MissingIdToken,

    /// ID token signature, audience, issuer or expiry did not check out
    #[error("ID token rejected: {0}")]
    IdTokenRejected(String),

    /// Stored session could not be decoded or violates its invariants
    #[error("Malformed session: {0}")]
    MalformedSession(String),

    #[error("UserInfo request failed: {0}")]
    UserInfoFailed(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Token revocation failed: {0}")]
    RevocationFailed(String),

    /// Required request fields absent
    #[error("Missing parameters")]
    MissingParameters,

    /// Request body is not the expected JSON
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Route needs an authenticated session
    #[error("Session required")]
    SessionRequired,

    /// Every storage backend rejected a write
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingParameters | AuthError::InvalidBody(_) => ErrorKind::BadRequest,
            AuthError::SessionRequired | AuthError::RefreshFailed(_) => ErrorKind::Unauthorized,
            AuthError::UserInfoFailed(_) => ErrorKind::BadGateway,
            AuthError::DiscoveryFailed(_)
            | AuthError::StateMismatch
            | AuthError::MissingPkce
            | AuthError::TokenExchangeFailed(_)
            | AuthError::MissingIdToken
            | AuthError::IdTokenRejected(_)
            | AuthError::MalformedSession(_)
            | AuthError::RevocationFailed(_)
            | AuthError::Storage(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Message safe to show the browser
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingParameters => "Missing parameters",
            AuthError::InvalidBody(_) => "Invalid request body",
            AuthError::SessionRequired | AuthError::RefreshFailed(_) => "Authentication required",
            _ => "Authentication failed",
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.public_message());
        match self {
            AuthError::RefreshFailed(_) => err.with_action("Sign in again"),
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::StateMismatch => {
                tracing::warn!("OIDC callback state mismatch, possible CSRF");
            }
            AuthError::IdTokenRejected(reason) => {
                tracing::warn!(reason = %reason, "ID token rejected");
            }
            AuthError::MissingParameters | AuthError::InvalidBody(_) | AuthError::SessionRequired => {
                tracing::debug!(error = %self, "Auth request rejected");
            }
            AuthError::RefreshFailed(reason) => {
                tracing::info!(reason = %reason, "Refresh failed, forcing re-login");
            }
            _ => {
                tracing::error!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
