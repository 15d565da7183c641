//! Refresh Session Use Case

use std::sync::Arc;

use crate::application::session_manager::SessionManager;
use crate::domain::provider::IdentityProvider;
use crate::domain::session::Session;
use crate::error::{AuthError, AuthResult};

/// Refresh session use case
pub struct RefreshSessionUseCase<P>
where
    P: IdentityProvider,
{
    provider: Arc<P>,
}

impl<P> RefreshSessionUseCase<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// New session from the current one's refresh token. Any failure is
    /// `RefreshFailed` so the caller can force a fresh login.
    pub async fn execute(&self, current: &Session) -> AuthResult<Session> {
        let refresh_token = current
            .refresh_token()
            .ok_or_else(|| AuthError::RefreshFailed("session has no refresh token".into()))?;

        let tokens = self
            .provider
            .refresh_access_token(refresh_token)
            .await
            .map_err(|e| match e {
                AuthError::RefreshFailed(_) => e,
                other => AuthError::RefreshFailed(other.to_string()),
            })?;

        let session = SessionManager::renew_session(current, &tokens)
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        tracing::info!(sub = %session.sub(), expires_at = session.expires_at(), "Session refreshed");
        Ok(session)
    }
}
