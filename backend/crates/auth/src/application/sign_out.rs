//! Sign Out Use Case
//!
//! Clears every client-side copy of the session and leftover PKCE material,
//! and revokes the provider token on a best-effort basis.

use std::sync::Arc;
use std::time::Duration;

use platform::storage::RobustStore;

use crate::application::client_store::{SESSION_COPY_KEY, clear_pkce};
use crate::domain::provider::IdentityProvider;
use crate::domain::session::Session;
use crate::domain::token::TokenTypeHint;

/// Longest logout waits on the provider before clearing cookies anyway
pub const REVOCATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Sign out use case
pub struct SignOutUseCase<P>
where
    P: IdentityProvider,
{
    provider: Arc<P>,
}

impl<P> SignOutUseCase<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Never fails: a revocation error must not keep the user signed in
    pub async fn execute(&self, session: Option<&Session>, store: &RobustStore) {
        store.remove(SESSION_COPY_KEY);
        clear_pkce(store);

        let Some(session) = session else {
            tracing::debug!("Sign out without a session");
            return;
        };

        let (token, hint) = match session.refresh_token() {
            Some(refresh_token) => (refresh_token, TokenTypeHint::RefreshToken),
            None => (session.access_token(), TokenTypeHint::AccessToken),
        };

        match tokio::time::timeout(REVOCATION_TIMEOUT, self.provider.revoke_token(token, hint)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(sub = %session.sub(), error = %e, "Token revocation failed");
            }
            Err(_) => {
                tracing::warn!(
                    sub = %session.sub(),
                    timeout_secs = REVOCATION_TIMEOUT.as_secs(),
                    "Token revocation timed out"
                );
            }
        }

        tracing::info!(sub = %session.sub(), "User signed out");
    }
}
