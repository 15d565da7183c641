//! Begin Login Use Case
//!
//! Generates PKCE material, persists it, then builds the authorization URL.

use std::sync::Arc;

use platform::storage::RobustStore;
use url::Url;

use crate::application::client_store::{PKCE_STATE_KEY, PKCE_VERIFIER_KEY};
use crate::application::config::AuthConfig;
use crate::domain::pkce::{Pkce, generate_state};
use crate::domain::provider::IdentityProvider;
use crate::error::AuthResult;

/// Begin login output
pub struct BeginLoginOutput {
    pub authorization_url: Url,
}

/// Begin login use case
pub struct BeginLoginUseCase<P>
where
    P: IdentityProvider,
{
    provider: Arc<P>,
    config: Arc<AuthConfig>,
}

impl<P> BeginLoginUseCase<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>, config: Arc<AuthConfig>) -> Self {
        Self { provider, config }
    }

    pub async fn execute(&self, store: &RobustStore) -> AuthResult<BeginLoginOutput> {
        let pkce = Pkce::generate();
        let state = generate_state();

        // Persisted before anything can redirect the browser away
        store.set(PKCE_VERIFIER_KEY, pkce.code_verifier(), self.config.pkce_ttl)?;
        store.set(PKCE_STATE_KEY, &state, self.config.pkce_ttl)?;

        let authorization_url = self
            .provider
            .authorization_url(pkce.code_challenge(), &state)
            .await?;

        tracing::info!("Login initiated");

        Ok(BeginLoginOutput { authorization_url })
    }
}
