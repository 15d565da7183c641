//! Complete Login Use Case
//!
//! Exchanges the authorization code and builds the session.

use std::sync::Arc;

use url::Url;

use crate::application::session_manager::SessionManager;
use crate::domain::provider::IdentityProvider;
use crate::domain::session::Session;
use crate::error::{AuthError, AuthResult};

/// Complete login input
pub struct CompleteLoginInput {
    pub callback_url: String,
    pub code_verifier: String,
    pub expected_state: String,
}

/// Complete login output
pub struct CompleteLoginOutput {
    pub session: Session,
    /// Callback arrived over HTTPS, cookies get the Secure flag
    pub secure: bool,
}

/// Complete login use case
pub struct CompleteLoginUseCase<P>
where
    P: IdentityProvider,
{
    provider: Arc<P>,
}

impl<P> CompleteLoginUseCase<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub async fn execute(&self, input: CompleteLoginInput) -> AuthResult<CompleteLoginOutput> {
        let callback_url = Url::parse(&input.callback_url)
            .map_err(|e| AuthError::TokenExchangeFailed(format!("invalid callback URL: {e}")))?;

        let tokens = self
            .provider
            .exchange_code(&callback_url, &input.code_verifier, &input.expected_state)
            .await?;

        let session = SessionManager::create_session(&tokens)?;

        tracing::info!(
            sub = %session.sub(),
            groups = session.groups().len(),
            expires_at = session.expires_at(),
            "User signed in"
        );

        Ok(CompleteLoginOutput {
            session,
            secure: callback_url.scheme() == "https",
        })
    }
}
