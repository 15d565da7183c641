//! Identity Provider Trait
//!
//! Interface to the OpenID Connect provider. Implementation is in the
//! infrastructure layer.

use url::Url;

use crate::domain::token::{TokenResponse, TokenTypeHint, UserInfo};
use crate::error::AuthResult;

/// Identity provider trait
#[trait_variant::make(IdentityProvider: Send)]
pub trait LocalIdentityProvider {
    /// Authorization endpoint URL for an S256 challenge and state
    async fn authorization_url(&self, code_challenge: &str, state: &str) -> AuthResult<Url>;

    /// Exchange the code in `callback_url` for tokens.
    ///
    /// Fails with `StateMismatch` before any network call when the callback
    /// state differs from `expected_state`. The returned ID token has been
    /// validated.
    async fn exchange_code(
        &self,
        callback_url: &Url,
        code_verifier: &str,
        expected_state: &str,
    ) -> AuthResult<TokenResponse>;

    /// Fetch UserInfo with a bearer access token
    async fn fetch_user_info(&self, access_token: &str) -> AuthResult<UserInfo>;

    /// Trade a refresh token for a new token response
    async fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<TokenResponse>;

    /// Revoke a token (RFC 7009)
    async fn revoke_token(&self, token: &str, hint: TokenTypeHint) -> AuthResult<()>;
}
