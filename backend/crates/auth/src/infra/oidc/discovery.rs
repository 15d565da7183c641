//! OpenID Connect Discovery
//!
//! Provider metadata is fetched from `{issuer}/.well-known/openid-configuration`
//! the first time anything needs it and kept for the life of the process.
//! Concurrent first callers wait on the same in-flight fetch. A failed fetch
//! is not cached, the next caller tries again.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::error::{AuthError, AuthResult};

/// Provider metadata (OpenID Connect Discovery 1.0 §3)
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
    #[serde(default)]
    pub jwks_uri: Option<String>,
    #[serde(default)]
    pub revocation_endpoint: Option<String>,
    #[serde(default)]
    pub code_challenge_methods_supported: Vec<String>,
}

impl ProviderMetadata {
    /// Providers that do not advertise methods are assumed to support S256
    pub fn supports_s256(&self) -> bool {
        self.code_challenge_methods_supported.is_empty()
            || self.code_challenge_methods_supported.iter().any(|m| m == "S256")
    }
}

/// Lazily initialized, process-wide discovery state
pub struct Discovery {
    http: reqwest::Client,
    issuer: String,
    metadata: OnceCell<Arc<ProviderMetadata>>,
}

impl Discovery {
    pub fn new(http: reqwest::Client, issuer: impl Into<String>) -> Self {
        Self {
            http,
            issuer: issuer.into().trim_end_matches('/').to_string(),
            metadata: OnceCell::new(),
        }
    }

    pub fn discovery_url(&self) -> String {
        format!("{}/.well-known/openid-configuration", self.issuer)
    }

    pub async fn metadata(&self) -> AuthResult<Arc<ProviderMetadata>> {
        self.metadata
            .get_or_try_init(|| self.fetch())
            .await
            .map(Arc::clone)
    }

    pub fn is_initialized(&self) -> bool {
        self.metadata.initialized()
    }

    async fn fetch(&self) -> AuthResult<Arc<ProviderMetadata>> {
        let url = self.discovery_url();
        tracing::debug!(url = %url, "Fetching OIDC provider metadata");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::DiscoveryFailed(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::DiscoveryFailed(format!("{url}: HTTP {status}")));
        }

        let metadata: ProviderMetadata = response
            .json()
            .await
            .map_err(|e| AuthError::DiscoveryFailed(format!("{url}: {e}")))?;

        let advertised = metadata.issuer.trim_end_matches('/');
        if advertised != self.issuer {
            return Err(AuthError::DiscoveryFailed(format!(
                "issuer mismatch: expected {}, got {}",
                self.issuer, metadata.issuer
            )));
        }

        if !metadata.supports_s256() {
            tracing::warn!(
                methods = ?metadata.code_challenge_methods_supported,
                "Provider does not advertise S256 PKCE"
            );
        }

        tracing::info!(issuer = %metadata.issuer, "OIDC provider discovered");
        Ok(Arc::new(metadata))
    }
}
