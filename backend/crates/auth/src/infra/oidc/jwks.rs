//! Provider JWKS cache
//!
//! Signing keys are fetched from the discovered `jwks_uri` on first use and
//! kept until a token names a `kid` the cached set does not have. That
//! triggers exactly one refetch, covering provider key rotation.

use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::{Jwk, JwkSet, PublicKeyUse};
use tokio::sync::RwLock;

use crate::error::{AuthError, AuthResult};

pub struct JwksCache {
    http: reqwest::Client,
    keys: RwLock<Option<JwkSet>>,
}

impl JwksCache {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            keys: RwLock::new(None),
        }
    }

    /// Decoding key for `kid`, or the only signing key when the token names none
    pub async fn decoding_key(&self, jwks_uri: &str, kid: Option<&str>) -> AuthResult<DecodingKey> {
        if let Some(key) = self.cached_key(kid).await? {
            return Ok(key);
        }

        tracing::debug!(kid = ?kid, "JWKS cache miss, refetching");
        self.refresh(jwks_uri).await?;

        self.cached_key(kid).await?.ok_or_else(|| {
            AuthError::IdTokenRejected(format!("no signing key for kid {kid:?}"))
        })
    }

    async fn cached_key(&self, kid: Option<&str>) -> AuthResult<Option<DecodingKey>> {
        let keys = self.keys.read().await;
        let Some(set) = keys.as_ref() else {
            return Ok(None);
        };

        let jwk = match kid {
            Some(kid) => set.find(kid),
            None => {
                let mut signing = set.keys.iter().filter(|k| is_signing_key(k));
                match (signing.next(), signing.next()) {
                    (Some(only), None) => Some(only),
                    _ => None,
                }
            }
        };

        jwk.map(|jwk| {
            DecodingKey::from_jwk(jwk)
                .map_err(|e| AuthError::IdTokenRejected(format!("unusable JWK: {e}")))
        })
        .transpose()
    }

    async fn refresh(&self, jwks_uri: &str) -> AuthResult<()> {
        let response = self
            .http
            .get(jwks_uri)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::IdTokenRejected(format!("JWKS fetch: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::IdTokenRejected(format!(
                "JWKS fetch: HTTP {}",
                response.status()
            )));
        }

        let set: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::IdTokenRejected(format!("JWKS parse: {e}")))?;

        tracing::debug!(keys = set.keys.len(), "JWKS refreshed");
        *self.keys.write().await = Some(set);
        Ok(())
    }
}

fn is_signing_key(jwk: &Jwk) -> bool {
    !matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption))
}
