//! OpenID Connect client
//!
//! Authorization code flow with PKCE (RFC 7636, S256 only) against a
//! discovered provider. Confidential clients authenticate to the token and
//! revocation endpoints with HTTP Basic; public clients send `client_id` in
//! the form body.

use std::sync::Arc;

use jsonwebtoken::DecodingKey;
use reqwest::header::ACCEPT;
use url::Url;

use super::discovery::{Discovery, ProviderMetadata};
use super::id_token::{self, IdTokenExpectations};
use super::jwks::JwksCache;
use crate::application::config::OidcConfig;
use crate::domain::pkce::{Pkce, authorization_code};
use crate::domain::provider::IdentityProvider;
use crate::domain::token::{OAuthErrorResponse, TokenResponse, TokenTypeHint, UserInfo};
use crate::error::{AuthError, AuthResult};

pub struct OidcClient {
    config: Arc<OidcConfig>,
    http: reqwest::Client,
    discovery: Discovery,
    jwks: JwksCache,
}

impl OidcClient {
    pub fn new(config: Arc<OidcConfig>) -> AuthResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuthError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            discovery: Discovery::new(http.clone(), config.issuer.clone()),
            jwks: JwksCache::new(http.clone()),
            config,
            http,
        })
    }

    pub fn config(&self) -> &OidcConfig {
        &self.config
    }

    /// Provider metadata, fetched on first use
    pub async fn metadata(&self) -> AuthResult<Arc<ProviderMetadata>> {
        self.discovery.metadata().await
    }

    fn post_form<'a>(
        &'a self,
        endpoint: &str,
        mut form: Vec<(&'static str, &'a str)>,
    ) -> reqwest::RequestBuilder {
        let request = self
            .http
            .post(endpoint)
            .header(ACCEPT, "application/json");

        match self.config.client_secret.as_deref() {
            Some(secret) => request
                .basic_auth(&self.config.client_id, Some(secret))
                .form(&form),
            None => {
                form.push(("client_id", self.config.client_id.as_str()));
                request.form(&form)
            }
        }
    }

    /// POST to the token endpoint. The error string is for the log only.
    async fn token_request(
        &self,
        metadata: &ProviderMetadata,
        form: Vec<(&'static str, &str)>,
    ) -> Result<TokenResponse, String> {
        let response = self
            .post_form(&metadata.token_endpoint, form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<OAuthErrorResponse>(&body) {
                Ok(oauth) => oauth.to_string(),
                Err(_) => format!("HTTP {status}"),
            });
        }

        response.json().await.map_err(|e| e.to_string())
    }

    async fn validate_id_token(&self, metadata: &ProviderMetadata, token: &str) -> AuthResult<()> {
        let header = id_token::decode_header(token)?;

        let key = if id_token::is_symmetric(header.alg) {
            let secret = self.config.client_secret.as_deref().ok_or_else(|| {
                AuthError::IdTokenRejected(format!("{:?} ID token without a client secret", header.alg))
            })?;
            DecodingKey::from_secret(secret.as_bytes())
        } else {
            let jwks_uri = metadata.jwks_uri.as_deref().ok_or_else(|| {
                AuthError::IdTokenRejected("provider advertises no jwks_uri".into())
            })?;
            self.jwks.decoding_key(jwks_uri, header.kid.as_deref()).await?
        };

        id_token::verify(
            token,
            header.alg,
            &key,
            &IdTokenExpectations {
                client_id: &self.config.client_id,
                issuer: &metadata.issuer,
                leeway_secs: self.config.clock_skew.as_secs(),
            },
        )
    }
}

impl IdentityProvider for OidcClient {
    async fn authorization_url(&self, code_challenge: &str, state: &str) -> AuthResult<Url> {
        let metadata = self.discovery.metadata().await?;
        let mut url = Url::parse(&metadata.authorization_endpoint)
            .map_err(|e| AuthError::DiscoveryFailed(format!("authorization_endpoint: {e}")))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes)
            .append_pair("state", state)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", Pkce::METHOD);

        Ok(url)
    }

    async fn exchange_code(
        &self,
        callback_url: &Url,
        code_verifier: &str,
        expected_state: &str,
    ) -> AuthResult<TokenResponse> {
        let code = authorization_code(callback_url, expected_state)?;
        let metadata = self.discovery.metadata().await?;

        let tokens = self
            .token_request(
                &metadata,
                vec![
                    ("grant_type", "authorization_code"),
                    ("code", code.as_str()),
                    ("redirect_uri", self.config.redirect_uri.as_str()),
                    ("code_verifier", code_verifier),
                ],
            )
            .await
            .map_err(AuthError::TokenExchangeFailed)?;

        let id_token = tokens.id_token.as_deref().ok_or(AuthError::MissingIdToken)?;
        self.validate_id_token(&metadata, id_token).await?;

        tracing::debug!("Authorization code exchanged");
        Ok(tokens)
    }

    async fn fetch_user_info(&self, access_token: &str) -> AuthResult<UserInfo> {
        let metadata = self.discovery.metadata().await?;
        let endpoint = metadata
            .userinfo_endpoint
            .as_deref()
            .ok_or_else(|| AuthError::UserInfoFailed("provider advertises no userinfo_endpoint".into()))?;

        let response = self
            .http
            .get(endpoint)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::UserInfoFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::UserInfoFailed(format!("HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::UserInfoFailed(e.to_string()))
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        let metadata = self.discovery.metadata().await?;

        let tokens = self
            .token_request(
                &metadata,
                vec![
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                ],
            )
            .await
            .map_err(AuthError::RefreshFailed)?;

        // Providers may omit the ID token on refresh; when present it must still check out
        if let Some(id_token) = tokens.id_token.as_deref() {
            self.validate_id_token(&metadata, id_token)
                .await
                .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;
        }

        Ok(tokens)
    }

    async fn revoke_token(&self, token: &str, hint: TokenTypeHint) -> AuthResult<()> {
        let metadata = self.discovery.metadata().await?;
        let endpoint = metadata.revocation_endpoint.as_deref().ok_or_else(|| {
            AuthError::RevocationFailed("provider advertises no revocation_endpoint".into())
        })?;

        let response = self
            .post_form(endpoint, vec![("token", token), ("token_type_hint", hint.as_str())])
            .send()
            .await
            .map_err(|e| AuthError::RevocationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::RevocationFailed(format!("HTTP {status}")));
        }

        tracing::debug!(hint = hint.as_str(), "Token revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde_json::{Value, json};
    use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::discovery::fixtures::metadata_json;
    use super::*;

    const SECRET: &str = "portal-client-secret-for-tests";
    const REDIRECT: &str = "http://localhost:3000/api/auth/callback";
    const RSA_PEM: &[u8] = include_bytes!("testdata/rsa_private_key.pem");
    const RSA_N: &str = "leNjbdpB_ivuPcy2Cm9Zlu9ayf1IMtGXAnvNE7JS1yF-AkFZ2AxrdH0hVu7tKa5bEDySEyBaZPZ8A07S_ADwQNNDbkQdEo4IrqPjH6SOMaSeQiO3A00aUbgfsOms4eclb-or7czRIbIeDRGfURh6yhEOAENwqMo0kbF_EEYDJPDn-1MpSMGLzfhczQOmDh022RjdZy5dzoS9IBl3hEiIZFowxBIyCS0a4dYNUozcqx7vx4d68npS0hDhuIHlZqRFZL0ujAHuoVXYgeamM46dIMIKjnuqIFC_x3Oikgtrj11spF-Q5zF2tjvy1FHJAp2z3e4DHrXJfdoWVFmS4wwmNQ";

    async fn provider(metadata: Value) -> MockServer {
        let server = MockServer::start().await;
        let metadata = if metadata.is_null() {
            metadata_json(&server.uri())
        } else {
            metadata
        };
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(metadata))
            .mount(&server)
            .await;
        server
    }

    fn confidential(server: &MockServer) -> OidcClient {
        let config = OidcConfig::new(server.uri(), "portal", REDIRECT).with_client_secret(SECRET);
        OidcClient::new(Arc::new(config)).unwrap()
    }

    fn public(server: &MockServer) -> OidcClient {
        OidcClient::new(Arc::new(OidcConfig::new(server.uri(), "portal", REDIRECT))).unwrap()
    }

    fn claims(issuer: &str) -> Value {
        let now = chrono::Utc::now().timestamp();
        json!({
            "iss": issuer,
            "aud": "portal",
            "sub": "user-1",
            "email": "user-1@example.com",
            "groups": ["infrastructure"],
            "iat": now,
            "exp": now + 600,
        })
    }

    fn hs256(claims: &Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn rs256(claims: &Value, kid: &str) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        encode(&header, claims, &EncodingKey::from_rsa_pem(RSA_PEM).unwrap()).unwrap()
    }

    fn jwks(kid: &str) -> Value {
        json!({
            "keys": [{
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": kid,
                "n": RSA_N,
                "e": "AQAB"
            }]
        })
    }

    fn token_body(id_token: Option<String>) -> Value {
        let mut body = json!({
            "access_token": "access-1",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-1"
        });
        if let Some(id_token) = id_token {
            body["id_token"] = json!(id_token);
        }
        body
    }

    fn callback(code: &str, state: &str) -> Url {
        Url::parse(&format!("{REDIRECT}?code={code}&state={state}")).unwrap()
    }

    #[tokio::test]
    async fn test_authorization_url() {
        let server = provider(Value::Null).await;
        let client = confidential(&server);

        let url = client.authorization_url("challenge-abc", "state-xyz").await.unwrap();
        assert_eq!(url.path(), "/authorize");

        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["client_id"], "portal");
        assert_eq!(query["redirect_uri"], REDIRECT);
        assert_eq!(query["scope"], "openid profile email");
        assert_eq!(query["state"], "state-xyz");
        assert_eq!(query["code_challenge"], "challenge-abc");
        assert_eq!(query["code_challenge_method"], "S256");
    }

    #[tokio::test]
    async fn test_exchange_code_hs256() {
        let server = provider(Value::Null).await;
        Mock::given(method("POST"))
            .and(path("/api/oidc/token"))
            .and(header_exists("authorization"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=code-1"))
            .and(body_string_contains("code_verifier=verifier-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_body(Some(hs256(&claims(&server.uri()))))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = confidential(&server);
        let tokens = client
            .exchange_code(&callback("code-1", "state-1"), "verifier-1", "state-1")
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "access-1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-1"));
    }

    #[tokio::test]
    async fn test_exchange_code_rs256_refetches_rotated_jwks() {
        let server = provider(Value::Null).await;
        // Cached set predates the rotation
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks("old")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks("rotated")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/oidc/token"))
            .and(body_string_contains("client_id=portal"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_body(Some(rs256(&claims(&server.uri()), "rotated")))),
            )
            .mount(&server)
            .await;

        let client = public(&server);
        // Warm the cache with the old set
        client
            .jwks
            .decoding_key(&format!("{}/.well-known/jwks.json", server.uri()), Some("old"))
            .await
            .unwrap();

        client
            .exchange_code(&callback("code-1", "s"), "verifier-1", "s")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_kid_rejected() {
        let server = provider(Value::Null).await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks("known")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/oidc/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_body(Some(rs256(&claims(&server.uri()), "stranger")))),
            )
            .mount(&server)
            .await;

        let result = public(&server)
            .exchange_code(&callback("code-1", "s"), "v", "s")
            .await;
        assert!(matches!(result, Err(AuthError::IdTokenRejected(_))));
    }

    #[tokio::test]
    async fn test_state_mismatch_makes_no_token_request() {
        let server = provider(Value::Null).await;
        Mock::given(method("POST"))
            .and(path("/api/oidc/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(None)))
            .expect(0)
            .mount(&server)
            .await;

        let result = confidential(&server)
            .exchange_code(&callback("code-1", "forged"), "v", "expected")
            .await;
        assert!(matches!(result, Err(AuthError::StateMismatch)));
    }

    #[tokio::test]
    async fn test_token_endpoint_error() {
        let server = provider(Value::Null).await;
        Mock::given(method("POST"))
            .and(path("/api/oidc/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "code expired"
            })))
            .mount(&server)
            .await;

        match confidential(&server)
            .exchange_code(&callback("code-1", "s"), "v", "s")
            .await
        {
            Err(AuthError::TokenExchangeFailed(detail)) => assert_eq!(detail, "invalid_grant: code expired"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_id_token() {
        let server = provider(Value::Null).await;
        Mock::given(method("POST"))
            .and(path("/api/oidc/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(None)))
            .mount(&server)
            .await;

        let result = confidential(&server)
            .exchange_code(&callback("code-1", "s"), "v", "s")
            .await;
        assert!(matches!(result, Err(AuthError::MissingIdToken)));
    }

    #[tokio::test]
    async fn test_id_token_for_other_client_rejected() {
        let server = provider(Value::Null).await;
        let mut foreign = claims(&server.uri());
        foreign["aud"] = json!("another-client");
        Mock::given(method("POST"))
            .and(path("/api/oidc/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body(Some(hs256(&foreign)))))
            .mount(&server)
            .await;

        let result = confidential(&server)
            .exchange_code(&callback("code-1", "s"), "v", "s")
            .await;
        assert!(matches!(result, Err(AuthError::IdTokenRejected(_))));
    }

    #[tokio::test]
    async fn test_user_info() {
        let server = provider(Value::Null).await;
        Mock::given(method("GET"))
            .and(path("/api/oidc/userinfo"))
            .and(header("authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "user-1",
                "email": "user-1@example.com",
                "picture": "https://example.com/a.png"
            })))
            .mount(&server)
            .await;

        let client = confidential(&server);
        let info = client.fetch_user_info("access-1").await.unwrap();
        assert_eq!(info.sub, "user-1");
        assert_eq!(info.extra["picture"], "https://example.com/a.png");

        assert!(matches!(
            client.fetch_user_info("revoked").await,
            Err(AuthError::UserInfoFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh() {
        let server = provider(Value::Null).await;
        Mock::given(method("POST"))
            .and(path("/api/oidc/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-2",
                "expires_in": 1800
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/oidc/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
            .mount(&server)
            .await;

        let client = confidential(&server);
        let tokens = client.refresh_access_token("refresh-1").await.unwrap();
        assert_eq!(tokens.access_token, "access-2");
        assert_eq!(tokens.expires_in, Some(1800));

        match client.refresh_access_token("stale").await {
            Err(AuthError::RefreshFailed(detail)) => assert_eq!(detail, "invalid_grant"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_revoke() {
        let server = provider(Value::Null).await;
        Mock::given(method("POST"))
            .and(path("/api/oidc/revoke"))
            .and(body_string_contains("token=refresh-1"))
            .and(body_string_contains("token_type_hint=refresh_token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        confidential(&server)
            .revoke_token("refresh-1", TokenTypeHint::RefreshToken)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_revoke_without_endpoint() {
        let server = MockServer::start().await;
        let mut metadata = metadata_json(&server.uri());
        metadata.as_object_mut().unwrap().remove("revocation_endpoint");
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(metadata))
            .mount(&server)
            .await;

        let result = confidential(&server)
            .revoke_token("access-1", TokenTypeHint::AccessToken)
            .await;
        assert!(matches!(result, Err(AuthError::RevocationFailed(_))));
    }

    #[tokio::test]
    async fn test_discovery_failure_surfaces() {
        let server = MockServer::start().await;
        let result = confidential(&server).authorization_url("c", "s").await;
        assert!(matches!(result, Err(AuthError::DiscoveryFailed(_))));
    }
}
