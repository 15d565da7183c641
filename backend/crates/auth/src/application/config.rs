//! Application Configuration
//!
//! Configuration for the Auth application layer and the OIDC client.

use std::time::Duration;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;
use platform::cookie::CookieConfig;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Authoritative session cookie (httpOnly)
    pub session_cookie_name: String,
    /// Script-readable "logged in" marker, advisory only
    pub marker_cookie_name: String,
    /// Lifetime of the session and marker cookies (7 days)
    pub session_cookie_ttl: Duration,
    /// Lifetime of stored PKCE material (10 minutes)
    pub pkce_ttl: Duration,
    /// Secure flag for cookies set outside the code exchange
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Path prefixes that need an authenticated session
    pub protected_routes: Vec<String>,
    /// Where blocked requests are sent
    pub unauthenticated_redirect: String,
    /// Where the browser lands after a successful login
    pub post_login_redirect: String,
    /// Echo the session in the code exchange response for client replication
    pub echo_session: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "session".to_string(),
            marker_cookie_name: "authenticated".to_string(),
            session_cookie_ttl: Duration::from_secs(7 * 24 * 3600), // 1 week
            pkce_ttl: Duration::from_secs(600),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            protected_routes: vec!["/services".to_string()],
            unauthenticated_redirect: "/".to_string(),
            post_login_redirect: "/services".to_string(),
            echo_session: true,
        }
    }
}

impl AuthConfig {
    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Default::default()
        }
    }

    pub fn with_protected_routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected_routes = routes.into_iter().map(Into::into).collect();
        self
    }

    /// httpOnly cookie holding the encoded session
    pub fn session_cookie(&self, secure: bool) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(self.session_cookie_ttl.as_secs() as i64),
        }
    }

    /// Readable marker cookie for client-side UI checks
    pub fn marker_cookie(&self, secure: bool) -> CookieConfig {
        CookieConfig {
            same_site: self.cookie_same_site,
            ..CookieConfig::readable(
                self.marker_cookie_name.clone(),
                self.session_cookie_ttl.as_secs() as i64,
            )
            .with_secure(secure)
        }
    }
}

/// OpenID Connect client configuration
#[derive(Debug, Clone)]
pub struct OidcConfig {
    /// Issuer identifier, discovery is fetched from
    /// `{issuer}/.well-known/openid-configuration`
    pub issuer: String,
    pub client_id: String,
    /// Confidential clients authenticate with HTTP Basic
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    /// Space separated
    pub scopes: String,
    /// Bound on every provider request
    pub request_timeout: Duration,
    /// Clock skew tolerated when checking ID token times
    pub clock_skew: Duration,
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:1411".to_string(),
            client_id: "portal".to_string(),
            client_secret: None,
            redirect_uri: "http://localhost:3000/api/auth/callback".to_string(),
            scopes: "openid profile email".to_string(),
            request_timeout: Duration::from_secs(10),
            clock_skew: Duration::from_secs(60),
        }
    }
}

impl OidcConfig {
    pub fn new(
        issuer: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            ..Default::default()
        }
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into()).filter(|s: &String| !s.is_empty());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
