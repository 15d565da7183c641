//! Startup settings
//!
//! Read once from the environment (after `.env`) and turned into the plain
//! config structs the library crates take.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::{AuthConfig, OidcConfig};
use directory::DirectoryConfig;

#[derive(Debug, Clone)]
pub struct Settings {
    pub oidc: OidcConfig,
    pub auth: AuthConfig,
    pub directory: DirectoryConfig,
    pub bind_addr: SocketAddr,
    /// Browser origins allowed to call the API with credentials
    pub frontend_origins: Vec<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| var(key).with_context(|| format!("{key} must be set"));

        let issuer = required("OIDC_ISSUER")?;
        let redirect_uri = required("OIDC_REDIRECT_URI")?;
        let redirect = url::Url::parse(&redirect_uri)
            .with_context(|| format!("OIDC_REDIRECT_URI is not a URL: {redirect_uri}"))?;

        let mut oidc = OidcConfig::new(issuer, required("OIDC_CLIENT_ID")?, redirect_uri);
        if let Some(secret) = var("OIDC_CLIENT_SECRET") {
            oidc = oidc.with_client_secret(secret);
        }
        if let Some(scopes) = var("OIDC_SCOPES") {
            if !scopes.split_whitespace().any(|s| s == "openid") {
                bail!("OIDC_SCOPES must include openid");
            }
            oidc.scopes = scopes;
        }
        if let Some(secs) = var("OIDC_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("OIDC_REQUEST_TIMEOUT_SECS is not a number: {secs}"))?;
            if secs == 0 {
                bail!("OIDC_REQUEST_TIMEOUT_SECS must be positive");
            }
            oidc = oidc.with_request_timeout(Duration::from_secs(secs));
        }

        let mut auth = AuthConfig {
            // Cookies over plain http are only for local development
            cookie_secure: redirect.scheme() == "https",
            ..AuthConfig::default()
        };
        if let Some(routes) = var("PORTAL_PROTECTED_ROUTES") {
            auth = auth.with_protected_routes(list(&routes));
        }
        if let Some(echo) = var("PORTAL_ECHO_SESSION") {
            auth.echo_session = parse_bool("PORTAL_ECHO_SESSION", &echo)?;
        }

        let mut directory = DirectoryConfig::default();
        if let Some(root) = var("CDN_ROOT") {
            directory = directory.with_cdn_root(root);
        }

        let bind_addr = var("PORTAL_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("PORTAL_BIND_ADDR is not a socket address: {bind_addr}"))?;

        Ok(Self {
            oidc,
            auth,
            directory,
            bind_addr,
            frontend_origins: var("FRONTEND_ORIGINS").map(|o| list(&o)).unwrap_or_default(),
        })
    }
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{key} must be true or false, got {value}"),
    }
}
