//! Cookie Management Infrastructure
//!
//! Common cookie handling utilities and configuration. Values are
//! percent-encoded on the wire so structured payloads (JSON sessions) survive
//! the cookie-octet grammar.

use cookie::Cookie;

/// Browsers refuse cookies whose serialized `name=value` exceeds this.
pub const MAX_COOKIE_BYTES: usize = 4096;

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl From<SameSite> for cookie::SameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

/// Cookie configuration
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
    pub max_age_secs: Option<i64>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age_secs: None,
        }
    }
}

impl CookieConfig {
    /// Non-httpOnly cookie readable by page scripts
    pub fn readable(name: impl Into<String>, max_age_secs: i64) -> Self {
        Self {
            name: name.into(),
            http_only: false,
            max_age_secs: Some(max_age_secs),
            ..Default::default()
        }
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Build the cookie carrying `value`
    pub fn build(&self, value: impl Into<String>) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.clone(), value.into()))
            .path(self.path.clone())
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site.into());

        if let Some(max_age) = self.max_age_secs {
            builder = builder.max_age(cookie::time::Duration::seconds(max_age));
        }

        builder.build()
    }

    /// Build the expired counterpart that makes the browser drop the cookie
    pub fn removal(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.name.clone(), ""))
            .path(self.path.clone())
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site.into())
            .build();
        cookie.make_removal();
        cookie
    }
}

/// Size of `name=value` as the browser will store it
pub fn encoded_len(cookie: &Cookie<'_>) -> usize {
    cookie.stripped().encoded().to_string().len()
}

/// True when the cookie only exists to expire a previous one
pub fn is_removal(cookie: &Cookie<'_>) -> bool {
    cookie.max_age() == Some(cookie::time::Duration::ZERO)
}
