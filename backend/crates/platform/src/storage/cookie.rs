//! Cookie storage backend
//!
//! Request-scoped: reads come from the cookies the browser sent, writes are
//! queued on the jar and leave as `Set-Cookie` headers. Cookies are script
//! readable (not httpOnly) so the page can fall back to them too.

use std::sync::Mutex;
use std::time::Duration;

use axum_extra::extract::cookie::CookieJar;

use super::{BackendKind, StorageBackend, StorageFailure};
use crate::cookie::{CookieConfig, MAX_COOKIE_BYTES, encoded_len, is_removal};

/// [`StorageBackend`] over an axum-extra [`CookieJar`]
pub struct CookieBackend {
    jar: Mutex<CookieJar>,
    secure: bool,
}

impl CookieBackend {
    pub fn new(jar: CookieJar, secure: bool) -> Self {
        Self {
            jar: Mutex::new(jar),
            secure,
        }
    }

    /// The jar including every pending change, to be returned from a handler
    pub fn jar(&self) -> CookieJar {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CookieJar> {
        self.jar.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn config(&self, key: &str, max_age_secs: i64) -> CookieConfig {
        CookieConfig::readable(key, max_age_secs).with_secure(self.secure)
    }
}

impl StorageBackend for CookieBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cookie
    }

    fn write(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StorageFailure> {
        let max_age = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let cookie = self.config(key, max_age).build(value);

        let size = encoded_len(&cookie);
        if size > MAX_COOKIE_BYTES {
            return Err(StorageFailure::TooLarge {
                backend: BackendKind::Cookie,
                size,
                limit: MAX_COOKIE_BYTES,
            });
        }

        let mut jar = self.lock();
        *jar = jar.clone().add(cookie);
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageFailure> {
        let jar = self.lock();
        Ok(jar
            .get(key)
            .filter(|cookie| !is_removal(cookie))
            .map(|cookie| cookie.value().to_string()))
    }

    fn remove(&self, key: &str) {
        let removal = self.config(key, 0).removal();
        let mut jar = self.lock();
        *jar = jar.clone().add(removal);
    }
}
