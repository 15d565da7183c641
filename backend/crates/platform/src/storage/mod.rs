//! Redundant key-value storage
//!
//! A value the portal needs to survive a browser round trip (PKCE material,
//! the convenience copy of the session) is written to every available medium
//! and read back from whichever still has it:
//!
//! - [`BackendKind::Ephemeral`] - per-tab store, cleared when the tab ends
//! - [`BackendKind::Durable`] - survives browser restarts, quota-limited
//! - [`BackendKind::Cookie`] - sent to the server, ~4 KB, carries an expiry
//!
//! [`StorageBackend`] is the uniform contract over one medium and
//! [`RobustStore`] orchestrates several of them.

pub mod cookie;
pub mod deferred;
pub mod memory;
pub mod robust;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

pub use self::cookie::CookieBackend;
pub use deferred::{ClientMedium, ClientStorageOp, DeferredBackend, collect_ops};
pub use memory::MemoryBackend;
pub use robust::{DEFAULT_HEAL_TTL, RobustStore, StoreError, WriteReport};

/// Physical medium behind a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BackendKind {
    Ephemeral,
    Durable,
    Cookie,
}

impl BackendKind {
    /// Read priority, lower is consulted first
    pub const fn priority(&self) -> u8 {
        match self {
            BackendKind::Ephemeral => 0,
            BackendKind::Durable => 1,
            BackendKind::Cookie => 2,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Ephemeral => "ephemeral",
            BackendKind::Durable => "durable",
            BackendKind::Cookie => "cookie",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single medium refused an operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageFailure {
    #[error("{backend} storage is unavailable")]
    Unavailable { backend: BackendKind },

    #[error("{backend} storage quota of {limit} bytes exceeded")]
    QuotaExceeded { backend: BackendKind, limit: usize },

    #[error("value of {size} bytes exceeds the {limit}-byte {backend} limit")]
    TooLarge {
        backend: BackendKind,
        size: usize,
        limit: usize,
    },
}

impl StorageFailure {
    pub fn backend(&self) -> BackendKind {
        match self {
            StorageFailure::Unavailable { backend }
            | StorageFailure::QuotaExceeded { backend, .. }
            | StorageFailure::TooLarge { backend, .. } => *backend,
        }
    }
}

/// Uniform read/write/delete over one storage medium
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Store `value` under `key`. `ttl` is honoured by media that expire.
    fn write(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StorageFailure>;

    /// `Ok(None)` when the key is absent
    fn read(&self, key: &str) -> Result<Option<String>, StorageFailure>;

    /// Best effort, never fails
    fn remove(&self, key: &str);
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn kind(&self) -> BackendKind {
        (**self).kind()
    }

    fn write(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StorageFailure> {
        (**self).write(key, value, ttl)
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageFailure> {
        (**self).read(key)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}
