//! Deferred client-side storage
//!
//! The browser's `sessionStorage` and `localStorage` are out of the server's
//! reach. Writes against them are recorded as [`ClientStorageOp`]s and shipped
//! to the page, whose script replays them before navigating on. Reads always
//! report the key as absent, the server never sees those stores.

use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{BackendKind, StorageBackend, StorageFailure};

/// Browser store a deferred op targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMedium {
    SessionStorage,
    LocalStorage,
}

impl ClientMedium {
    pub fn kind(&self) -> BackendKind {
        match self {
            ClientMedium::SessionStorage => BackendKind::Ephemeral,
            ClientMedium::LocalStorage => BackendKind::Durable,
        }
    }
}

/// One store mutation for the page script to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ClientStorageOp {
    Set {
        medium: ClientMedium,
        key: String,
        value: String,
    },
    Remove {
        medium: ClientMedium,
        key: String,
    },
}

impl ClientStorageOp {
    pub fn key(&self) -> &str {
        match self {
            ClientStorageOp::Set { key, .. } | ClientStorageOp::Remove { key, .. } => key,
        }
    }
}

/// Records writes to a browser store for later replay
pub struct DeferredBackend {
    medium: ClientMedium,
    ops: Mutex<Vec<ClientStorageOp>>,
}

impl DeferredBackend {
    pub fn new(medium: ClientMedium) -> Self {
        Self {
            medium,
            ops: Mutex::new(Vec::new()),
        }
    }

    pub fn session_storage() -> Self {
        Self::new(ClientMedium::SessionStorage)
    }

    pub fn local_storage() -> Self {
        Self::new(ClientMedium::LocalStorage)
    }

    /// Recorded ops in write order
    pub fn ops(&self) -> Vec<ClientStorageOp> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ClientStorageOp>> {
        self.ops.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StorageBackend for DeferredBackend {
    fn kind(&self) -> BackendKind {
        self.medium.kind()
    }

    fn write(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), StorageFailure> {
        self.lock().push(ClientStorageOp::Set {
            medium: self.medium,
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn read(&self, _key: &str) -> Result<Option<String>, StorageFailure> {
        Ok(None)
    }

    fn remove(&self, key: &str) {
        self.lock().push(ClientStorageOp::Remove {
            medium: self.medium,
            key: key.to_string(),
        });
    }
}

/// Collect the ops of several deferred backends, ephemeral first
pub fn collect_ops<'a>(backends: impl IntoIterator<Item = &'a DeferredBackend>) -> Vec<ClientStorageOp> {
    let mut backends: Vec<_> = backends.into_iter().collect();
    backends.sort_by_key(|b| b.kind().priority());
    backends.into_iter().flat_map(|b| b.ops()).collect()
}
