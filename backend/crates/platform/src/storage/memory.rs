//! In-process storage backend
//!
//! Stands in for the browser's tab-scoped and persistent stores wherever the
//! portal needs them server-side, and in tests where a backend has to be
//! switched off or filled up on demand.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::{BackendKind, StorageBackend, StorageFailure};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// HashMap-backed [`StorageBackend`]
pub struct MemoryBackend {
    kind: BackendKind,
    entries: Mutex<HashMap<String, Entry>>,
    quota_bytes: Option<usize>,
    honour_ttl: bool,
    available: AtomicBool,
}

impl MemoryBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            entries: Mutex::new(HashMap::new()),
            quota_bytes: None,
            honour_ttl: false,
            available: AtomicBool::new(true),
        }
    }

    /// Tab-scoped store, lives as long as the value it holds
    pub fn ephemeral() -> Self {
        Self::new(BackendKind::Ephemeral)
    }

    /// Persistent store
    pub fn durable() -> Self {
        Self::new(BackendKind::Durable)
    }

    /// Cap the total size of keys plus values
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    /// Expire entries after the ttl given at write time
    pub fn with_expiry(mut self) -> Self {
        self.honour_ttl = true;
        self
    }

    /// Toggle availability (private browsing, storage disabled by policy)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // A poisoned map still holds consistent String entries
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_available(&self) -> Result<(), StorageFailure> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StorageFailure::Unavailable { backend: self.kind })
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn write(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StorageFailure> {
        self.ensure_available()?;
        let mut entries = self.lock();

        if let Some(limit) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, e)| k.len() + e.value.len())
                .sum();
            if used + key.len() + value.len() > limit {
                return Err(StorageFailure::QuotaExceeded {
                    backend: self.kind,
                    limit,
                });
            }
        }

        let expires_at = self.honour_ttl.then(|| Instant::now() + ttl);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>, StorageFailure> {
        self.ensure_available()?;
        let mut entries = self.lock();
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn remove(&self, key: &str) {
        if self.is_available() {
            self.lock().remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(600);

    #[test]
    fn test_write_read_remove() {
        let backend = MemoryBackend::durable();
        backend.write("k", "v", TTL).unwrap();
        assert_eq!(backend.read("k").unwrap(), Some("v".to_string()));

        backend.remove("k");
        assert_eq!(backend.read("k").unwrap(), None);
    }

    #[test]
    fn test_unavailable_backend_fails() {
        let backend = MemoryBackend::ephemeral();
        backend.set_available(false);

        assert_eq!(
            backend.write("k", "v", TTL),
            Err(StorageFailure::Unavailable {
                backend: BackendKind::Ephemeral
            })
        );
        assert!(backend.read("k").is_err());
    }

    #[test]
    fn test_quota_exceeded() {
        let backend = MemoryBackend::durable().with_quota(8);
        backend.write("a", "1234", TTL).unwrap();

        let err = backend.write("b", "12345", TTL).unwrap_err();
        assert!(matches!(err, StorageFailure::QuotaExceeded { limit: 8, .. }));

        // Overwriting an existing key only counts the new value
        backend.write("a", "123456", TTL).unwrap();
    }

    #[test]
    fn test_expiry_when_enabled() {
        let backend = MemoryBackend::durable().with_expiry();
        backend.write("k", "v", Duration::ZERO).unwrap();
        assert_eq!(backend.read("k").unwrap(), None);

        let plain = MemoryBackend::durable();
        plain.write("k", "v", Duration::ZERO).unwrap();
        assert_eq!(plain.read("k").unwrap(), Some("v".to_string()));
    }
}
