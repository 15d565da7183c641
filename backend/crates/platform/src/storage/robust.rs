//! RobustStore - one logical key-value store over several media
//!
//! Writes go to every backend, reads walk them in priority order and copy a
//! value found lower down back into the backends above it.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::{BackendKind, StorageBackend, StorageFailure};

/// Outcome of a write that at least one backend accepted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub succeeded: Vec<BackendKind>,
    pub failures: Vec<StorageFailure>,
}

impl WriteReport {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("every storage backend rejected key '{key}'")]
    AllBackendsFailed {
        key: String,
        failures: Vec<StorageFailure>,
    },

    #[error("failed to serialize value for key '{key}'")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Lifetime given to copies written back by self-heal
pub const DEFAULT_HEAL_TTL: Duration = Duration::from_secs(600);

pub struct RobustStore {
    backends: Vec<Box<dyn StorageBackend>>,
}

impl RobustStore {
    pub fn new(mut backends: Vec<Box<dyn StorageBackend>>) -> Self {
        backends.sort_by_key(|b| b.kind().priority());
        Self { backends }
    }

    pub fn backend_kinds(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    pub fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<WriteReport, StoreError> {
        let mut report = WriteReport::default();

        for backend in &self.backends {
            match backend.write(key, value, ttl) {
                Ok(()) => report.succeeded.push(backend.kind()),
                Err(failure) => report.failures.push(failure),
            }
        }

        if report.succeeded.is_empty() {
            error!(key, failures = ?report.failures, "All storage backends failed");
            return Err(StoreError::AllBackendsFailed {
                key: key.to_string(),
                failures: report.failures,
            });
        }

        if report.is_partial() {
            warn!(
                key,
                succeeded = ?report.succeeded,
                failures = ?report.failures,
                "Partial storage failure"
            );
        }

        Ok(report)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        for (index, backend) in self.backends.iter().enumerate() {
            let value = match backend.read(key) {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(failure) => {
                    debug!(key, %failure, "Storage read failed, trying next backend");
                    continue;
                }
            };

            if index > 0 {
                self.heal(key, &value, &self.backends[..index]);
            }
            return Some(value);
        }
        None
    }

    fn heal(&self, key: &str, value: &str, higher: &[Box<dyn StorageBackend>]) {
        for backend in higher {
            if let Err(failure) = backend.write(key, value, DEFAULT_HEAL_TTL) {
                debug!(key, %failure, "Self-heal write skipped");
            }
        }
    }

    pub fn remove(&self, key: &str) {
        for backend in &self.backends {
            backend.remove(key);
        }
    }

    pub fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<WriteReport, StoreError> {
        let payload = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.set(key, &payload, ttl)
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = self.get(key)?;
        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Stored value is not valid JSON, treating as absent");
                None
            }
        }
    }
}
