//! The degradation boundary around a cache backend.
//!
//! [`CacheStore`] is where backend faults stop: reads that fail are logged
//! and reported as misses, writes that fail are logged and dropped. The
//! caller already has (or will fetch) a valid result from the
//! source-of-truth, so a dead cache must never fail a request.

use crate::backend::CacheBackend;
use pulse_core::CacheError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Cache store with absorb-and-log failure semantics.
pub struct CacheStore<B: CacheBackend> {
    backend: Arc<B>,
}

impl<B: CacheBackend> CacheStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Shared handle to the underlying backend (for health probes).
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Get a raw payload. Backend faults degrade to a miss.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.backend.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed; treating as miss");
                None
            }
        }
    }

    /// Get and decode a JSON payload.
    ///
    /// A payload that no longer decodes (schema drift, truncated write) is
    /// treated as a miss, not a crash: the entry will be overwritten by the
    /// caller's fresh result.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = self.get(key).await?;
        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                let err = CacheError::Decode {
                    key: key.to_string(),
                    reason: e.to_string(),
                };
                tracing::warn!(key, error = %err, "stale cache payload; treating as miss");
                None
            }
        }
    }

    /// Best-effort write. Failures are logged, never propagated.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        if let Err(e) = self.backend.set(key, value, ttl).await {
            tracing::warn!(key, error = %e, "cache write failed; dropping entry");
        }
    }

    /// Encode to JSON and write, best-effort.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(payload) => self.set(key, &payload, ttl).await,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache payload failed to encode; dropping entry");
            }
        }
    }

    /// Probe the backend. Unlike get/set this propagates the fault, so
    /// health endpoints can report a degraded cache.
    pub async fn ping(&self) -> Result<(), CacheError> {
        self.backend.ping().await
    }
}

impl<B: CacheBackend> Clone for CacheStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}
