//! Cache backend trait and implementations.
//!
//! A backend is an honest key/value store with per-entry TTL: it reports
//! its faults as [`CacheError`] instead of hiding them. The decision to
//! absorb those faults belongs to [`CacheStore`](crate::store::CacheStore),
//! not to the backend.
//!
//! Payloads are opaque strings (JSON in practice). Entries are written
//! whole and replaced whole - a backend never partially overwrites or
//! merges an entry, so a non-expired read always returns byte-identical
//! payload to the last write for that key.

use async_trait::async_trait;
use pulse_core::CacheError;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Pluggable cache backend.
///
/// Implementations must be safe for concurrent use; the cache layer adds no
/// locking around individual get/set calls.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a payload. `Ok(None)` means absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a payload under `key` with the given TTL, replacing any
    /// previous entry atomically.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Liveness probe for health reporting.
    async fn ping(&self) -> Result<(), CacheError>;
}

// ============================================================================
// REDIS BACKEND
// ============================================================================

/// Redis-backed cache using a managed multiplexed connection.
///
/// The connection manager reconnects on its own; individual command
/// failures surface as [`CacheError::Unavailable`] and are absorbed one
/// layer up.
#[derive(Clone)]
pub struct RedisBackend {
    manager: redis::aio::ConnectionManager,
}

impl RedisBackend {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1:6379/0`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Unavailable {
            reason: format!("invalid redis url: {}", e),
        })?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::Unavailable {
                reason: format!("redis connect failed: {}", e),
            })?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Unavailable {
                reason: e.to_string(),
            })
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        // SETEX takes whole seconds; sub-second TTLs round up to 1s.
        let secs = ttl.as_secs().max(1);
        redis::cmd("SETEX")
            .arg(key)
            .arg(secs)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::Unavailable {
                reason: e.to_string(),
            })
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| CacheError::Unavailable {
                reason: e.to_string(),
            })
    }
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

/// In-process cache backend with TTL eviction.
///
/// Used by tests and as the fallback when no Redis URL is configured.
/// Reads treat expired entries as absent; every write sweeps expired
/// entries out of the map, so the map is bounded by the set of keys
/// written within one TTL window - distinct query fingerprints cannot
/// accumulate across windows.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

struct MemoryEntry {
    payload: String,
    expires_at: Instant,
}

fn poisoned() -> CacheError {
    CacheError::Unavailable {
        reason: "cache lock poisoned".to_string(),
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .map(|entries| entries.values().filter(|e| e.expires_at > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.payload.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            key.to_string(),
            MemoryEntry {
                payload: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_round_trip() {
        let backend = MemoryBackend::new();
        backend
            .set("k", "payload", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("payload"));
        assert_eq!(backend.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_backend_expires_entries() {
        let backend = MemoryBackend::new();
        backend
            .set("k", "payload", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(backend.get("k").await.unwrap(), None);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn memory_backend_writes_sweep_expired_entries() {
        let backend = MemoryBackend::new();
        for i in 0..500 {
            backend
                .set(&format!("sensor_data:none:none:10:{}", i), "payload", Duration::from_millis(1))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(backend.is_empty());

        // One live write purges every expired entry from the map itself,
        // not just from the public view.
        backend
            .set("predictions:2025-03-01", "payload", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(backend.entries.read().unwrap().len(), 1);
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn memory_backend_poisoned_lock_is_unavailable_not_a_panic() {
        let backend = std::sync::Arc::new(MemoryBackend::new());
        backend
            .set("k", "payload", Duration::from_secs(60))
            .await
            .unwrap();

        let poisoner = std::sync::Arc::clone(&backend);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(
            backend.get("k").await,
            Err(CacheError::Unavailable { .. })
        ));
        assert!(matches!(
            backend.set("k", "v", Duration::from_secs(60)).await,
            Err(CacheError::Unavailable { .. })
        ));
        assert_eq!(backend.len(), 0);
    }

    #[tokio::test]
    async fn memory_backend_replaces_whole_entry() {
        let backend = MemoryBackend::new();
        backend
            .set("k", "first", Duration::from_secs(60))
            .await
            .unwrap();
        backend
            .set("k", "second", Duration::from_secs(60))
            .await
            .unwrap();
        // Replaced, never merged.
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("second"));
        assert_eq!(backend.len(), 1);
    }
}
