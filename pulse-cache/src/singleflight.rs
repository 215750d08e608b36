//! Per-key mutual-exclusion leases for expensive recomputations.
//!
//! A [`FlightDeck`] hands out one lease per key: concurrent callers for the
//! same key queue behind the holder and re-check the cache once they get
//! the lease, so a cold key triggers one recomputation instead of N. Keys
//! are independent; leases for different keys never contend.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed lease registry.
#[derive(Default)]
pub struct FlightDeck {
    leases: DashMap<String, Arc<Mutex<()>>>,
}

impl FlightDeck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lease for `key`, waiting behind any current holder.
    ///
    /// The lease is held until the returned guard is dropped. A caller
    /// cancelled while waiting simply drops out of the queue; a caller
    /// cancelled while holding releases on drop, so the lease cannot leak.
    pub async fn acquire(&self, key: &str) -> Lease<'_> {
        let mutex = self
            .leases
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let guard = mutex.lock_owned().await;
        Lease {
            deck: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of keys with a registered lease (held or contended).
    pub fn len(&self) -> usize {
        self.leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}

/// Held lease for one key. Releasing (dropping) wakes the next waiter and
/// unregisters the key once nobody is queued on it.
pub struct Lease<'a> {
    deck: &'a FlightDeck,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        // Release the mutex before inspecting the registry entry; the only
        // remaining strong counts are the registry's own and any waiters'.
        self.guard.take();
        self.deck
            .leases
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
