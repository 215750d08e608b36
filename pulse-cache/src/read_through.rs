//! Read-through cache over sensor-data queries.
//!
//! Check the cache, fall through to the source-of-truth on miss, populate
//! the cache, return the fetched records. Two concurrent callers with the
//! same fingerprint may both miss and both write the same key; that race
//! is benign (last write wins, both payloads reflect the source-of-truth),
//! so no lock guards the primary tier.

use std::sync::Arc;

use crate::backend::CacheBackend;
use crate::fingerprint::Fingerprint;
use crate::settings::CacheSettings;
use crate::source::SensorSource;
use crate::store::CacheStore;
use pulse_core::{DataSourceError, QueryParams, SensorRecord};

/// Read-through query cache.
pub struct QueryCache<B, S>
where
    B: CacheBackend,
    S: SensorSource,
{
    store: CacheStore<B>,
    source: Arc<S>,
    settings: CacheSettings,
}

impl<B, S> QueryCache<B, S>
where
    B: CacheBackend,
    S: SensorSource,
{
    pub fn new(store: CacheStore<B>, source: Arc<S>, settings: CacheSettings) -> Self {
        Self {
            store,
            source,
            settings,
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn store(&self) -> &CacheStore<B> {
        &self.store
    }

    /// Fetch records for the parameter tuple.
    ///
    /// Cache hits are decoded and returned without touching the
    /// source-of-truth. On a miss the source query is bounded by
    /// `source_timeout`; a timeout surfaces as
    /// [`DataSourceError::Timeout`] and nothing is cached. The fetched
    /// records are returned directly, not re-read from the cache, so the
    /// same request never pays a serialize/deserialize round trip.
    pub async fn fetch(&self, params: &QueryParams) -> Result<Vec<SensorRecord>, DataSourceError> {
        let key = Fingerprint::of(params);

        if let Some(records) = self.store.get_json::<Vec<SensorRecord>>(key.as_str()).await {
            tracing::debug!(key = %key, records = records.len(), "query cache hit");
            return Ok(records);
        }

        tracing::debug!(key = %key, "query cache miss; querying source-of-truth");
        let records = tokio::time::timeout(
            self.settings.source_timeout,
            self.source.query_records(params),
        )
        .await
        .map_err(|_| DataSourceError::Timeout {
            timeout: self.settings.source_timeout,
        })??;

        self.store
            .set_json(key.as_str(), &records, self.settings.query_ttl)
            .await;

        Ok(records)
    }
}

impl<B, S> Clone for QueryCache<B, S>
where
    B: CacheBackend,
    S: SensorSource,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            source: Arc::clone(&self.source),
            settings: self.settings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use pulse_core::{CacheError, SensorMetadata};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn record(machine_id: i64, secs: i64) -> SensorRecord {
        SensorRecord {
            machine_id,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            temperature: Some(70.0),
            vibration: None,
            energy_consumption: Some(85.0),
            data_type: "pressing".to_string(),
            metadata: SensorMetadata::default(),
        }
    }

    /// Source that counts queries and serves a fixed record set.
    struct CountingSource {
        records: Vec<SensorRecord>,
        queries: AtomicUsize,
    }

    impl CountingSource {
        fn new(records: Vec<SensorRecord>) -> Self {
            Self {
                records,
                queries: AtomicUsize::new(0),
            }
        }

        fn query_count(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SensorSource for CountingSource {
        async fn query_records(
            &self,
            _params: &QueryParams,
        ) -> Result<Vec<SensorRecord>, DataSourceError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.clone())
        }

        async fn query_recent_window(
            &self,
            _window: Duration,
        ) -> Result<Vec<SensorRecord>, DataSourceError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.records.clone())
        }

        async fn insert_records(
            &self,
            records: &[SensorRecord],
        ) -> Result<u64, DataSourceError> {
            Ok(records.len() as u64)
        }
    }

    /// Source that always fails.
    struct BrokenSource;

    #[async_trait]
    impl SensorSource for BrokenSource {
        async fn query_records(
            &self,
            _params: &QueryParams,
        ) -> Result<Vec<SensorRecord>, DataSourceError> {
            Err(DataSourceError::Query {
                reason: "relation does not exist".to_string(),
            })
        }

        async fn query_recent_window(
            &self,
            _window: Duration,
        ) -> Result<Vec<SensorRecord>, DataSourceError> {
            Err(DataSourceError::Query {
                reason: "relation does not exist".to_string(),
            })
        }

        async fn insert_records(
            &self,
            _records: &[SensorRecord],
        ) -> Result<u64, DataSourceError> {
            Err(DataSourceError::Query {
                reason: "relation does not exist".to_string(),
            })
        }
    }

    /// Source that never answers within a test-sized timeout.
    struct StalledSource;

    #[async_trait]
    impl SensorSource for StalledSource {
        async fn query_records(
            &self,
            _params: &QueryParams,
        ) -> Result<Vec<SensorRecord>, DataSourceError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        async fn query_recent_window(
            &self,
            _window: Duration,
        ) -> Result<Vec<SensorRecord>, DataSourceError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        async fn insert_records(
            &self,
            records: &[SensorRecord],
        ) -> Result<u64, DataSourceError> {
            Ok(records.len() as u64)
        }
    }

    /// Backend where every operation fails.
    struct DeadBackend;

    #[async_trait]
    impl CacheBackend for DeadBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable {
                reason: "connection refused".to_string(),
            })
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable {
                reason: "connection refused".to_string(),
            })
        }

        async fn ping(&self) -> Result<(), CacheError> {
            Err(CacheError::Unavailable {
                reason: "connection refused".to_string(),
            })
        }
    }

    fn cache_with<S: SensorSource>(
        source: Arc<S>,
        settings: CacheSettings,
    ) -> QueryCache<MemoryBackend, S> {
        QueryCache::new(
            CacheStore::new(Arc::new(MemoryBackend::new())),
            source,
            settings,
        )
    }

    #[tokio::test]
    async fn second_fetch_within_ttl_skips_source() {
        let source = Arc::new(CountingSource::new(vec![record(1, 1000), record(2, 999)]));
        let cache = cache_with(Arc::clone(&source), CacheSettings::default());
        let params = QueryParams::new(None, None, 10, 0).unwrap();

        let first = cache.fetch(&params).await.unwrap();
        let second = cache.fetch(&params).await.unwrap();

        assert_eq!(first, second);
        // Read-through idempotence: one source query total.
        assert_eq!(source.query_count(), 1);
    }

    #[tokio::test]
    async fn expired_entry_causes_exactly_one_requery() {
        let source = Arc::new(CountingSource::new(vec![record(1, 1000)]));
        let settings = CacheSettings::new().with_query_ttl(Duration::from_millis(30));
        let cache = cache_with(Arc::clone(&source), settings);
        let params = QueryParams::new(None, None, 10, 0).unwrap();

        cache.fetch(&params).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.fetch(&params).await.unwrap();

        assert_eq!(source.query_count(), 2);
    }

    #[tokio::test]
    async fn distinct_params_do_not_share_entries() {
        let source = Arc::new(CountingSource::new(vec![record(1, 1000)]));
        let cache = cache_with(Arc::clone(&source), CacheSettings::default());

        let a = QueryParams::new(None, None, 10, 0).unwrap();
        let b = QueryParams::new(None, None, 10, 10).unwrap();
        cache.fetch(&a).await.unwrap();
        cache.fetch(&b).await.unwrap();

        assert_eq!(source.query_count(), 2);
    }

    #[tokio::test]
    async fn dead_cache_backend_still_serves_from_source() {
        let source = Arc::new(CountingSource::new(vec![record(1, 1000)]));
        let cache = QueryCache::new(
            CacheStore::new(Arc::new(DeadBackend)),
            Arc::clone(&source),
            CacheSettings::default(),
        );
        let params = QueryParams::new(None, None, 10, 0).unwrap();

        // Both calls succeed; each goes to the source because the cache
        // cannot hold anything.
        assert_eq!(cache.fetch(&params).await.unwrap().len(), 1);
        assert_eq!(cache.fetch(&params).await.unwrap().len(), 1);
        assert_eq!(source.query_count(), 2);
    }

    #[tokio::test]
    async fn stalled_source_times_out_and_caches_nothing() {
        let settings = CacheSettings::new().with_source_timeout(Duration::from_millis(20));
        let cache = cache_with(Arc::new(StalledSource), settings.clone());
        let params = QueryParams::new(None, None, 10, 0).unwrap();

        let err = cache.fetch(&params).await.unwrap_err();
        assert!(matches!(
            err,
            DataSourceError::Timeout { timeout } if timeout == settings.source_timeout
        ));
        // The abandoned fetch must not leave a partial entry behind.
        let key = Fingerprint::of(&params);
        assert_eq!(cache.store().get(key.as_str()).await, None);
    }

    #[tokio::test]
    async fn source_failure_is_surfaced_and_not_cached() {
        let cache = cache_with(Arc::new(BrokenSource), CacheSettings::default());
        let params = QueryParams::new(None, None, 10, 0).unwrap();

        let err = cache.fetch(&params).await.unwrap_err();
        assert!(matches!(err, DataSourceError::Query { .. }));
        // Nothing was written for the key.
        let key = Fingerprint::of(&params);
        assert_eq!(cache.store().get(key.as_str()).await, None);
    }

    #[tokio::test]
    async fn cached_payload_is_byte_identical_across_hits() {
        let source = Arc::new(CountingSource::new(vec![record(1, 1000)]));
        let cache = cache_with(Arc::clone(&source), CacheSettings::default());
        let params = QueryParams::new(None, None, 10, 0).unwrap();
        cache.fetch(&params).await.unwrap();

        let key = Fingerprint::of(&params);
        let first = cache.store().get(key.as_str()).await.unwrap();
        let second = cache.store().get(key.as_str()).await.unwrap();
        assert_eq!(first, second);
    }
}
