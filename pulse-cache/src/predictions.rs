//! Day-bucketed cache for the maintenance-prediction feed.
//!
//! Recomputing a bundle is expensive (one model call per group per forecast
//! point), so unlike the primary query tier this cache guards misses with a
//! per-bucket-key lease: concurrent cold callers queue behind the one
//! computation and re-check the store when they get the lease. The
//! recompute runs inside the caller's own future, so a caller cancelled
//! mid-computation abandons it; the lease releases on drop and the bucket
//! stays empty until a later caller finishes a pass.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pulse_core::{ModelError, PredictionBundle, PulseError, PulseResult, SensorRecord, Timestamp};

use crate::backend::CacheBackend;
use crate::forecast::ForecastEngine;
use crate::model::MaintenanceModel;
use crate::settings::CacheSettings;
use crate::singleflight::FlightDeck;
use crate::source::SensorSource;
use crate::store::CacheStore;

/// Key prefix for prediction bundles.
const PREFIX: &str = "predictions";

/// Derived-data cache for prediction bundles.
pub struct PredictionCache<B, S, M>
where
    B: CacheBackend,
    S: SensorSource,
    M: MaintenanceModel,
{
    store: CacheStore<B>,
    source: Arc<S>,
    engine: ForecastEngine<M>,
    settings: CacheSettings,
    deck: FlightDeck,
}

/// Bucket key for the calendar day containing `at`, in UTC.
///
/// UTC is the single reference zone for the whole bundle: the bucket key,
/// `last_updated`, and every timeline timestamp. Mixing zones here would
/// let the key roll over at a different instant than the timestamps it
/// labels.
pub fn bucket_key(at: Timestamp) -> String {
    format!("{}:{}", PREFIX, at.format("%Y-%m-%d"))
}

impl<B, S, M> PredictionCache<B, S, M>
where
    B: CacheBackend,
    S: SensorSource,
    M: MaintenanceModel,
{
    pub fn new(
        store: CacheStore<B>,
        source: Arc<S>,
        model: Arc<M>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            store,
            source: Arc::clone(&source),
            engine: ForecastEngine::new(model, settings.clone()),
            settings,
            deck: FlightDeck::new(),
        }
    }

    pub fn store(&self) -> &CacheStore<B> {
        &self.store
    }

    /// Serve the current day-bucket's bundle, computing it if absent.
    ///
    /// An empty raw-reading window yields an empty bundle with a message,
    /// which is cached like any other bundle. Model unavailability and
    /// source failures abort with typed errors and cache nothing.
    pub async fn get_predictions(&self) -> PulseResult<PredictionBundle> {
        let now = Utc::now();
        let key = bucket_key(now);

        if let Some(bundle) = self.store.get_json::<PredictionBundle>(&key).await {
            tracing::debug!(key, "prediction cache hit");
            return Ok(bundle);
        }

        // Cold bucket: take the lease, then look again. Whoever held the
        // lease before us has usually already filled the bucket.
        let _lease = self.deck.acquire(&key).await;
        if let Some(bundle) = self.store.get_json::<PredictionBundle>(&key).await {
            tracing::debug!(key, "prediction cache filled while waiting for lease");
            return Ok(bundle);
        }

        tracing::info!(key, "recomputing prediction bundle");
        let bundle = self.recompute(now).await?;
        self.store
            .set_json(&key, &bundle, self.settings.prediction_ttl)
            .await;
        Ok(bundle)
    }

    async fn recompute(&self, now: Timestamp) -> PulseResult<PredictionBundle> {
        let readings = self.recent_readings().await?;
        let bundle = tokio::time::timeout(
            self.settings.inference_timeout,
            self.engine.forecast(&readings, now),
        )
        .await
        .map_err(|_| {
            PulseError::Model(ModelError::Timeout {
                timeout: self.settings.inference_timeout,
            })
        })??;
        Ok(bundle)
    }

    async fn recent_readings(&self) -> PulseResult<Vec<SensorRecord>> {
        let window: Duration = self.settings.recent_window;
        let readings = tokio::time::timeout(
            self.settings.source_timeout,
            self.source.query_recent_window(window),
        )
        .await
        .map_err(|_| {
            PulseError::DataSource(pulse_core::DataSourceError::Timeout {
                timeout: self.settings.source_timeout,
            })
        })??;
        Ok(readings)
    }
}
