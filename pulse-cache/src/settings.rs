//! Tunable settings for the cache layer.

use std::time::Duration;

/// Configuration for both cache tiers and the forecast grid.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// TTL for primary query results.
    pub query_ttl: Duration,
    /// TTL for derived prediction bundles (one calendar-day bucket).
    pub prediction_ttl: Duration,
    /// How far back to pull raw readings when recomputing predictions.
    pub recent_window: Duration,
    /// Bound on any single source-of-truth query.
    pub source_timeout: Duration,
    /// Bound on one full model-inference pass (all groups, all points).
    pub inference_timeout: Duration,
    /// Number of forecast points per group.
    pub forecast_points: u32,
    /// Spacing between forecast points.
    pub forecast_step: Duration,
    /// How many forecast points the served timeline keeps.
    pub timeline_len: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            query_ttl: Duration::from_secs(60),
            prediction_ttl: Duration::from_secs(24 * 60 * 60),
            recent_window: Duration::from_secs(60 * 60),
            source_timeout: Duration::from_secs(10),
            inference_timeout: Duration::from_secs(30),
            forecast_points: 24,
            forecast_step: Duration::from_secs(60 * 60),
            timeline_len: 6,
        }
    }
}

impl CacheSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query_ttl(mut self, ttl: Duration) -> Self {
        self.query_ttl = ttl;
        self
    }

    pub fn with_prediction_ttl(mut self, ttl: Duration) -> Self {
        self.prediction_ttl = ttl;
        self
    }

    pub fn with_recent_window(mut self, window: Duration) -> Self {
        self.recent_window = window;
        self
    }

    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    pub fn with_inference_timeout(mut self, timeout: Duration) -> Self {
        self.inference_timeout = timeout;
        self
    }

    pub fn with_forecast_grid(mut self, points: u32, step: Duration) -> Self {
        self.forecast_points = points;
        self.forecast_step = step;
        self
    }

    pub fn with_timeline_len(mut self, len: usize) -> Self {
        self.timeline_len = len;
        self
    }
}
