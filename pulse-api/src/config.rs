//! API Configuration Module
//!
//! Service-level configuration loaded from environment variables with
//! sensible defaults for development: bind address, CORS, cache backend
//! selection, cache timing overrides, and the model artifact path.

use std::time::Duration;

use pulse_cache::CacheSettings;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// Service configuration for the PULSE API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Redis connection URL. `None` selects the in-process cache backend.
    pub redis_url: Option<String>,

    /// Path to the trained model artifact.
    pub model_path: String,

    /// Timing knobs for the cache layer.
    pub cache: CacheSettings,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8001".to_string(),
            cors_origins: Vec::new(), // Empty = allow all
            cors_max_age_secs: 86400,
            redis_url: None,
            model_path: "model/maintenance_model.json".to_string(),
            cache: CacheSettings::default(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PULSE_BIND_ADDR`: Listener address (default: 0.0.0.0:8001)
    /// - `PULSE_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `PULSE_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `PULSE_REDIS_URL`: Redis URL; unset selects the in-process backend
    /// - `PULSE_MODEL_PATH`: Model artifact path (default: model/maintenance_model.json)
    /// - `PULSE_QUERY_TTL_SECS`: Query cache TTL (default: 60)
    /// - `PULSE_PREDICTION_TTL_SECS`: Prediction cache TTL (default: 86400)
    /// - `PULSE_RECENT_WINDOW_SECS`: Recompute input window (default: 3600)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr =
            std::env::var("PULSE_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let cors_origins = std::env::var("PULSE_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = std::env::var("PULSE_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let redis_url = std::env::var("PULSE_REDIS_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let model_path =
            std::env::var("PULSE_MODEL_PATH").unwrap_or(defaults.model_path);

        let mut cache = CacheSettings::default();
        if let Some(secs) = env_secs("PULSE_QUERY_TTL_SECS") {
            cache = cache.with_query_ttl(secs);
        }
        if let Some(secs) = env_secs("PULSE_PREDICTION_TTL_SECS") {
            cache = cache.with_prediction_ttl(secs);
        }
        if let Some(secs) = env_secs("PULSE_RECENT_WINDOW_SECS") {
            cache = cache.with_recent_window(secs);
        }

        Self {
            bind_addr,
            cors_origins,
            cors_max_age_secs,
            redis_url,
            model_path,
            cache,
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8001");
        assert!(config.cors_origins.is_empty());
        assert!(config.redis_url.is_none());
        assert_eq!(config.cache.query_ttl, Duration::from_secs(60));
        assert_eq!(config.cache.prediction_ttl, Duration::from_secs(86400));
    }

    #[test]
    fn production_means_explicit_origins() {
        let mut config = ApiConfig::default();
        assert!(!config.is_production());

        config.cors_origins = vec!["https://pulse.example.com".to_string()];
        assert!(config.is_production());
    }
}
