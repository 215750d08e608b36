//! Shared application state for API handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use pulse_cache::{
    CacheBackend, CacheStore, MemoryBackend, PredictionCache, QueryCache, RedisBackend,
};
use pulse_core::CacheError;

use crate::config::ApiConfig;
use crate::db::SensorDb;
use crate::error::{ApiError, ApiResult};
use crate::model::ModelHandle;

// ============================================================================
// BACKEND SELECTION
// ============================================================================

/// Cache backend chosen at startup: Redis when `PULSE_REDIS_URL` is set,
/// otherwise the in-process store.
pub enum ApiBackend {
    Redis(RedisBackend),
    Memory(MemoryBackend),
}

impl ApiBackend {
    /// Connect to the configured backend.
    pub async fn connect(config: &ApiConfig) -> ApiResult<Self> {
        match &config.redis_url {
            Some(url) => {
                let backend = RedisBackend::connect(url).await.map_err(|e| {
                    ApiError::internal_error(format!("Failed to connect to Redis: {}", e))
                })?;
                tracing::info!("cache backend: redis");
                Ok(Self::Redis(backend))
            }
            None => {
                tracing::info!("cache backend: in-process memory");
                Ok(Self::Memory(MemoryBackend::new()))
            }
        }
    }
}

#[async_trait]
impl CacheBackend for ApiBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self {
            Self::Redis(b) => b.get(key).await,
            Self::Memory(b) => b.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        match self {
            Self::Redis(b) => b.set(key, value, ttl).await,
            Self::Memory(b) => b.set(key, value, ttl).await,
        }
    }

    async fn ping(&self) -> Result<(), CacheError> {
        match self {
            Self::Redis(b) => b.ping().await,
            Self::Memory(b) => b.ping().await,
        }
    }
}

/// Query cache as wired by the service.
pub type ApiQueryCache = QueryCache<ApiBackend, SensorDb>;

/// Prediction cache as wired by the service.
pub type ApiPredictionCache = PredictionCache<ApiBackend, SensorDb, ModelHandle>;

// ============================================================================
// APPLICATION STATE
// ============================================================================

/// Shared state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Source-of-truth client, used directly by ingestion and health.
    pub db: SensorDb,

    /// Read-through cache over sensor-data queries.
    pub query_cache: Arc<ApiQueryCache>,

    /// Day-bucketed prediction cache.
    pub prediction_cache: Arc<ApiPredictionCache>,

    /// Store handle for health-check pings.
    pub cache_store: CacheStore<ApiBackend>,

    /// Whether a model artifact was loaded at startup.
    pub model_loaded: bool,

    /// Server start time for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    /// Wire the state from its components.
    pub fn new(db: SensorDb, backend: ApiBackend, model: ModelHandle, config: &ApiConfig) -> Self {
        let backend = Arc::new(backend);
        let store = CacheStore::new(Arc::clone(&backend));
        let source = Arc::new(db.clone());
        let model_loaded = model.is_loaded();
        let model = Arc::new(model);

        let query_cache = Arc::new(QueryCache::new(
            store.clone(),
            Arc::clone(&source),
            config.cache.clone(),
        ));
        let prediction_cache = Arc::new(PredictionCache::new(
            store.clone(),
            source,
            model,
            config.cache.clone(),
        ));

        Self {
            db,
            query_cache,
            prediction_cache,
            cache_store: store,
            model_loaded,
            start_time: Instant::now(),
        }
    }

    /// Server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
