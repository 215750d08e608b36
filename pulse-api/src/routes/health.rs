//! Health Check Endpoints
//!
//! Kubernetes-compatible health checks:
//! - /health/ping - Simple liveness check
//! - /health/live - Process alive check
//! - /health/ready - Database and cache connectivity check
//!
//! Readiness degrades rather than fails when only the cache backend is
//! down: the service still serves every endpoint straight from the
//! source-of-truth in that state.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDetails {
    pub database: ComponentHealth,
    pub cache: ComponentHealth,
    pub model_loaded: bool,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn from_check(result: Result<u64, String>) -> Self {
        match result {
            Ok(latency) => Self {
                status: HealthStatus::Healthy,
                latency_ms: Some(latency),
                error: None,
            },
            Err(e) => Self {
                status: HealthStatus::Unhealthy,
                latency_ms: None,
                error: Some(e),
            },
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping - Simple pong response
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
pub async fn liveness() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    };
    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Readiness check (database and cache connectivity)
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let db_health = ComponentHealth::from_check(check_database(&state).await);
    let cache_health = ComponentHealth::from_check(check_cache(&state).await);

    // No database means not ready; a dead cache only degrades.
    let overall_status = if db_health.status != HealthStatus::Healthy {
        HealthStatus::Unhealthy
    } else if cache_health.status != HealthStatus::Healthy {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let response = HealthResponse {
        status: overall_status,
        message: None,
        details: Some(HealthDetails {
            database: db_health,
            cache: cache_health,
            model_loaded: state.model_loaded,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.uptime_secs(),
        }),
    };

    let status_code = if overall_status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}

async fn check_database(state: &AppState) -> Result<u64, String> {
    let start = std::time::Instant::now();
    match state.db.ping().await {
        Ok(_) => Ok(start.elapsed().as_millis() as u64),
        Err(e) => Err(format!("Database check failed: {}", e)),
    }
}

async fn check_cache(state: &AppState) -> Result<u64, String> {
    let start = std::time::Instant::now();
    match state.cache_store.ping().await {
        Ok(_) => Ok(start.elapsed().as_millis() as u64),
        Err(e) => Err(format!("Cache check failed: {}", e)),
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create health check router (no auth required)
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .with_state(state)
}
