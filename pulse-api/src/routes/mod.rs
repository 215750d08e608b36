//! REST API Routes Module
//!
//! Route handlers organized by concern:
//! - Sensor-data query and ingest under /api/v1/sensor-data
//! - Maintenance predictions under /api/v1/predictions
//! - Health check endpoints (Kubernetes-compatible) under /health
//! - CORS support for browser-based dashboards

pub mod health;
pub mod predictions;
pub mod sensor_data;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::state::AppState;

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete API router.
///
/// - /api/v1/sensor-data - cached query + ingest
/// - /api/v1/predictions - day-bucketed maintenance predictions
/// - /health/* - liveness and readiness (public)
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let api_routes = Router::new()
        .nest("/sensor-data", sensor_data::create_router(state.clone()))
        .nest("/predictions", predictions::create_router(state.clone()));

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health::create_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config))
}
