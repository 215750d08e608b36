//! PULSE API Server Entry Point
//!
//! Bootstraps configuration, connects the cache backend, loads the model
//! artifact, and starts the Axum HTTP server.

use std::net::SocketAddr;

use axum::Router;
use tracing_subscriber::EnvFilter;

use pulse_api::{
    create_api_router, ApiBackend, ApiConfig, ApiError, ApiResult, AppState, DbConfig, ModelHandle,
    SensorDb,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::from_env();

    let db_config = DbConfig::from_env();
    let db = SensorDb::from_config(&db_config)?;

    let backend = ApiBackend::connect(&config).await?;
    let model = ModelHandle::load(&config.model_path)
        .map_err(|e| ApiError::internal_error(format!("Failed to load model artifact: {}", e)))?;

    let state = AppState::new(db, backend, model, &config);
    let app: Router = create_api_router(state, &config);

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        ApiError::invalid_input(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;
    tracing::info!(%addr, "Starting PULSE API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
