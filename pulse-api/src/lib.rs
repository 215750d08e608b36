//! PULSE API - REST layer and composition root
//!
//! Wires the cache layer over a PostgreSQL source-of-truth and a loaded
//! model artifact, and exposes:
//! - GET/POST /api/v1/sensor-data - cached sensor queries and ingest
//! - GET /api/v1/predictions - day-bucketed maintenance predictions
//! - /health/* - Kubernetes-compatible health checks

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use db::{DbConfig, SensorDb};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use model::{LinearModel, ModelHandle};
pub use routes::create_api_router;
pub use state::{ApiBackend, AppState};
