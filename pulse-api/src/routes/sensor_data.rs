//! Sensor-data endpoints.
//!
//! GET serves readings through the read-through query cache; POST writes
//! straight to the source-of-truth. Writes do not invalidate cached query
//! results: the 60 s TTL bounds their staleness.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pulse_cache::SensorSource;
use pulse_core::{QueryParams, SensorRecord, Timestamp};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

const DEFAULT_LIMIT: i64 = 1000;

/// Raw query-string parameters, validated into [`QueryParams`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SensorDataQuery {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SensorDataQuery {
    fn into_params(self) -> ApiResult<QueryParams> {
        let start = parse_timestamp("start_time", self.start_time)?;
        let end = parse_timestamp("end_time", self.end_time)?;
        let params = QueryParams::new(
            start,
            end,
            self.limit.unwrap_or(DEFAULT_LIMIT),
            self.offset.unwrap_or(0),
        )?;
        Ok(params)
    }
}

fn parse_timestamp(field: &'static str, raw: Option<String>) -> ApiResult<Option<Timestamp>> {
    match raw {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| {
                ApiError::invalid_input(format!(
                    "{} must be an RFC 3339 timestamp, got '{}'",
                    field, s
                ))
            }),
    }
}

/// Response body for GET /api/v1/sensor-data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorDataResponse {
    pub message: String,
    pub data: Vec<SensorRecord>,
}

/// Response body for POST /api/v1/sensor-data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub message: String,
    pub inserted: u64,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /api/v1/sensor-data - Query readings through the cache.
pub async fn get_sensor_data(
    State(state): State<AppState>,
    Query(query): Query<SensorDataQuery>,
) -> ApiResult<Json<SensorDataResponse>> {
    let params = query.into_params()?;
    let data = state.query_cache.fetch(&params).await?;
    Ok(Json(SensorDataResponse {
        message: "Data retrieved successfully".to_string(),
        data,
    }))
}

/// POST /api/v1/sensor-data - Ingest a batch of readings.
pub async fn ingest_sensor_data(
    State(state): State<AppState>,
    Json(records): Json<Vec<SensorRecord>>,
) -> ApiResult<impl IntoResponse> {
    if records.is_empty() {
        return Err(ApiError::invalid_input("Request body contains no records"));
    }
    let inserted = state.db.insert_records(&records).await?;
    tracing::info!(inserted, "ingested sensor records");
    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            message: "Data stored successfully".to_string(),
            inserted,
        }),
    ))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_sensor_data).post(ingest_sensor_data))
        .with_state(state)
}
