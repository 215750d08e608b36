//! Maintenance-prediction endpoint.
//!
//! Serves the current day-bucket's prediction bundle. A cold bucket
//! triggers exactly one recompute no matter how many requests arrive at
//! once; everything else in the request path is a cache read.

use axum::{extract::State, routing::get, Json, Router};

use pulse_core::PredictionBundle;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/v1/predictions - Current day's maintenance predictions.
pub async fn get_predictions(State(state): State<AppState>) -> ApiResult<Json<PredictionBundle>> {
    let bundle = state.prediction_cache.get_predictions().await?;
    Ok(Json(bundle))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_predictions))
        .with_state(state)
}
