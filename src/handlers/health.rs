use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

use crate::state::AppState;
use crate::storage;

type ApiResponse = (StatusCode, Json<Value>);

pub async fn health_handler(State(state): State<AppState>) -> ApiResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": true, "status": "ok" })),
        ),
        Err(err) => {
            error!("Database health check failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Database unavailable" })),
            )
        }
    }
}

pub async fn storage_health_handler() -> ApiResponse {
    match storage::storage_round_trip_probe().await {
        Ok(probe_url) => (
            StatusCode::OK,
            Json(json!({ "success": true, "probeUrl": probe_url })),
        ),
        Err(err) => {
            error!("Storage health check failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": err.to_string() })),
            )
        }
    }
}
