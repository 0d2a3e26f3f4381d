use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::state::AppState;

/// `GET /health` and `GET /api/health`: liveness check.
///
/// Returns `200 OK` when the store answers a trivial round-trip.
/// Returns `503 Service Unavailable` with `"status": "degraded"` when it does not.
///
/// Response shape:
/// ```json
/// { "status": "ok", "timestamp": "2024-01-01T00:00:00.000Z", "version": "0.1.0" }
/// ```
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": timestamp,
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check: store unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": timestamp,
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
    }
}
