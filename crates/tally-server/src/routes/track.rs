use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::HeaderMap, response::IntoResponse, Json};
use serde_json::{json, Value};

use tally_core::visit::TrackPayload;

use crate::{
    error::AppError,
    routes::ingest::{self, MaybeConnectInfo},
    state::AppState,
};

/// `POST /api/track`: record one visit from a JSON body.
///
/// ## Validation
/// `visitor_id` and `timestamp` are required; missing or blank values return
/// `400 validation_error` and nothing is stored. A body that is not a JSON
/// object returns `400 bad_request`.
///
/// ## Enrichment
/// `ip_address` comes from proxy headers or the socket, never from the body.
/// Geo, device type and language are derived server-side.
///
/// ## Response
/// `200 OK` with `{ "success": true, "id": <row id> }`; `500` if the insert fails.
#[tracing::instrument(skip(state, connect_info, headers, body))]
pub async fn track(
    State(state): State<Arc<AppState>>,
    connect_info: MaybeConnectInfo,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))?;
    let payload = TrackPayload::from_value(value)
        .ok_or_else(|| AppError::BadRequest("body must be a JSON object".to_string()))?;

    let ctx = ingest::visit_context(&headers, connect_info.0);
    let id = ingest::record_visit(&state, payload, &ctx).await?;

    Ok(Json(json!({ "success": true, "id": id })))
}
