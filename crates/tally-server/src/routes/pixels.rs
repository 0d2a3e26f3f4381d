use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use tally_core::visit::{TrackPayload, IOS_EVENT_TYPE};

use crate::{
    routes::ingest::{self, MaybeConnectInfo},
    state::AppState,
};

/// 1×1 transparent GIF89a served by every beacon endpoint.
pub const TRANSPARENT_GIF: &[u8] = &[
    71, 73, 70, 56, 57, 97, 1, 0, 1, 0, 128, 0, 0, 0, 0, 0, 255, 255, 255, 33, 249, 4, 1, 0, 0, 0,
    0, 44, 0, 0, 0, 0, 1, 0, 1, 0, 0, 2, 2, 68, 1, 0, 59,
];

/// `GET /api/track-pixel`: image beacon.
///
/// Fields come from the `data` query parameter (URL-encoded JSON object).
/// When `data` is absent or does not decode to an object, the raw query
/// pairs are used instead. The GIF is returned whatever happens to the insert.
#[tracing::instrument(skip_all)]
pub async fn track_pixel(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    connect_info: MaybeConnectInfo,
    headers: HeaderMap,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let payload = pixel_payload(&query);
    let ctx = ingest::visit_context(&headers, connect_info.0);

    ingest::record_beacon(&state, payload, &ctx, "pixel").await;
    gif_response()
}

/// `GET /api/ios-track`: image beacon for the iOS app.
///
/// Reads `vid`, `url`, `w` and `h` from the query string. The timestamp is
/// always generated here and `event_type` is always `ios_visit`.
#[tracing::instrument(skip_all)]
pub async fn ios_track(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    connect_info: MaybeConnectInfo,
    headers: HeaderMap,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let referrer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let payload = ios_payload(&query, referrer);
    let ctx = ingest::visit_context(&headers, connect_info.0);

    ingest::record_beacon(&state, payload, &ctx, "ios").await;
    gif_response()
}

fn pixel_payload(query: &HashMap<String, String>) -> TrackPayload {
    query
        .get("data")
        .and_then(|raw| match serde_json::from_str::<Value>(raw) {
            Ok(value) => TrackPayload::from_value(value),
            Err(e) => {
                tracing::debug!(error = %e, "Undecodable pixel data; using raw query");
                None
            }
        })
        .unwrap_or_else(|| TrackPayload::from_query(query))
}

fn ios_payload(query: &HashMap<String, String>, referrer: Option<String>) -> TrackPayload {
    let dimension = |key: &str| query.get(key).and_then(|v| v.trim().parse::<i64>().ok());

    TrackPayload {
        visitor_id: query.get("vid").cloned(),
        timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        url: query.get("url").cloned(),
        referrer,
        screen_width: dimension("w"),
        screen_height: dimension("h"),
        event_type: Some(IOS_EVENT_TYPE.to_string()),
        ..Default::default()
    }
}

fn gif_response() -> Response {
    let mut response = Response::new(axum::body::Body::from(TRANSPARENT_GIF));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/gif"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}
