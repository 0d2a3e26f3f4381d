use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `CorsLayer`: permissive CORS, since beacons are embedded on
///    third-party pages.
/// 2. `TraceLayer`: structured request/response logging via `tracing`.
/// 3. `CompressionLayer`: gzip for the read API and dashboard assets.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/health", get(routes::health::health))
        .route("/api/track", post(routes::track::track))
        .route("/api/track-pixel", get(routes::pixels::track_pixel))
        .route("/api/ios-track", get(routes::pixels::ios_track))
        .route("/api/analytics", get(routes::analytics::list_visits))
        .route("/api/analytics/summary", get(routes::analytics::summary))
        .route("/dashboard", get(routes::dashboard::index))
        .route("/dashboard/{file}", get(routes::dashboard::asset))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
