use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use tally_core::{summary::DashboardSummary, visit::VisitRecord};

use crate::{auth::authorize_read, error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub limit: Option<usize>,
}

/// `GET /api/analytics`: most recent visits, newest first.
///
/// At most `config.analytics_limit` rows; `?limit=` can only narrow that.
/// An empty store yields `[]`.
#[tracing::instrument(skip(state, headers, query))]
pub async fn list_visits(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> Result<Json<Vec<VisitRecord>>, AppError> {
    authorize_read(&headers, &state.config.auth_mode)?;
    let Query(params) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let limit = state.config.clamp_limit(params.limit);
    let visits = state.store.recent_visits(limit).await?;
    Ok(Json(visits))
}

/// `GET /api/analytics/summary`: dashboard aggregates over the same window
/// `/api/analytics` serves.
#[tracing::instrument(skip(state, headers))]
pub async fn summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardSummary>, AppError> {
    authorize_read(&headers, &state.config.auth_mode)?;

    let visits = state
        .store
        .recent_visits(state.config.analytics_limit)
        .await?;
    Ok(Json(DashboardSummary::from_visits(&visits)))
}
