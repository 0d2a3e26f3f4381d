//! Ingestion path shared by the POST, pixel and iOS entry points.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};

use tally_core::visit::{NewVisit, TrackPayload, VisitContext};

use crate::{error::AppError, state::AppState};

/// The transport peer address, when the server was started with
/// `into_make_service_with_connect_info`. Absent under `oneshot` tests.
pub struct MaybeConnectInfo(pub Option<SocketAddr>);

impl<S> FromRequestParts<S> for MaybeConnectInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        ))
    }
}

/// Resolve the client IP: `X-Forwarded-For` (first entry), then `X-Real-IP`,
/// then the transport peer. Empty when none is available.
pub fn extract_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Collect the server-side inputs of a visit from the request.
pub fn visit_context(headers: &HeaderMap, peer: Option<SocketAddr>) -> VisitContext {
    let header_string = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    VisitContext {
        ip_address: extract_client_ip(headers, peer),
        user_agent: header_string(header::USER_AGENT),
        accept_language: header_string(header::ACCEPT_LANGUAGE),
    }
}

/// Validate, enrich and persist one visit. Returns the new row id.
pub async fn record_visit(
    state: &AppState,
    payload: TrackPayload,
    ctx: &VisitContext,
) -> Result<i64, AppError> {
    let geo = state.geo.lookup(&ctx.ip_address);
    let visit = NewVisit::build(payload, ctx, geo)?;
    let id = state.store.insert_visit(&visit).await?;
    Ok(id)
}

/// Fire-and-forget variant for beacons: the caller only wants its image back,
/// so failures are logged and swallowed.
pub async fn record_beacon(
    state: &AppState,
    payload: TrackPayload,
    ctx: &VisitContext,
    source: &'static str,
) {
    match record_visit(state, payload, ctx).await {
        Ok(id) => tracing::debug!(id, source, "Beacon recorded"),
        Err(AppError::Internal(e)) => {
            tracing::error!(source, error = %e, "Beacon insert failed; visit dropped")
        }
        Err(e) => tracing::warn!(source, error = %e, "Beacon rejected; visit dropped"),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn peer() -> Option<SocketAddr> {
        Some(SocketAddr::from(([192, 0, 2, 10], 54321)))
    }

    #[test]
    fn forwarded_for_first_entry_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(extract_client_ip(&headers, peer()), "203.0.113.1");
    }

    #[test]
    fn real_ip_is_second_choice() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(extract_client_ip(&headers, peer()), "198.51.100.2");
    }

    #[test]
    fn peer_address_is_last_resort() {
        assert_eq!(extract_client_ip(&HeaderMap::new(), peer()), "192.0.2.10");
        assert_eq!(extract_client_ip(&HeaderMap::new(), None), "");
    }

    #[test]
    fn blank_forwarded_for_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" "));
        assert_eq!(extract_client_ip(&headers, peer()), "192.0.2.10");
    }

    #[test]
    fn visit_context_reads_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.4.0"));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB"));
        let ctx = visit_context(&headers, None);
        assert_eq!(ctx.user_agent.as_deref(), Some("curl/8.4.0"));
        assert_eq!(ctx.accept_language.as_deref(), Some("en-GB"));
        assert_eq!(ctx.ip_address, "");
    }
}
