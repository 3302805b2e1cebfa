//! RequestTelemetry - per-request access log and path counting
//!
//! Runs ahead of every route, authenticated or not. Only routed paths are
//! counted, so unknown paths cannot grow the counters.

use crate::state::AppState;
use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Client address as seen by the socket, if the server was started with
/// connect info
fn peer_addr(request: &Request) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// Route template the request matched, `None` for unrouted paths
fn routed_path(request: &Request) -> Option<String> {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
}

fn forwarded_for(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Access log plus metrics recording
pub async fn record_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let peer = peer_addr(&request)
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    match forwarded_for(request.headers()) {
        Some(forwarded) => {
            tracing::info!(ip = %peer, forwarded_for = %forwarded, path = %path, "Request")
        }
        None => tracing::info!(ip = %peer, path = %path, "Request"),
    }

    if state.config.metrics_enabled {
        match routed_path(&request) {
            Some(route) => state.store.record_metrics(&route).await,
            None => tracing::debug!(path = %path, "Unrouted path not counted"),
        }
    }

    next.run(request).await
}
