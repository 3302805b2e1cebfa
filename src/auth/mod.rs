//! AuthGuard - shared secret verification
//!
//! The secret is accepted from four places, checked in this order:
//!
//! 1. JSON body field `secret`
//! 2. Query parameter `secret`
//! 3. Header `Sleepy-Secret: <secret>`
//! 4. Header `Authorization: Bearer <secret>`
//!
//! The first match wins. An absent or non-Bearer `Authorization` header is a
//! plain non-match.

use crate::error::{Error, Result};
use crate::state::AppState;
use axum::{
    body::{to_bytes, Body},
    extract::{Query, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::collections::HashMap;

/// Largest request body buffered while looking for a `secret` field
const MAX_BODY_BYTES: usize = 1024 * 1024;

const SECRET_HEADER: &str = "sleepy-secret";
const BEARER_PREFIX: &str = "Bearer ";

/// Where a valid secret was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Body,
    Query,
    Header,
    Authorization,
}

impl SecretSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Query => "query",
            Self::Header => "header (Sleepy-Secret)",
            Self::Authorization => "header (Authorization)",
        }
    }
}

/// Check `expected` against the four channels in order
pub fn verify_secret(
    expected: &str,
    body: Option<&Value>,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<SecretSource> {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if body.and_then(|b| b.get("secret")).and_then(Value::as_str) == Some(expected) {
        return Ok(SecretSource::Body);
    }

    if query.get("secret").map(String::as_str) == Some(expected) {
        return Ok(SecretSource::Query);
    }

    if header_str(SECRET_HEADER) == Some(expected) {
        return Ok(SecretSource::Header);
    }

    let bearer = header_str(axum::http::header::AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX));
    if bearer == Some(expected) {
        return Ok(SecretSource::Authorization);
    }

    Err(Error::Unauthorized)
}

/// Middleware guarding mutating routes
///
/// The body is buffered so the `secret` field can be read, then handed on
/// unchanged to the handler.
pub async fn require_secret(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return Error::BadRequest(format!("cannot read request body: {}", e)).into_response()
        }
    };

    let json: Option<Value> = if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(&bytes).ok()
    };
    let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(q)| q)
        .unwrap_or_default();

    match verify_secret(&state.config.secret, json.as_ref(), &query, &parts.headers) {
        Ok(source) => {
            tracing::debug!(source = source.as_str(), "[Auth] Verify secret success");
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(e) => {
            tracing::debug!(path = %parts.uri.path(), "[Auth] Verify secret failed");
            e.into_response()
        }
    }
}
