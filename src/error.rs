//! Error handling for the status server
//!
//! Every request-scoped failure is rendered as the uniform envelope
//! `{"success": false, "code": ..., "message": ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Shared secret missing or wrong
    #[error("wrong secret")]
    Unauthorized,

    /// Missing or mistyped parameters
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed boolean-typed argument
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Push or actuator call failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wire code of the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthorized => "not authorized",
            Error::BadRequest(_) => "bad request",
            Error::NotFound(_) => "not found",
            Error::InvalidRequest(_) => "invalid request",
            Error::Upstream(_) | Error::Http(_) => "upstream error",
            Error::Config(_) => "config error",
            Error::Serialization(_) | Error::Io(_) | Error::Internal(_) => "exception",
        }
    }

    /// HTTP status of the error envelope
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::BadRequest(_) | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Upstream(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) | Error::Serialization(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Human-readable message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            Error::Unauthorized => "wrong secret".to_string(),
            Error::BadRequest(msg)
            | Error::NotFound(msg)
            | Error::InvalidRequest(msg)
            | Error::Upstream(msg)
            | Error::Config(msg)
            | Error::Internal(msg) => msg.clone(),
            Error::Http(e) => e.to_string(),
            Error::Serialization(e) => e.to_string(),
            Error::Io(e) => e.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error_code = %code,
                message = %message,
                "Request error"
            );
        } else {
            tracing::debug!(
                status = %status,
                error_code = %code,
                message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "success": false,
            "code": code,
            "message": message
        }));

        (status, body).into_response()
    }
}
