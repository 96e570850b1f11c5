//! Error types for the relay

use std::net::SocketAddr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the relay
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Config {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("malformed {event} payload: {reason}")]
    MalformedEvent { event: String, reason: String },

    #[error("{0} can only be sent over a socket connection")]
    SocketOnly(&'static str),

    #[error("relay request failed: {0}")]
    Notify(#[from] reqwest::Error),
}

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_)
            | Self::UnknownEvent(_)
            | Self::MalformedEvent { .. }
            | Self::SocketOnly(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
