//! Gateway error taxonomy.
//!
//! # Propagation Policy
//! - Per-event failures (frame decode, webhook delivery) are contained at
//!   the event level: logged where they occur, never surfaced to a client.
//! - Session-level failures abort only their own session and are surfaced
//!   once, to whichever caller initiated it.
//! - The synchronous submission call surfaces exactly one of: success
//!   result, timeout, or a single upstream/dispatch error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced on the gateway HTTP surface.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required client parameter is absent or empty.
    #[error("Missing {0} parameter")]
    MissingParameter(&'static str),

    /// Could not open the upstream event stream, or it answered with a
    /// non-success status.
    #[error("upstream stream connection failed: {0}")]
    UpstreamConnectionFailure(String),

    /// The task-submission call to the backend failed or was rejected.
    #[error("upstream dispatch failed: {0}")]
    UpstreamDispatchFailure(String),

    /// No completion signal arrived within the deadline.
    #[error("Task timeout")]
    TaskTimeout,
}

impl GatewayError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamConnectionFailure(_) | GatewayError::UpstreamDispatchFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::TaskTimeout => StatusCode::REQUEST_TIMEOUT,
        }
    }

    /// Message exposed in the JSON error body. Upstream details stay in the
    /// logs; clients get a stable, opaque string.
    fn client_message(&self) -> String {
        match self {
            GatewayError::MissingParameter(param) => format!("Missing {param} parameter"),
            GatewayError::UpstreamConnectionFailure(_) | GatewayError::UpstreamDispatchFailure(_) => {
                "Failed to perform action".to_string()
            }
            GatewayError::TaskTimeout => "Task timeout".to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.client_message() }));
        (status, body).into_response()
    }
}
