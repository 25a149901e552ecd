use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::cache::CoordinatorError;

/// Error leaving the HTTP boundary. Always rendered as `{"error": "..."}`;
/// internal detail goes to the log, never into the body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Map a coordinator failure. Upstream and store failures collapse into
    /// a 500 carrying the endpoint's generic `failure` message.
    pub fn from_coordinator(err: CoordinatorError, failure: &'static str) -> Self {
        match err {
            CoordinatorError::InvalidRequest(msg) => Self::bad_request(msg),
            CoordinatorError::AssetNotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "Cryptocurrency not found")
            }
            CoordinatorError::Upstream(e) => {
                error!(error = %e, "{failure}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure)
            }
            CoordinatorError::Store(e) => {
                error!(error = %e, "{failure}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.message });
        (self.status, axum::Json(body)).into_response()
    }
}
