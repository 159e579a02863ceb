//! Hub error types with HTTP status code mapping.
//!
//! [`HubError`] is the central error type. Matching itself never fails
//! (every problem there is a non-match); errors only surface when building
//! pools, attaching clients or serving HTTP requests.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::SubscriberId;
use crate::matcher::SpecError;

/// Structured JSON error response body.
///
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid match specification: malformed JSON: ..."
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// | Range     | Category   | HTTP Status        |
/// |-----------|------------|--------------------|
/// | 1000–1999 | Validation | 400 Bad Request    |
/// | 2000–2999 | State      | 409 Conflict       |
/// | 3000–3999 | Server     | 500 Internal Error |
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The match specification could not be compiled.
    #[error("invalid match specification: {0}")]
    InvalidSpec(#[from] SpecError),

    /// Request parameters failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The pool has already terminated.
    #[error("client pool {0} is closed")]
    PoolClosed(SubscriberId),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidSpec(_) => 1001,
            Self::InvalidRequest(_) => 1002,
            Self::PoolClosed(_) => 2001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSpec(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PoolClosed(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
