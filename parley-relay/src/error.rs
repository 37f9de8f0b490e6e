//! Error types for the relay's HTTP routes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Errors returned by administrative routes.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

// Shared errors only arise from rejected client input.
impl From<parley_common::Error> for RelayError {
    fn from(err: parley_common::Error) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            RelayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            RelayError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        };

        let body = serde_json::json!({
            "success": false,
            "error": ApiError {
                code: code.to_string(),
                message: self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_common::Error;

    #[test]
    fn test_error_display() {
        let err = RelayError::InvalidRequest("max_tokens must be greater than 0".into());
        assert_eq!(
            err.to_string(),
            "Invalid request: max_tokens must be greater than 0"
        );
    }

    #[test]
    fn test_from_common_error() {
        let err: RelayError = Error::InvalidInput("empty".into()).into();
        assert!(matches!(err, RelayError::InvalidRequest(_)));
        assert_eq!(err.to_string(), "Invalid request: Invalid input: empty");
    }

    #[test]
    fn test_error_into_response() {
        let response = RelayError::InvalidRequest("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = RelayError::Unauthorized("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
