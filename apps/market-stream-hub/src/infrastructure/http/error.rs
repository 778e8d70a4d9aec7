//! REST error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::application::services::ServiceError;

/// Error returned by REST handlers, rendered as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Bad request input. The message is shown to the caller.
    #[error("{0}")]
    BadRequest(String),

    /// Upstream failure. Only the route's generic message is shown.
    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Map a service error, hiding upstream details behind `message`.
    pub fn from_service(err: ServiceError, message: &'static str) -> Self {
        match err {
            ServiceError::Validation(reason) => Self::BadRequest(reason),
            ServiceError::Upstream(source) => {
                tracing::warn!(error = %source, "{message}");
                Self::Internal(message)
            }
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ProviderError;

    #[test]
    fn validation_maps_to_bad_request_with_reason() {
        let err = ApiError::from_service(
            ServiceError::Validation("symbol is required".to_string()),
            "Failed to fetch stock data",
        );

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "symbol is required");
    }

    #[test]
    fn upstream_maps_to_generic_500() {
        let err = ApiError::from_service(
            ServiceError::Upstream(ProviderError::RateLimited),
            "Failed to fetch stock data",
        );

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to fetch stock data");
    }
}
