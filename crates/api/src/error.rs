//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CheckoutError, ErrorCategory};

/// API-level error type that maps to HTTP responses.
///
/// Every response body carries a stable human-readable `error` message
/// and a machine-checkable `category`; storage error details never reach
/// the client.
#[derive(Debug)]
pub enum ApiError {
    /// The caller identity header is missing or malformed.
    Unauthorized,
    /// Bad request from the client.
    BadRequest(String),
    /// Resource not found.
    NotFound(String),
    /// A checkout-layer failure.
    Checkout(CheckoutError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, category, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorCategory::Validation,
                "Missing or invalid X-User-Id header".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCategory::Validation, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCategory::NotFound, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
        };

        let body = serde_json::json!({
            "error": message,
            "category": category.as_str(),
        });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, ErrorCategory, String) {
    let category = err.category();
    let (status, message) = match category {
        ErrorCategory::Validation => (StatusCode::BAD_REQUEST, err.to_string()),
        ErrorCategory::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        ErrorCategory::Conflict => (StatusCode::CONFLICT, err.to_string()),
        ErrorCategory::Internal => {
            tracing::error!(error = %err, "internal error while handling request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    };
    (status, category, message)
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}
