//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fulfillment::FulfillmentError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed path or body the service never saw.
    BadRequest(String),
    Fulfillment(FulfillmentError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Fulfillment(err) => match err {
                FulfillmentError::NotFound(_) => StatusCode::NOT_FOUND,
                FulfillmentError::Unauthorized(_) => StatusCode::FORBIDDEN,
                FulfillmentError::InsufficientStock { .. } => StatusCode::CONFLICT,
                FulfillmentError::InvalidTransition { .. } => StatusCode::CONFLICT,
                FulfillmentError::Validation(_) => StatusCode::BAD_REQUEST,
                FulfillmentError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Fulfillment(err) => {
                if status.is_server_error() {
                    tracing::error!(error = %err, "internal server error");
                }
                err.to_string()
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}
