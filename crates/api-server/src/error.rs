//! HTTP error mapping
//!
//! Translates store-layer failures into HTTP responses at the endpoint
//! boundary: validation failures map to 400, missing records to 404, and
//! anything unexpected is logged and returned as an opaque 500 so internal
//! detail never reaches the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use tm_core::Error;

/// JSON body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error type returned by all route handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(message) => {
                tracing::warn!("Validation failed: {message}");
                Self::bad_request(message)
            }
            Error::TaskNotFound(id) => {
                tracing::warn!("Task {id} not found");
                Self::not_found(format!("Task {id} not found"))
            }
            other => {
                tracing::error!("Store operation failed: {other}");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}
