//! HTTP Error Types
//!
//! Maps application errors to status codes and JSON error bodies.

use crate::types::{ErrorBody, FieldError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use ytflow_core::error::AppError;

/// Body text of every 500
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Job not found")]
    NotFound,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert AppError to an HTTP error
///
/// Client errors are raised by the handlers themselves; whatever reaches
/// this point is a 500. Details are logged and never sent to the client.
pub fn to_http_error(err: AppError) -> ApiError {
    tracing::error!(error = %err, retryable = err.is_retryable(), "Request failed");
    ApiError::Internal
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        to_http_error(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.to_string();
        let details = match self {
            ApiError::Validation(details) => details,
            _ => Vec::new(),
        };

        (status, Json(ErrorBody { error, details })).into_response()
    }
}
