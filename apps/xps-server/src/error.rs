//! Error types for the XPS server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::convert::Operation;
use crate::document::DocumentError;

/// Request-level error type
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request is malformed or names something unsupported
    #[error("{0}")]
    Validation(String),

    /// The document pipeline failed
    #[error("{}: {}", .operation.failure_prefix(), .source)]
    Backend {
        operation: Operation,
        source: DocumentError,
    },

    /// The upload could not be written to scratch storage
    #[error("{}: {}", .operation.failure_prefix(), .source)]
    Storage {
        operation: Operation,
        source: std::io::Error,
    },

    /// The blocking job could not run or panicked
    #[error("{}: {}", .operation.failure_prefix(), .message)]
    Worker { operation: Operation, message: String },
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "bad_request",
            ServiceError::Backend { .. } => "conversion_error",
            ServiceError::Storage { .. } => "storage_error",
            ServiceError::Worker { .. } => "internal_error",
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    detail: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();

        match &self {
            ServiceError::Validation(_) => tracing::debug!("Rejected request: {}", detail),
            ServiceError::Backend { operation, .. }
            | ServiceError::Storage { operation, .. }
            | ServiceError::Worker { operation, .. } => {
                tracing::error!("{} failed: {}", operation, detail)
            }
        }

        let body = ErrorResponse {
            error: self.code(),
            detail,
        };
        (status, Json(body)).into_response()
    }
}
