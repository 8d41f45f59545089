use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::errors::GenerationError;

const INTERNAL_ERROR: &str = "Internal server error";
const PAYLOAD_TOO_LARGE: &str = "Request body too large";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        AppError::Unexpected(message.into())
    }

    /// Classify an axum body rejection: over-limit bodies become
    /// [`AppError::PayloadTooLarge`], anything else a validation error.
    pub fn from_body_rejection(status: StatusCode, detail: String, fallback: &str) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(detail)
        } else {
            AppError::validation(format!("{fallback}: {detail}"))
        }
    }
}

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            path: None,
        }
    }
}

/// An [`AppError`] on its way out of a handler, with the summary shown to
/// callers when the failure is not a validation error.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    summary: &'static str,
}

impl ApiError {
    pub fn context(mut self, summary: &'static str) -> Self {
        self.summary = summary;
        self
    }

    pub fn status(&self) -> StatusCode {
        match self.error {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Generation(_) | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorResponse {
        match &self.error {
            AppError::Validation(message) => ErrorResponse::new(message.clone()),
            AppError::PayloadTooLarge(detail) => ErrorResponse {
                message: Some(detail.clone()),
                ..ErrorResponse::new(PAYLOAD_TOO_LARGE)
            },
            other => ErrorResponse {
                message: Some(other.to_string()),
                ..ErrorResponse::new(self.summary)
            },
        }
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self {
            error,
            summary: INTERNAL_ERROR,
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(error: GenerationError) -> Self {
        AppError::from(error).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self.error {
            AppError::Validation(message) | AppError::PayloadTooLarge(message) => {
                warn!(%message, "rejected request");
            }
            other => error!(error = %other, summary = self.summary, "request failed"),
        }
        (status, Json(self.body())).into_response()
    }
}
