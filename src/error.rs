// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every error serializes as `{ "error": "<CODE>", "message": "..." }`, the
//! same shape the edge functions return, so the frontend can keep matching
//! on the code string.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("A request for this resource is already in progress")]
    RequestInProgress,

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Backend error (status {status:?}): {message}")]
    Backend {
        status: Option<u16>,
        message: String,
    },

    #[error("Backend request timed out")]
    Timeout,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub const MISSING_FIELDS: &'static str = "MISSING_FIELDS";
    pub const REQUEST_ERROR: &'static str = "REQUEST_ERROR";
    pub const UNAUTHORIZED: &'static str = "UNAUTHORIZED";
    pub const FORBIDDEN: &'static str = "FORBIDDEN";
    pub const NOT_FOUND: &'static str = "NOT_FOUND";
    pub const REQUEST_IN_PROGRESS: &'static str = "REQUEST_IN_PROGRESS";
    pub const RATE_LIMIT_EXCEEDED: &'static str = "RATE_LIMIT_EXCEEDED";
    pub const BACKEND_ERROR: &'static str = "BACKEND_ERROR";
    pub const TIMEOUT_ERROR: &'static str = "TIMEOUT_ERROR";
    pub const INTERNAL_ERROR: &'static str = "INTERNAL_ERROR";

    /// Build a backend error from a transport failure (no HTTP status).
    pub fn backend(message: impl Into<String>) -> Self {
        AppError::Backend {
            status: None,
            message: message.into(),
        }
    }

    /// Machine-readable code sent to the frontend.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => Self::UNAUTHORIZED,
            AppError::Forbidden(_) => Self::FORBIDDEN,
            AppError::NotFound(_) => Self::NOT_FOUND,
            AppError::BadRequest(_) => Self::REQUEST_ERROR,
            AppError::MissingFields(_) => Self::MISSING_FIELDS,
            AppError::RequestInProgress => Self::REQUEST_IN_PROGRESS,
            AppError::RateLimited(_) => Self::RATE_LIMIT_EXCEEDED,
            AppError::Backend { .. } => Self::BACKEND_ERROR,
            AppError::Timeout => Self::TIMEOUT_ERROR,
            AppError::Internal(_) => Self::INTERNAL_ERROR,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::MissingFields(_) => StatusCode::BAD_REQUEST,
            AppError::RequestInProgress => StatusCode::CONFLICT,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Backend { .. } => StatusCode::BAD_GATEWAY,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a repeated attempt could plausibly succeed.
    ///
    /// Timeouts, transport failures and 5xx/429 responses are transient;
    /// everything else (bad filters, constraint violations) is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Timeout => true,
            AppError::Backend { status: None, .. } => true,
            AppError::Backend {
                status: Some(code), ..
            } => *code >= 500 || *code == 429,
            _ => false,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, fields) = match &self {
            AppError::MissingFields(fields) => (self.to_string(), Some(fields.clone())),
            AppError::Backend { status, message } => {
                tracing::error!(status = ?status, error = %message, "Backend error");
                ("The data service returned an error".to_string(), None)
            }
            AppError::Timeout => {
                tracing::error!("Backend request timed out");
                (self.to_string(), None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                ("An unexpected error occurred".to_string(), None)
            }
            _ => (self.to_string(), None),
        };

        let body = ErrorResponse {
            error: code,
            message,
            fields,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
