//! # Error Handling
//!
//! This module defines the error taxonomy for the ATC context API and how each
//! variant is converted into an HTTP response.
//!
//! ## Error Categories:
//! - **InvalidTimestamp**: The `timestamp` query parameter could not be parsed (400)
//! - **BadRequest**: Other malformed client input, e.g. an out-of-range window (400)
//! - **NotFound**: No audio file could be resolved for the requested instant (404)
//! - **TranscoderUnavailable**: The transcoder binary could not be launched (501)
//! - **ConfigError**: Configuration file or environment variable problems (500)
//! - **Internal**: Anything else that went wrong server-side (500)
//!
//! Note that a missing or unreadable individual snapshot file is *not* an error:
//! window assembly silently skips it (best-effort policy), so one corrupt file
//! cannot fail an otherwise-valid request.

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Custom error types for the application.
///
/// Each variant carries a human-readable message that ends up in the JSON
/// error envelope returned to the client.
#[derive(Debug)]
pub enum AppError {
    /// The timestamp query parameter was not an epoch integer or ISO-8601 string
    InvalidTimestamp(String),

    /// Client sent invalid or out-of-range data
    BadRequest(String),

    /// No audio file is resolvable for the requested instant
    NotFound(String),

    /// The transcoder subprocess could not be located or launched
    TranscoderUnavailable(String),

    /// Configuration file or environment variable problems
    ConfigError(String),

    /// Internal server errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidTimestamp(value) => write!(f, "Invalid timestamp format: {}", value),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::TranscoderUnavailable(msg) => write!(f, "Transcoder unavailable: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

/// Converts errors into HTTP responses with a consistent JSON structure:
///
/// ```json
/// {
///   "error": {
///     "type": "invalid_timestamp",
///     "message": "Invalid timestamp format: banana",
///     "timestamp": "2025-01-01T12:00:00Z"
///   }
/// }
/// ```
///
/// ## HTTP Status Code Mapping:
/// - InvalidTimestamp/BadRequest → 400 (Bad Request)
/// - NotFound → 404 (Not Found)
/// - TranscoderUnavailable → 501 (Not Implemented)
/// - ConfigError/Internal → 500 (Internal Server Error)
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_type, message) = match self {
            AppError::InvalidTimestamp(value) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "invalid_timestamp",
                format!("Invalid timestamp format: {}", value),
            ),
            AppError::BadRequest(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "bad_request",
                msg.clone(),
            ),
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "not_found",
                msg.clone(),
            ),
            AppError::TranscoderUnavailable(msg) => (
                actix_web::http::StatusCode::NOT_IMPLEMENTED,
                "transcoder_unavailable",
                msg.clone(),
            ),
            AppError::ConfigError(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                msg.clone(),
            ),
            AppError::Internal(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg.clone(),
            ),
        };

        HttpResponse::build(status).json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        }))
    }
}

// Required by `HttpResponse::streaming`, whose error type must box into a
// standard error
impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

/// Type alias for Results that use our custom error type.
pub type AppResult<T> = Result<T, AppError>;
