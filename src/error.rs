//! Error types for dvorfs-dl
//!
//! This module provides:
//! - The request-scoped error taxonomy (validation, no match, fetch exhaustion, ...)
//! - [`TransferFailure`], the per-attempt failure folded into fetch retries
//! - HTTP status code mapping and the JSON error body used by the API

use crate::types::MediaKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for dvorfs-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dvorfs-dl
///
/// Every variant is scoped to a single request; none of them is fatal to the
/// service process.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "retry.max_attempts")
        key: Option<String>,
    },

    /// Malformed or unsupported resource URL, or a malformed request body
    #[error("invalid request: {0}")]
    Validation(String),

    /// No rendition of the requested kind exists
    #[error("no {kind} format available{}", quality_suffix(.quality))]
    NoMatch {
        /// Requested media kind
        kind: MediaKind,
        /// Requested quality, `None` for best
        quality: Option<u32>,
    },

    /// Every fetch attempt failed; nothing remains on disk
    #[error("download failed after {attempts} attempts: {last_reason}")]
    Fetch {
        /// Number of attempts made
        attempts: u32,
        /// Failure reason of the final attempt
        last_reason: String,
    },

    /// The extraction provider could not produce metadata for a resource
    #[error("could not extract resource information: {0}")]
    Extractor(String),

    /// External tool execution failed (yt-dlp missing output, crashed, ...)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (no provider installed, ...)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

fn quality_suffix(quality: &Option<u32>) -> String {
    quality
        .map(|q| format!(" for requested quality {q}"))
        .unwrap_or_default()
}

/// Why a single fetch attempt failed
///
/// These never reach a client directly; the fetcher folds them into retries and
/// reports the last one inside [`Error::Fetch`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferFailure {
    /// The provider reported an error (network, decode, origin rejection)
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// The provider returned but the artifact is missing or empty
    #[error("integrity check failed: {0}")]
    Integrity(String),

    /// The blocking job panicked or was cancelled by the runtime
    #[error("transfer worker failed: {0}")]
    WorkerPanicked(String),
}

impl From<Error> for TransferFailure {
    fn from(error: Error) -> Self {
        TransferFailure::Transfer(error.to_string())
    }
}

/// Structured error response for API endpoints
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "fetch_failed",
///     "message": "download failed after 3 attempts: integrity check failed: empty or missing output",
///     "details": { "attempts": 3, "last_reason": "..." }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "validation_error", "no_matching_format")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - every failure before the first body byte is
            // scoped to the request that hit it
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,
            Error::Fetch { .. } => 400,
            Error::Extractor(_) => 400,
            Error::ExternalTool(_) => 400,
            Error::NotSupported(_) => 400,
            Error::Io(_) => 400,
            Error::Serialization(_) => 400,
            Error::Other(_) => 400,

            // 404 Not Found - nothing of the requested kind
            Error::NoMatch { .. } => 404,

            // 500 Internal Server Error - the server itself could not start
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::NoMatch { .. } => "no_matching_format",
            Error::Fetch { .. } => "fetch_failed",
            Error::Extractor(_) => "extraction_failed",
            Error::ExternalTool(_) => "external_tool_error",
            Error::NotSupported(_) => "not_supported",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl Error {
    /// Whether the failure originates on this side rather than in the request
    ///
    /// These still answer with a client-error status but are logged louder.
    pub fn is_service_fault(&self) -> bool {
        matches!(
            self,
            Error::ExternalTool(_)
                | Error::NotSupported(_)
                | Error::Io(_)
                | Error::Serialization(_)
                | Error::ApiServerError(_)
                | Error::Other(_)
        )
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Fetch {
                attempts,
                last_reason,
            } => Some(serde_json::json!({
                "attempts": attempts,
                "last_reason": last_reason,
            })),
            Error::NoMatch { kind, quality } => Some(serde_json::json!({
                "format_type": kind,
                "quality": quality,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        Self {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
