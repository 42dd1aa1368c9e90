//! Fault taxonomy for a streaming reading.

use thiserror::Error;

use super::category::ErrorCategory;
use crate::sse::SseDecodeError;
use crate::traits::HttpError;

/// Every way a reading attempt can fail.
///
/// The orchestrator consults [`ReadingError::is_retryable`] to decide between
/// a reconnect and a terminal failure.
#[derive(Debug, Clone, Error)]
pub enum ReadingError {
    /// The peer did not produce a usable HTTP response.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} error: {message}")]
    HttpError { status: u16, message: String },

    /// The request body could not be encoded or the stream could not be
    /// decoded (buffer overflow).
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Transport failure below HTTP.
    #[error("Network error: {0}")]
    Network(#[source] HttpError),

    /// The server sent an `error` event.
    #[error("Server reported an error: {0}")]
    ServerEvent(String),

    /// Retryable faults kept happening after the retry ceiling.
    #[error("Maximum retries exceeded after {attempts} retries: {last}")]
    MaxRetriesExceeded {
        attempts: u32,
        last: Box<ReadingError>,
    },

    /// The reading was cancelled or replaced by a newer one.
    #[error("Reading cancelled")]
    Cancelled,
}

impl ReadingError {
    /// Whether this fault may trigger an automatic reconnect.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReadingError::HttpError { status, .. } => (500..600).contains(status),
            ReadingError::Network(err) => err.is_transient(),
            ReadingError::ServerEvent(_) => true,
            ReadingError::InvalidResponse(_)
            | ReadingError::DecodingError(_)
            | ReadingError::MaxRetriesExceeded { .. }
            | ReadingError::Cancelled => false,
        }
    }

    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReadingError::Network(_) => ErrorCategory::Network,
            ReadingError::HttpError { status, .. } => match *status {
                401 | 403 => ErrorCategory::Auth,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Client,
            },
            ReadingError::ServerEvent(_) | ReadingError::MaxRetriesExceeded { .. } => {
                ErrorCategory::Server
            }
            ReadingError::InvalidResponse(_) | ReadingError::DecodingError(_) => {
                ErrorCategory::Client
            }
            ReadingError::Cancelled => ErrorCategory::User,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ReadingError::InvalidResponse(_) => "E_READ_INVALID",
            ReadingError::HttpError { .. } => "E_READ_HTTP",
            ReadingError::DecodingError(_) => "E_READ_DECODE",
            ReadingError::Network(err) => err.error_code(),
            ReadingError::ServerEvent(_) => "E_READ_SERVER",
            ReadingError::MaxRetriesExceeded { .. } => "E_READ_RETRIES",
            ReadingError::Cancelled => "E_READ_CANCEL",
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ReadingError::InvalidResponse(_) => {
                "Received an invalid response from the reading service.".to_string()
            }
            ReadingError::HttpError { status, .. } => match *status {
                401 => "Authentication required. Please sign in again.".to_string(),
                403 => "Access denied for this reading.".to_string(),
                404 => "The reading service could not be found.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => {
                    "The reading service is experiencing issues. Please try again later."
                        .to_string()
                }
                _ => format!(
                    "The reading service returned an error (HTTP {}). Please try again.",
                    status
                ),
            },
            ReadingError::DecodingError(_) => {
                "The reading could not be processed. Please try again.".to_string()
            }
            ReadingError::Network(_) => {
                "Unable to reach the reading service. Please check your internet connection."
                    .to_string()
            }
            ReadingError::ServerEvent(message) => {
                format!("The reading service reported a problem: {}", message)
            }
            ReadingError::MaxRetriesExceeded { attempts, .. } => format!(
                "The reading could not be completed after {} reconnect attempts.",
                attempts
            ),
            ReadingError::Cancelled => "The reading was cancelled.".to_string(),
        }
    }
}

impl From<HttpError> for ReadingError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::InvalidResponse(message) => ReadingError::InvalidResponse(message),
            HttpError::Cancelled => ReadingError::Cancelled,
            other => ReadingError::Network(other),
        }
    }
}

impl From<SseDecodeError> for ReadingError {
    fn from(err: SseDecodeError) -> Self {
        ReadingError::DecodingError(err.to_string())
    }
}

impl From<serde_json::Error> for ReadingError {
    fn from(err: serde_json::Error) -> Self {
        ReadingError::DecodingError(err.to_string())
    }
}
