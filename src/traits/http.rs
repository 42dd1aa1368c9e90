//! HTTP client trait abstraction.
//!
//! Provides a trait-based abstraction for the streaming POST the reading
//! orchestrator issues, enabling dependency injection and mocking in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Response body delivered as chunks in network arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// A response whose body has not been read yet.
///
/// Status validation is left to the caller so that non-2xx bodies can still
/// be read for an error message.
pub struct StreamResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: ByteStream,
}

impl StreamResponse {
    /// Create a new response.
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// Create a new response with headers.
    pub fn with_headers(status: u16, headers: Headers, body: ByteStream) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// HTTP client errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// An established connection dropped mid-request or mid-stream
    ConnectionLost(String),
    /// Request timeout
    Timeout(String),
    /// Host could not be reached (refused, unreachable network)
    HostUnreachable(String),
    /// Hostname does not exist
    HostNotFound(String),
    /// DNS lookup failed
    DnsFailure(String),
    /// The peer did not answer with a usable HTTP response
    InvalidResponse(String),
    /// Request was cancelled
    Cancelled,
    /// IO error
    Io(String),
    /// Invalid URL
    InvalidUrl(String),
    /// Other error
    Other(String),
}

impl HttpError {
    /// Transient network conditions that warrant an automatic reconnect.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HttpError::ConnectionLost(_)
                | HttpError::Timeout(_)
                | HttpError::HostUnreachable(_)
                | HttpError::HostNotFound(_)
                | HttpError::DnsFailure(_)
        )
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            HttpError::ConnectionLost(_) => "E_NET_LOST",
            HttpError::Timeout(_) => "E_NET_TIMEOUT",
            HttpError::HostUnreachable(_) => "E_NET_UNREACHABLE",
            HttpError::HostNotFound(_) => "E_NET_HOST",
            HttpError::DnsFailure(_) => "E_NET_DNS",
            HttpError::InvalidResponse(_) => "E_NET_INVALID",
            HttpError::Cancelled => "E_NET_CANCEL",
            HttpError::Io(_) => "E_NET_IO",
            HttpError::InvalidUrl(_) => "E_NET_URL",
            HttpError::Other(_) => "E_NET_OTHER",
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ConnectionLost(msg) => write!(f, "Connection lost: {}", msg),
            HttpError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            HttpError::HostUnreachable(msg) => write!(f, "Host unreachable: {}", msg),
            HttpError::HostNotFound(msg) => write!(f, "Host not found: {}", msg),
            HttpError::DnsFailure(msg) => write!(f, "DNS lookup failed: {}", msg),
            HttpError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            HttpError::Cancelled => write!(f, "Request cancelled"),
            HttpError::Io(msg) => write!(f, "IO error: {}", msg),
            HttpError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            HttpError::Other(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// Trait for HTTP client operations.
///
/// Implementations include the production reqwest-based client and a
/// scripted mock for tests.
///
/// # Example
///
/// ```ignore
/// use tarot_stream::traits::{HttpClient, Headers};
///
/// async fn status<C: HttpClient>(client: &C) -> Result<u16, HttpError> {
///     let response = client.post_stream("https://api.example.com/stream", "{}", &Headers::new()).await?;
///     Ok(response.status)
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a POST request and return the response with an unread,
    /// streaming body.
    ///
    /// Any status is returned as `Ok`; only transport failures are `Err`.
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<StreamResponse, HttpError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_body() -> ByteStream {
        Box::pin(futures::stream::empty())
    }

    #[test]
    fn test_response_new() {
        let response = StreamResponse::new(200, empty_body());
        assert_eq!(response.status, 200);
        assert!(response.headers.is_empty());
    }

    #[test]
    fn test_response_is_success() {
        assert!(StreamResponse::new(200, empty_body()).is_success());
        assert!(StreamResponse::new(204, empty_body()).is_success());
        assert!(StreamResponse::new(299, empty_body()).is_success());
        assert!(!StreamResponse::new(301, empty_body()).is_success());
        assert!(!StreamResponse::new(404, empty_body()).is_success());
        assert!(!StreamResponse::new(503, empty_body()).is_success());
    }

    #[test]
    fn test_transient_allow_list() {
        assert!(HttpError::ConnectionLost("reset".into()).is_transient());
        assert!(HttpError::Timeout("30s".into()).is_transient());
        assert!(HttpError::HostUnreachable("refused".into()).is_transient());
        assert!(HttpError::HostNotFound("nope.invalid".into()).is_transient());
        assert!(HttpError::DnsFailure("servfail".into()).is_transient());

        assert!(!HttpError::InvalidResponse("garbage".into()).is_transient());
        assert!(!HttpError::Cancelled.is_transient());
        assert!(!HttpError::Io("disk".into()).is_transient());
        assert!(!HttpError::InvalidUrl("bad".into()).is_transient());
        assert!(!HttpError::Other("tls".into()).is_transient());
    }

    #[test]
    fn test_http_error_display() {
        assert_eq!(
            HttpError::ConnectionLost("reset by peer".to_string()).to_string(),
            "Connection lost: reset by peer"
        );
        assert_eq!(
            HttpError::Timeout("30s".to_string()).to_string(),
            "Request timeout: 30s"
        );
        assert_eq!(HttpError::Cancelled.to_string(), "Request cancelled");
        assert_eq!(
            HttpError::InvalidUrl("bad url".to_string()).to_string(),
            "Invalid URL: bad url"
        );
    }
}
