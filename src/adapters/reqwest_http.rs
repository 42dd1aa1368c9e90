//! Reqwest-based HTTP client adapter.
//!
//! This module provides the production implementation of the [`HttpClient`]
//! trait from `crate::traits`.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::traits::{Headers, HttpClient, HttpError, StreamResponse};

/// HTTP client implementation using reqwest.
///
/// # Example
///
/// ```ignore
/// use tarot_stream::adapters::ReqwestHttpClient;
///
/// let client = ReqwestHttpClient::with_connect_timeout(Duration::from_secs(10))?;
/// let response = client.post_stream(&url, &body, &headers).await?;
/// println!("Status: {}", response.status);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a client that gives up on connection setup after `timeout`.
    ///
    /// Only the connect phase is bounded: a reading's body may legitimately
    /// stream for minutes.
    pub fn with_connect_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| HttpError::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Create a new ReqwestHttpClient with a custom reqwest::Client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying reqwest::Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Convert a request error to HttpError.
    fn convert_error(err: reqwest::Error) -> HttpError {
        let message = err.to_string();
        if err.is_timeout() {
            HttpError::Timeout(message)
        } else if err.is_connect() {
            Self::classify_connect_error(&err, message)
        } else if err.is_body() {
            HttpError::ConnectionLost(message)
        } else if err.is_builder() {
            HttpError::InvalidUrl(message)
        } else if err.is_decode() || err.is_redirect() {
            HttpError::InvalidResponse(message)
        } else if err.is_request() {
            // hyper reports a peer that hung up mid-request here
            HttpError::ConnectionLost(message)
        } else {
            HttpError::Other(message)
        }
    }

    /// Tell name resolution failures apart from unreachable hosts by walking
    /// the error's source chain.
    fn classify_connect_error(err: &reqwest::Error, message: String) -> HttpError {
        let mut source: Option<&(dyn StdError + 'static)> = err.source();
        while let Some(cause) = source {
            let text = cause.to_string().to_lowercase();
            if text.contains("failed to lookup address") || text.contains("name or service not known")
            {
                return HttpError::HostNotFound(message);
            }
            if text.contains("dns error") {
                return HttpError::DnsFailure(message);
            }
            source = cause.source();
        }
        HttpError::HostUnreachable(message)
    }

    /// Convert an error raised while reading the body stream.
    fn convert_body_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else {
            HttpError::ConnectionLost(err.to_string())
        }
    }

    /// Convert reqwest headers to our Headers type.
    fn convert_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    /// Apply headers to a request builder.
    fn apply_headers(
        builder: reqwest::RequestBuilder,
        headers: &Headers,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder;
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<StreamResponse, HttpError> {
        let builder = self.client.post(url).body(body.to_string());
        let builder = Self::apply_headers(builder, headers);

        let response = builder.send().await.map_err(Self::convert_error)?;

        let status = response.status().as_u16();
        let response_headers = Self::convert_headers(response.headers());
        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(Self::convert_body_error));

        Ok(StreamResponse::with_headers(
            status,
            response_headers,
            Box::pin(stream),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reqwest_client_new() {
        let client = ReqwestHttpClient::new();
        let _ = client.inner();
    }

    #[test]
    fn test_with_connect_timeout() {
        assert!(ReqwestHttpClient::with_connect_timeout(Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn test_convert_headers() {
        let mut map = reqwest::header::HeaderMap::new();
        map.insert("content-type", "text/event-stream".parse().unwrap());
        let headers = ReqwestHttpClient::convert_headers(&map);
        assert_eq!(
            headers.get("content-type"),
            Some(&"text/event-stream".to_string())
        );
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_transient() {
        let client = ReqwestHttpClient::new();
        let err = client
            .post_stream("not a url", "{}", &Headers::new())
            .await
            .unwrap_err();
        assert!(!err.is_transient(), "unexpected {:?}", err);
    }

    #[tokio::test]
    async fn test_refused_connection_is_transient() {
        // Port 9 (discard) is closed on any sane test host
        let client = ReqwestHttpClient::with_connect_timeout(Duration::from_secs(2)).unwrap();
        let err = client
            .post_stream("http://127.0.0.1:9/stream", "{}", &Headers::new())
            .await
            .unwrap_err();
        assert!(err.is_transient(), "unexpected {:?}", err);
    }
}
