//! Mock HTTP client for testing.
//!
//! Responses are scripted in call order: each `post_stream` call pops the next
//! queued [`MockResponse`], so a test can describe a whole reconnect sequence
//! up front.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::traits::{ByteStream, Headers, HttpClient, HttpError, StreamResponse};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body
    pub body: String,
}

impl RecordedRequest {
    /// Look up a header value by exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Answer with `status` and stream these chunks, then end the body
    Stream { status: u16, chunks: Vec<Bytes> },
    /// Stream these chunks, then fail the body with an error
    StreamThenError { chunks: Vec<Bytes>, error: HttpError },
    /// Stream these chunks, then keep the body open without sending more
    StreamThenHang { chunks: Vec<Bytes> },
    /// Fail the request before any response
    Error(HttpError),
}

/// Mock HTTP client for testing.
///
/// # Example
///
/// ```ignore
/// use tarot_stream::adapters::mock::MockHttpClient;
///
/// let client = MockHttpClient::new();
/// client.push_status(503, "busy");
/// client.push_stream(["event: complete\ndata: {}\n\n"]);
///
/// // ... drive a reading with the client ...
///
/// assert_eq!(client.get_requests().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// Scripted responses, consumed front to back
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response.
    pub fn push_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Queue a 200 response whose body is these chunks.
    pub fn push_stream<I, C>(&self, chunks: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        self.push_response(MockResponse::Stream {
            status: 200,
            chunks: chunks.into_iter().map(Into::into).collect(),
        });
    }

    /// Queue a response with `status` and a plain body.
    pub fn push_status(&self, status: u16, body: &str) {
        self.push_response(MockResponse::Stream {
            status,
            chunks: vec![Bytes::from(body.to_string())],
        });
    }

    /// Queue a request-level failure.
    pub fn push_error(&self, error: HttpError) {
        self.push_response(MockResponse::Error(error));
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    fn record_request(&self, url: &str, headers: &Headers, body: &str) {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            body: body.to_string(),
        });
    }

    fn chunk_stream(chunks: Vec<Bytes>) -> impl futures::Stream<Item = Result<Bytes, HttpError>> {
        futures::stream::iter(chunks.into_iter().map(Ok))
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<StreamResponse, HttpError> {
        use futures_util::StreamExt;

        self.record_request(url, headers, body);

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(MockResponse::Stream { status, chunks }) => {
                let stream: ByteStream = Box::pin(Self::chunk_stream(chunks));
                Ok(StreamResponse::new(status, stream))
            }
            Some(MockResponse::StreamThenError { chunks, error }) => {
                let tail = futures::stream::once(async move { Err(error) });
                let stream: ByteStream = Box::pin(Self::chunk_stream(chunks).chain(tail));
                Ok(StreamResponse::new(200, stream))
            }
            Some(MockResponse::StreamThenHang { chunks }) => {
                let stream: ByteStream =
                    Box::pin(Self::chunk_stream(chunks).chain(futures::stream::pending()));
                Ok(StreamResponse::new(200, stream))
            }
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}
