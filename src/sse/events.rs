//! SSE frame types and definitions
//!
//! Contains the decoded [`SseFrame`], the per-line classification used while
//! decoding a block, and the decoder's error type.

use std::time::Duration;

/// One decoded SSE event.
///
/// Frames carry no business meaning; routing them into reading channels is
/// the job of [`crate::reading::Session`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseFrame {
    /// Value of the `event:` field. Empty when the block had none.
    pub event_type: String,
    /// All `data:` values of the block joined with `\n`.
    pub data: String,
    /// Value of the `id:` field, used as the replay cursor.
    pub id: Option<String>,
    /// Value of the `retry:` field, converted from milliseconds.
    pub retry: Option<Duration>,
}

impl SseFrame {
    /// Create a frame with a type and data and no cursor fields.
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
            id: None,
            retry: None,
        }
    }

    /// Attach an event id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach a reconnect interval.
    pub fn with_retry(mut self, retry: Duration) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Blocks with neither a type nor data are heartbeats and never emitted.
    pub fn is_dispatchable(&self) -> bool {
        !self.event_type.is_empty() || !self.data.is_empty()
    }
}

/// Represents a parsed SSE line
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event type declaration (e.g., "event: opening_chunk")
    Event(String),
    /// Data payload (e.g., "data: {\"content\": \"hello\"}")
    Data(String),
    /// Replay cursor (e.g., "id: 42")
    Id(String),
    /// Reconnect interval in milliseconds (e.g., "retry: 3000")
    Retry(String),
    /// Empty line
    Empty,
    /// Comment line (starts with ':') or a field we do not recognize
    Comment(String),
}

/// Errors that can occur while decoding an SSE byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseDecodeError {
    /// Unterminated input grew past the buffer bound. The buffer has been
    /// cleared and the connection must not be read further.
    BufferOverflow { limit: usize, len: usize },
}

impl std::fmt::Display for SseDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseDecodeError::BufferOverflow { limit, len } => write!(
                f,
                "SSE buffer overflow: {} bytes pending exceeds limit of {} bytes",
                len, limit
            ),
        }
    }
}

impl std::error::Error for SseDecodeError {}
