//! Incremental SSE framing over arbitrary byte chunks.

use std::time::Duration;

use tracing::{debug, warn};

use super::parse_sse_block;
use crate::sse::events::{SseDecodeError, SseFrame};

/// Upper bound on pending, unterminated input.
pub const DEFAULT_MAX_BUFFER_BYTES: usize = 1_000_000;

const TERMINATOR: &[u8] = b"\n\n";

/// Stateful decoder that accumulates chunks and emits complete frames.
///
/// Chunks may split anywhere: inside a field, a line, a `\r\n` pair or a
/// multi-byte UTF-8 sequence. Consumed blocks are removed from the buffer.
#[derive(Debug)]
pub struct SseDecoder {
    /// Decoded text not yet terminated by a blank line
    buffer: String,
    /// Leading bytes of a UTF-8 sequence cut off at the end of the last chunk
    partial: Vec<u8>,
    /// The last chunk ended in '\r'; its '\n' may arrive next
    pending_cr: bool,
    /// Buffer offset before which no terminator can start
    scanned: usize,
    max_buffer_bytes: usize,
    last_event_id: Option<String>,
    retry: Option<Duration>,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_BUFFER_BYTES)
    }
}

impl SseDecoder {
    /// Create a decoder with the default 1,000,000 byte bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder with a custom buffer bound.
    pub fn with_limit(max_buffer_bytes: usize) -> Self {
        Self {
            buffer: String::new(),
            partial: Vec::new(),
            pending_cr: false,
            scanned: 0,
            max_buffer_bytes,
            last_event_id: None,
            retry: None,
        }
    }

    /// Feed a chunk, returning every frame it completed.
    ///
    /// Returns `Err(BufferOverflow)` when the remaining unterminated input
    /// exceeds the bound. The buffer is empty afterward and the caller must
    /// treat the connection as dead.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseFrame>, SseDecodeError> {
        if let Some(text) = self.decode_chunk(chunk) {
            self.push_text(&text);
        }

        let mut frames = Vec::new();
        let mut consumed = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = find_terminator(&self.buffer.as_bytes()[search_from..]) {
            let end = search_from + offset;
            let frame = parse_sse_block(&self.buffer[consumed..end]);
            consumed = end + TERMINATOR.len();
            search_from = consumed;

            if let Some(id) = &frame.id {
                self.last_event_id = Some(id.clone());
            }
            if frame.retry.is_some() {
                self.retry = frame.retry;
            }
            if frame.is_dispatchable() {
                frames.push(frame);
            }
        }
        self.buffer.drain(..consumed);
        // The last byte may pair with a '\n' from the next chunk
        self.scanned = self.buffer.len().saturating_sub(1);

        let pending = self.pending_len();
        if pending > self.max_buffer_bytes {
            warn!(
                "SSE buffer overflow: {} pending bytes exceeds {} byte limit, clearing",
                pending, self.max_buffer_bytes
            );
            self.clear_buffer();
            return Err(SseDecodeError::BufferOverflow {
                limit: self.max_buffer_bytes,
                len: pending,
            });
        }

        Ok(frames)
    }

    /// Signal end of stream. Unterminated input is discarded.
    pub fn finish(&mut self) {
        if !self.buffer.trim().is_empty() {
            debug!(
                "Discarding {} bytes of unterminated SSE input at end of stream",
                self.buffer.len()
            );
        }
        self.clear_buffer();
    }

    /// Reset the decoder state, cursor included.
    pub fn reset(&mut self) {
        self.clear_buffer();
        self.last_event_id = None;
        self.retry = None;
    }

    /// Most recent `id:` seen on this stream, even on blocks that were
    /// discarded as heartbeats.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Most recent `retry:` interval seen on this stream.
    pub fn retry_interval(&self) -> Option<Duration> {
        self.retry
    }

    /// Bytes held waiting for a terminator.
    pub fn pending_len(&self) -> usize {
        self.buffer.len() + self.partial.len() + usize::from(self.pending_cr)
    }

    pub fn max_buffer_bytes(&self) -> usize {
        self.max_buffer_bytes
    }

    fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
        self.partial.clear();
        self.pending_cr = false;
    }

    /// Decode a chunk as UTF-8, carrying an incomplete trailing sequence over
    /// to the next call. Invalid bytes drop the whole chunk.
    fn decode_chunk(&mut self, chunk: &[u8]) -> Option<String> {
        let mut bytes = std::mem::take(&mut self.partial);
        bytes.extend_from_slice(chunk);

        match String::from_utf8(bytes) {
            Ok(text) => Some(text),
            Err(err) => {
                let utf8_error = err.utf8_error();
                if utf8_error.error_len().is_some() {
                    warn!(
                        "Dropping SSE chunk of {} bytes with invalid UTF-8: {}",
                        chunk.len(),
                        utf8_error
                    );
                    return None;
                }
                let mut bytes = err.into_bytes();
                self.partial = bytes.split_off(utf8_error.valid_up_to());
                String::from_utf8(bytes).ok()
            }
        }
    }

    /// Append text with `\r\n` normalized to `\n`.
    fn push_text(&mut self, text: &str) {
        let mut text = if self.pending_cr {
            self.pending_cr = false;
            format!("\r{}", text)
        } else {
            text.to_string()
        };
        if text.ends_with('\r') {
            text.pop();
            self.pending_cr = true;
        }
        self.buffer.push_str(&text.replace("\r\n", "\n"));
    }
}

fn find_terminator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(TERMINATOR.len())
        .position(|window| window == TERMINATOR)
}
