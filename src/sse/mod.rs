//! SSE (Server-Sent Events) stream decoder
//!
//! Frames the reading backend's streaming response into discrete events.
//! SSE format consists of:
//! - `event: <type>` - event type line
//! - `data: <text>` - data payload line (repeatable, joined with `\n`)
//! - `id: <cursor>` - replay cursor sent back as `Last-Event-ID`
//! - `retry: <ms>` - reconnect interval hint
//! - Empty line - signals end of event
//! - Lines starting with `:` - comments (ignored)
//!
//! # Module structure
//! - `events` - Frame and line types, decode errors
//! - `payloads` - JSON content extraction for event data
//! - `parser` - Decoding logic (SseDecoder, parse_sse_line, parse_sse_block)

mod events;
mod parser;
mod payloads;

// Re-export public types
pub use events::{SseDecodeError, SseFrame, SseLine};
pub use parser::{parse_sse_block, parse_sse_line, SseDecoder, DEFAULT_MAX_BUFFER_BYTES};
pub use payloads::extract_content;
