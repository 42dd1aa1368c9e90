//! SSE stream decoding logic
//!
//! Contains the stateful [`SseDecoder`] that frames arbitrary byte chunks into
//! events, and the line/block parsing functions it is built on.

mod decoder;

use std::time::Duration;

use tracing::debug;

use crate::sse::events::{SseFrame, SseLine};

pub use decoder::{SseDecoder, DEFAULT_MAX_BUFFER_BYTES};

/// Parse a single SSE line into its component type
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return SseLine::Comment(stripped.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("id:") {
        return SseLine::Id(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("retry:") {
        return SseLine::Retry(rest.trim().to_string());
    }

    // Unknown line format - treat as comment
    SseLine::Comment(line.to_string())
}

/// Parse one raw event block (the text before a blank-line terminator).
///
/// Always returns a frame; callers drop it when it is not dispatchable.
pub fn parse_sse_block(block: &str) -> SseFrame {
    let mut frame = SseFrame::default();
    let mut data_lines: Vec<String> = Vec::new();

    for line in block.split('\n') {
        match parse_sse_line(line.trim_end_matches('\r')) {
            SseLine::Event(event_type) => frame.event_type = event_type,
            SseLine::Data(data) => data_lines.push(data),
            SseLine::Id(id) => {
                if !id.is_empty() {
                    frame.id = Some(id);
                }
            }
            SseLine::Retry(value) => match value.parse::<u64>() {
                Ok(ms) => frame.retry = Some(Duration::from_millis(ms)),
                Err(_) => debug!("Ignoring non-numeric retry field: {:?}", value),
            },
            SseLine::Empty | SseLine::Comment(_) => {}
        }
    }

    frame.data = data_lines.join("\n");
    frame
}
