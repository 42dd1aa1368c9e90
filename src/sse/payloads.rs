//! SSE payload deserialization structs
//!
//! Reading events carry their text either as raw data or wrapped in a JSON
//! object with a `content` field.

use serde::Deserialize;

/// JSON wrapper some events use for their text.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ContentPayload {
    pub content: String,
}

/// Extract the text carried by an event's data.
///
/// A JSON object with a string `content` field yields that field. Anything
/// else, malformed JSON included, yields the raw data unchanged.
pub fn extract_content(data: &str) -> String {
    match serde_json::from_str::<ContentPayload>(data) {
        Ok(payload) => payload.content,
        Err(_) => data.to_string(),
    }
}
