//! Common test utilities for integration tests.
//!
//! Fixtures for requests and configs, SSE frame builders, and helpers that
//! drain status notifications without hanging a failing test.

#![allow(dead_code)]

use std::time::Duration;

use tokio::sync::broadcast;

use tarot_stream::config::ReadingConfig;
use tarot_stream::models::{Card, Orientation, ReadingRequest};
use tarot_stream::reading::ReadingEvent;

/// Longest any single await in a test may take.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A single-card request for The Tower, reversed.
pub fn tower_request() -> ReadingRequest {
    ReadingRequest::single(
        Card {
            card_id: 16,
            card_name: "The Tower".to_string(),
            card_cname: "塔".to_string(),
            card_type: "major".to_string(),
            orientation: Orientation::Reversed,
        },
        "single",
    )
}

/// Config with millisecond backoff so retry paths finish quickly.
pub fn fast_config() -> ReadingConfig {
    ReadingConfig::new()
        .with_base_url("http://tarot.test")
        .with_retry_delay(Duration::from_millis(5))
        .with_idle_timeout(Some(Duration::from_secs(2)))
}

/// One SSE event block, terminator included.
pub fn sse(event: &str, data: &str) -> String {
    format!("event: {}\ndata: {}\n\n", event, data)
}

/// One SSE event block carrying an id.
pub fn sse_with_id(id: &str, event: &str, data: &str) -> String {
    format!("id: {}\nevent: {}\ndata: {}\n\n", id, event, data)
}

/// The `complete` event.
pub fn complete() -> String {
    sse("complete", "{}")
}

/// Receive notifications until a terminal one arrives.
pub async fn events_until_terminal(
    rx: &mut broadcast::Receiver<ReadingEvent>,
) -> Vec<ReadingEvent> {
    let mut events = Vec::new();
    loop {
        let event = within(rx.recv()).await.expect("event channel closed");
        let terminal = event.is_terminal();
        events.push(event);
        if terminal {
            return events;
        }
    }
}

/// Await a future, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(TEST_TIMEOUT, future)
        .await
        .expect("test step timed out")
}
