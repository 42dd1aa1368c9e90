//! Session state for one reading and the event router that mutates it.
//!
//! Every decoded [`SseFrame`] goes through [`Session::apply`], which updates
//! the three channel accumulators, the replay cursor and the retry counter,
//! and reports the deltas a UI should render.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::sse::{extract_content, SseFrame};

/// One of the three independently accumulated text channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Opening,
    Interpretation,
    OneLiner,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Opening, Channel::Interpretation, Channel::OneLiner];

    /// Name used in event types.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Opening => "opening",
            Channel::Interpretation => "interpretation",
            Channel::OneLiner => "one_liner",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change to one channel's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaKind {
    /// Clear the channel
    Reset,
    /// Append a chunk
    Append(String),
    /// Replace the whole text
    Replace(String),
}

impl DeltaKind {
    /// Apply this delta to an accumulated text.
    pub fn apply_to(&self, text: &mut String) {
        match self {
            DeltaKind::Reset => text.clear(),
            DeltaKind::Append(chunk) => text.push_str(chunk),
            DeltaKind::Replace(full) => {
                text.clear();
                text.push_str(full);
            }
        }
    }
}

/// A delta addressed to a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDelta {
    pub channel: Channel,
    pub kind: DeltaKind,
}

impl ContentDelta {
    pub fn new(channel: Channel, kind: DeltaKind) -> Self {
        Self { channel, kind }
    }
}

/// What the orchestrator should do after a frame was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Keep reading; forward these deltas (possibly none)
    Continue(Vec<ContentDelta>),
    /// The server finished the reading
    Completed,
    /// The server sent an `error` event with this content
    ServerError(String),
}

/// Final or in-progress text of all three channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingSnapshot {
    pub opening: String,
    pub interpretation: String,
    pub one_liner: String,
}

impl ReadingSnapshot {
    pub fn text(&self, channel: Channel) -> &str {
        match channel {
            Channel::Opening => &self.opening,
            Channel::Interpretation => &self.interpretation,
            Channel::OneLiner => &self.one_liner,
        }
    }
}

/// Which way an event addresses a channel.
enum ChannelAction {
    Start,
    Chunk,
    Replace,
}

/// Split an event type like `opening_chunk` into channel and action.
fn parse_channel_event(event_type: &str) -> Option<(Channel, ChannelAction)> {
    if event_type == Channel::OneLiner.as_str() {
        return Some((Channel::OneLiner, ChannelAction::Replace));
    }

    for channel in [Channel::Opening, Channel::Interpretation] {
        let Some(rest) = event_type.strip_prefix(channel.as_str()) else {
            continue;
        };
        match rest {
            "" => return Some((channel, ChannelAction::Replace)),
            "_start" => return Some((channel, ChannelAction::Start)),
            "_chunk" => return Some((channel, ChannelAction::Chunk)),
            _ => {}
        }
    }
    None
}

/// Mutable state of one reading.
///
/// Owned by a single driver task; nothing else writes to it.
#[derive(Debug, Clone)]
pub struct Session {
    snapshot: ReadingSnapshot,
    retry_count: u32,
    last_event_id: Option<String>,
    retry_delay: Duration,
}

impl Session {
    /// Create an empty session with the given initial reconnect delay.
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            snapshot: ReadingSnapshot::default(),
            retry_count: 0,
            last_event_id: None,
            retry_delay,
        }
    }

    /// Apply one decoded frame.
    pub fn apply(&mut self, frame: &SseFrame) -> RouteOutcome {
        self.observe_cursor(frame.id.as_deref(), frame.retry);

        let event_type = frame.event_type.as_str();
        if !event_type.is_empty() && event_type != "error" {
            self.retry_count = 0;
        }

        match event_type {
            "connected" | "ping" | "heartbeat" => {
                debug!("Informational event: {}", event_type);
                RouteOutcome::Continue(Vec::new())
            }
            "complete" => RouteOutcome::Completed,
            "error" => RouteOutcome::ServerError(extract_content(&frame.data)),
            _ => match parse_channel_event(event_type) {
                Some((channel, action)) => {
                    let kind = match action {
                        ChannelAction::Start => DeltaKind::Reset,
                        ChannelAction::Chunk => DeltaKind::Append(extract_content(&frame.data)),
                        ChannelAction::Replace => DeltaKind::Replace(extract_content(&frame.data)),
                    };
                    kind.apply_to(self.text_mut(channel));
                    RouteOutcome::Continue(vec![ContentDelta::new(channel, kind)])
                }
                None => {
                    debug!("Ignoring unknown event type: {:?}", event_type);
                    RouteOutcome::Continue(Vec::new())
                }
            },
        }
    }

    /// Record cursor fields seen on the wire, including on frames that were
    /// never dispatched.
    pub fn observe_cursor(&mut self, id: Option<&str>, retry: Option<Duration>) {
        if let Some(id) = id {
            self.last_event_id = Some(id.to_string());
        }
        if let Some(retry) = retry {
            self.retry_delay = retry;
        }
    }

    /// Count a retry that is about to reconnect.
    pub fn record_retry(&mut self) {
        self.retry_count += 1;
    }

    /// Clear all three channels ahead of a reconnect, keeping the cursor,
    /// retry delay and retry count. Returns one reset delta per channel.
    pub fn reset_content(&mut self) -> Vec<ContentDelta> {
        self.snapshot = ReadingSnapshot::default();
        Channel::ALL
            .iter()
            .map(|channel| ContentDelta::new(*channel, DeltaKind::Reset))
            .collect()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn text(&self, channel: Channel) -> &str {
        self.snapshot.text(channel)
    }

    pub fn snapshot(&self) -> ReadingSnapshot {
        self.snapshot.clone()
    }

    fn text_mut(&mut self, channel: Channel) -> &mut String {
        match channel {
            Channel::Opening => &mut self.snapshot.opening,
            Channel::Interpretation => &mut self.snapshot.interpretation,
            Channel::OneLiner => &mut self.snapshot.one_liner,
        }
    }
}
