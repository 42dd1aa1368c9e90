//! Output sequences handed to UI consumers.
//!
//! Each channel gets its own unbounded queue so a consumer that stops
//! reading one channel never stalls the others. Dropping the senders ends
//! every sequence at once.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::{mpsc, oneshot};

use super::session::{Channel, ContentDelta, DeltaKind, ReadingSnapshot};
use crate::error::{ReadingError, ReadingResult};

/// Deltas for one channel, in decode order. Ends when the reading completes,
/// fails or is cancelled.
#[derive(Debug)]
pub struct DeltaStream {
    channel: Channel,
    rx: mpsc::UnboundedReceiver<DeltaKind>,
}

impl DeltaStream {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Receive the next delta, or `None` once the sequence has ended.
    pub async fn next_delta(&mut self) -> Option<DeltaKind> {
        self.rx.recv().await
    }

    /// Drain the sequence and return the text it builds.
    pub async fn accumulate(mut self) -> String {
        let mut text = String::new();
        while let Some(delta) = self.rx.recv().await {
            delta.apply_to(&mut text);
        }
        text
    }
}

impl Stream for DeltaStream {
    type Item = DeltaKind;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Producer side of the three output sequences.
#[derive(Debug)]
pub(crate) struct ChannelSenders {
    opening: mpsc::UnboundedSender<DeltaKind>,
    interpretation: mpsc::UnboundedSender<DeltaKind>,
    one_liner: mpsc::UnboundedSender<DeltaKind>,
}

impl ChannelSenders {
    /// Forward a delta. A consumer that dropped its stream is not an error.
    pub(crate) fn send(&self, delta: ContentDelta) {
        let tx = match delta.channel {
            Channel::Opening => &self.opening,
            Channel::Interpretation => &self.interpretation,
            Channel::OneLiner => &self.one_liner,
        };
        let _ = tx.send(delta.kind);
    }
}

/// Resolves once with the reading's terminal result.
#[derive(Debug)]
pub struct OutcomeReceiver {
    rx: oneshot::Receiver<ReadingResult<ReadingSnapshot>>,
}

impl OutcomeReceiver {
    /// Wait for the reading to finish. A reading whose driver was torn down
    /// resolves to [`ReadingError::Cancelled`].
    pub async fn wait(self) -> ReadingResult<ReadingSnapshot> {
        self.rx.await.unwrap_or(Err(ReadingError::Cancelled))
    }
}

/// Everything a caller consumes from one reading.
#[derive(Debug)]
pub struct ReadingHandle {
    pub opening: DeltaStream,
    pub interpretation: DeltaStream,
    pub one_liner: DeltaStream,
    pub outcome: OutcomeReceiver,
}

impl ReadingHandle {
    /// Wait for the terminal result, discarding the delta streams.
    pub async fn finish(self) -> ReadingResult<ReadingSnapshot> {
        self.outcome.wait().await
    }
}

/// Build a connected handle and its producer halves.
pub(crate) fn reading_channels() -> (
    ReadingHandle,
    ChannelSenders,
    oneshot::Sender<ReadingResult<ReadingSnapshot>>,
) {
    let (opening_tx, opening_rx) = mpsc::unbounded_channel();
    let (interpretation_tx, interpretation_rx) = mpsc::unbounded_channel();
    let (one_liner_tx, one_liner_rx) = mpsc::unbounded_channel();
    let (outcome_tx, outcome_rx) = oneshot::channel();

    let handle = ReadingHandle {
        opening: DeltaStream {
            channel: Channel::Opening,
            rx: opening_rx,
        },
        interpretation: DeltaStream {
            channel: Channel::Interpretation,
            rx: interpretation_rx,
        },
        one_liner: DeltaStream {
            channel: Channel::OneLiner,
            rx: one_liner_rx,
        },
        outcome: OutcomeReceiver { rx: outcome_rx },
    };
    let senders = ChannelSenders {
        opening: opening_tx,
        interpretation: interpretation_tx,
        one_liner: one_liner_tx,
    };
    (handle, senders, outcome_tx)
}
