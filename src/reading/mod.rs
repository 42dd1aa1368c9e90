//! Reading sessions: routing, output channels, backoff and the connection
//! orchestrator that ties them together.

mod backoff;
mod channels;
mod orchestrator;
mod session;

pub use backoff::{RetryPolicy, MAX_RETRY_DELAY};
pub use channels::{DeltaStream, OutcomeReceiver, ReadingHandle};
pub use orchestrator::{ReadingEvent, ReadingStream};
pub use session::{Channel, ContentDelta, DeltaKind, ReadingSnapshot, RouteOutcome, Session};
