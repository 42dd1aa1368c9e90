//! Wire and record types for readings.

mod record;
mod request;

pub use record::ReadingRecord;
pub use request::{Card, DrawnCard, Orientation, ReadingRequest};
