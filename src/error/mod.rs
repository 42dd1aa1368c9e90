//! Error handling for tarot-stream.
//!
//! - **Error Categories**: High-level classification for handling decisions
//! - **Reading Errors**: `ReadingError`, the fault taxonomy of one reading
//! - **Result Type Alias**: `ReadingResult<T>`
//!
//! Transport errors ([`HttpError`](crate::traits::HttpError)) and decoder
//! errors ([`SseDecodeError`](crate::sse::SseDecodeError)) convert into
//! `ReadingError` at the orchestrator boundary.
//!
//! | Variant | Retryable |
//! |---------|-----------|
//! | InvalidResponse | No |
//! | HttpError | 5xx only |
//! | DecodingError | No |
//! | Network | Transient conditions only |
//! | ServerEvent | Yes |
//! | MaxRetriesExceeded | No |
//! | Cancelled | No |

mod category;
mod reading_error;

pub use category::ErrorCategory;
pub use reading_error::ReadingError;

/// Type alias for Results using ReadingError.
pub type ReadingResult<T> = Result<T, ReadingError>;
