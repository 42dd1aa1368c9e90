//! tarot-stream - resumable SSE client for streamed tarot readings
//!
//! This library exposes modules for use by the binary and integration tests.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod reading;
pub mod sse;
pub mod storage;
pub mod traits;
