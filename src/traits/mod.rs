//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - Streaming POST used by the reading orchestrator

pub mod http;

pub use http::{ByteStream, Headers, HttpClient, HttpError, StreamResponse};
