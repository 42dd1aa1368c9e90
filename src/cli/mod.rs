//! CLI module for tarot-stream.
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing
//! - Version display
//!
//! # Usage
//!
//! ```ignore
//! use tarot_stream::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args())? {
//!     CliCommand::Read(request) => { /* stream it */ }
//!     other => { /* print version or usage */ }
//! }
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, parse_card, CliCommand, USAGE};
pub use version::{version_line, VERSION};
