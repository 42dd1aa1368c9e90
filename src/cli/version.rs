//! Version command for the tarot-stream CLI.

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version line printed for `--version`.
pub fn version_line() -> String {
    format!("tarot-stream {}", VERSION)
}
