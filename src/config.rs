//! Runtime configuration for the reading client.
//!
//! Use the builder pattern to customize behavior, or [`ReadingConfig::from_env`]
//! to pick settings up from `TAROT_*` environment variables.
//!
//! # Example
//!
//! ```ignore
//! use tarot_stream::config::ReadingConfig;
//!
//! let config = ReadingConfig::default()
//!     .with_base_url("https://tarot.example.com")
//!     .with_auth_token(Some("secret".to_string()));
//! ```

use std::path::PathBuf;
use std::time::Duration;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;

use crate::reading::RetryPolicy;
use crate::sse::DEFAULT_MAX_BUFFER_BYTES;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_ENDPOINT: &str = "/api/v1/reading/stream";

/// Sent as the bearer token when no credential is available.
pub const PLACEHOLDER_TOKEN: &str = "anonymous";

pub const ENV_BASE_URL: &str = "TAROT_BASE_URL";
pub const ENV_AUTH_TOKEN: &str = "TAROT_AUTH_TOKEN";
pub const ENV_RETRY_DELAY_MS: &str = "TAROT_RETRY_DELAY_MS";
pub const ENV_MAX_RETRIES: &str = "TAROT_MAX_RETRIES";
pub const ENV_STORE_PATH: &str = "TAROT_STORE_PATH";

/// Configuration for a [`ReadingStream`](crate::reading::ReadingStream).
#[derive(Debug, Clone)]
pub struct ReadingConfig {
    /// Scheme and host of the reading service, without trailing slash
    pub base_url: String,
    /// Path of the streaming endpoint
    pub endpoint: String,
    /// Bearer token; `None` sends [`PLACEHOLDER_TOKEN`]
    pub auth_token: Option<String>,
    /// Initial reconnect delay, replaced by server `retry:` hints
    pub retry_delay: Duration,
    /// Backoff growth, jitter and retry ceiling
    pub retry_policy: RetryPolicy,
    /// Bound on unterminated SSE input per connection
    pub max_buffer_bytes: usize,
    /// Timeout for establishing the TCP/TLS connection
    pub connect_timeout: Duration,
    /// Longest silence tolerated mid-stream before the connection counts as lost
    pub idle_timeout: Option<Duration>,
    /// JSON file finished readings are recorded in
    pub store_path: Option<PathBuf>,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            auth_token: None,
            retry_delay: Duration::from_secs(1),
            retry_policy: RetryPolicy::default(),
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Some(Duration::from_secs(90)),
            store_path: None,
        }
    }
}

impl ReadingConfig {
    /// Create a new ReadingConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL) {
            config = config.with_base_url(url);
        }

        if let Some(token) = lookup(ENV_AUTH_TOKEN) {
            config = config.with_auth_token(Some(token));
        }

        if let Some(value) = lookup(ENV_RETRY_DELAY_MS) {
            let ms: u64 = value
                .trim()
                .parse()
                .wrap_err_with(|| format!("{} must be milliseconds, got {:?}", ENV_RETRY_DELAY_MS, value))?;
            config.retry_delay = Duration::from_millis(ms);
        }

        if let Some(value) = lookup(ENV_MAX_RETRIES) {
            let max_retries: u32 = value
                .trim()
                .parse()
                .wrap_err_with(|| format!("{} must be a count, got {:?}", ENV_MAX_RETRIES, value))?;
            config.retry_policy.max_retries = max_retries;
        }

        if let Some(path) = lookup(ENV_STORE_PATH) {
            config.store_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    /// Set the service base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the streaming endpoint path.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the bearer token. Blank tokens count as absent.
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Set the initial reconnect delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set the SSE buffer bound.
    pub fn with_max_buffer_bytes(mut self, bytes: usize) -> Self {
        self.max_buffer_bytes = bytes;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the mid-stream idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the record store path.
    pub fn with_store_path(mut self, path: Option<PathBuf>) -> Self {
        self.store_path = path;
        self
    }

    /// Full URL of the streaming endpoint.
    pub fn stream_url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint)
    }

    /// Token for the Authorization header, never empty.
    pub fn bearer_token(&self) -> &str {
        self.auth_token.as_deref().unwrap_or(PLACEHOLDER_TOKEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ReadingConfig::default();
        assert_eq!(config.stream_url(), "http://localhost:8000/api/v1/reading/stream");
        assert_eq!(config.bearer_token(), PLACEHOLDER_TOKEN);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
        assert_eq!(config.retry_policy.max_retries, 3);
        assert_eq!(config.max_buffer_bytes, 1_000_000);
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let config = ReadingConfig::new().with_base_url("https://tarot.example.com/");
        assert_eq!(
            config.stream_url(),
            "https://tarot.example.com/api/v1/reading/stream"
        );
    }

    #[test]
    fn test_blank_token_uses_placeholder() {
        let config = ReadingConfig::new().with_auth_token(Some("   ".to_string()));
        assert_eq!(config.auth_token, None);
        assert_eq!(config.bearer_token(), PLACEHOLDER_TOKEN);
    }

    #[test]
    fn test_from_lookup() {
        let config = ReadingConfig::from_lookup(lookup_from(&[
            (ENV_BASE_URL, "http://10.0.0.2:9000"),
            (ENV_AUTH_TOKEN, "tok-123"),
            (ENV_RETRY_DELAY_MS, "250"),
            (ENV_MAX_RETRIES, "5"),
            (ENV_STORE_PATH, "/tmp/readings.json"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.bearer_token(), "tok-123");
        assert_eq!(config.retry_delay, Duration::from_millis(250));
        assert_eq!(config.retry_policy.max_retries, 5);
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/readings.json")));
    }

    #[test]
    fn test_from_lookup_empty_keeps_defaults() {
        let config = ReadingConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.auth_token, None);
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var(ENV_MAX_RETRIES, "7");
        let config = ReadingConfig::from_env();
        std::env::remove_var(ENV_MAX_RETRIES);
        assert_eq!(config.unwrap().retry_policy.max_retries, 7);
    }

    #[test]
    fn test_from_lookup_rejects_bad_numbers() {
        let err = ReadingConfig::from_lookup(lookup_from(&[(ENV_RETRY_DELAY_MS, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_RETRY_DELAY_MS));
    }
}
