use serde::Deserialize;

/// Main configuration structure for Comment-Ripple
///
/// Every section is optional; a missing section falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

/// Upstream HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientConfig {
    /// Base URL of the upstream comment gateway
    pub base_url: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Accept-Language header; response parsing expects English
    pub accept_language: String,

    /// Maximum number of requests in flight at once
    pub max_connections: u32,

    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            user_agent: concat!("comment-ripple/", env!("CARGO_PKG_VERSION")).to_string(),
            accept_language: "en-US".to_string(),
            max_connections: 10_000,
            timeout_ms: 30_000,
        }
    }
}

/// Backoff configuration for retryable transport failures
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Delay before the first retry (milliseconds)
    pub initial_interval_ms: u64,

    /// Upper bound for a single delay (milliseconds)
    pub max_interval_ms: u64,

    /// Growth factor applied to the delay after each attempt
    pub multiplier: f64,

    /// Maximum number of retries before giving up
    pub max_retries: u32,

    /// Maximum total time spent retrying one request (milliseconds)
    pub max_elapsed_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 500,
            max_interval_ms: 60_000,
            multiplier: 1.5,
            max_retries: 16,
            max_elapsed_ms: 15 * 60 * 1000,
        }
    }
}

/// Comment stream configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StreamConfig {
    /// Capacity of the channel shared by all branches of one job
    pub channel_capacity: usize,

    /// Pause between two polls in live mode (milliseconds)
    pub live_poll_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            live_poll_interval_ms: 5_000,
        }
    }
}
