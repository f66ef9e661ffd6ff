//! Exponential backoff for retryable transport failures

use crate::config::RetryConfig;
use std::time::Duration;

/// Retry budget and delay curve for one request
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub initial_interval: Duration,

    /// Upper bound for a single delay
    pub max_interval: Duration,

    /// Growth factor applied after each attempt
    pub multiplier: f64,

    /// Maximum number of retries after the first attempt
    pub max_retries: u32,

    /// Maximum total time spent retrying
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            initial_interval: Duration::from_millis(config.initial_interval_ms),
            max_interval: Duration::from_millis(config.max_interval_ms),
            multiplier: config.multiplier,
            max_retries: config.max_retries,
            max_elapsed: Duration::from_millis(config.max_elapsed_ms),
        }
    }
}

impl RetryPolicy {
    /// Builds a policy with no delay between retries
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            initial_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            multiplier: 1.0,
            max_retries,
            max_elapsed: Duration::MAX,
        }
    }

    /// Delay to wait before retry number `retry` (1-based)
    pub fn delay(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let millis = self.initial_interval.as_millis() as f64 * self.multiplier.powi(exponent);
        let max_millis = self.max_interval.as_millis() as f64;

        if !millis.is_finite() || millis >= max_millis {
            self.max_interval
        } else {
            Duration::from_millis(millis as u64)
        }
    }

    /// Returns true if retry number `retry` still fits the budget
    pub fn allows(&self, retry: u32, elapsed: Duration) -> bool {
        retry <= self.max_retries && elapsed.saturating_add(self.delay(retry)) <= self.max_elapsed
    }
}
