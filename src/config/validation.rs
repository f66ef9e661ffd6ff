use crate::config::types::{ClientConfig, Config, RetryConfig, StreamConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_client_config(&config.client)?;
    validate_retry_config(&config.retry)?;
    validate_stream_config(&config.stream)?;
    Ok(())
}

/// Validates upstream client configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.max_connections < 1 {
        return Err(ConfigError::Validation(format!(
            "max_connections must be >= 1, got {}",
            config.max_connections
        )));
    }

    if config.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= 100ms, got {}ms",
            config.timeout_ms
        )));
    }

    Ok(())
}

/// Validates backoff configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.initial_interval_ms < 1 {
        return Err(ConfigError::Validation(
            "initial_interval_ms must be >= 1ms".to_string(),
        ));
    }

    if config.initial_interval_ms > config.max_interval_ms {
        return Err(ConfigError::Validation(format!(
            "initial_interval_ms ({}) cannot exceed max_interval_ms ({})",
            config.initial_interval_ms, config.max_interval_ms
        )));
    }

    if !config.multiplier.is_finite() || config.multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "multiplier must be >= 1.0, got {}",
            config.multiplier
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates stream configuration
fn validate_stream_config(config: &StreamConfig) -> Result<(), ConfigError> {
    if config.channel_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "channel_capacity must be >= 1, got {}",
            config.channel_capacity
        )));
    }

    Ok(())
}
