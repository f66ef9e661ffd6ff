//! HTTP transport implementation
//!
//! This module handles all HTTP requests to the comment gateway, including:
//! - Building the HTTP client with the required headers
//! - Capping the number of requests in flight
//! - Reporting pool exhaustion as a retryable condition

use crate::api::{ApiRequest, ApiResponse, Transport, TransportError};
use crate::config::ClientConfig;
use crate::{ConfigError, RippleError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The upstream client configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(RippleError)` - A header value was invalid or the client failed to build
pub fn build_http_client(config: &ClientConfig) -> Result<Client, RippleError> {
    let language = HeaderValue::from_str(&config.accept_language).map_err(|e| {
        ConfigError::Validation(format!(
            "Invalid accept_language '{}': {}",
            config.accept_language, e
        ))
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, language);

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_millis(config.timeout_ms))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Transport sending gateway requests over HTTP
///
/// At most `max_connections` requests are in flight. A request arriving while
/// all of them are taken fails fast with `NoFreeConnections` instead of queueing.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    connections: Semaphore,
}

impl HttpTransport {
    /// Creates a transport from the client configuration
    pub fn new(config: &ClientConfig) -> Result<Self, RippleError> {
        let client = build_http_client(config)?;
        Self::with_client(client, &config.base_url, config.max_connections as usize)
    }

    /// Creates a transport around an existing client
    pub fn with_client(
        client: Client,
        base_url: &str,
        max_connections: usize,
    ) -> Result<Self, RippleError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

        // Relative joins replace the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            connections: Semaphore::new(max_connections),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request_url(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        let mut url = self
            .base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|e| TransportError::Failed(format!("Invalid request path: {}", e)))?;

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }

        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let _permit = self
            .connections
            .try_acquire()
            .map_err(|_| TransportError::NoFreeConnections)?;

        let url = self.request_url(request)?;
        tracing::trace!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}
