//! Upstream collaborators of the comment crawler
//!
//! This module contains the narrow interfaces the crawler talks through:
//! - The `Transport` trait and its reqwest-backed implementation
//! - Video identifier resolution
//! - Request builders and response parsers for the comment gateway

mod http;
mod video_id;
mod wire;

pub use http::{build_http_client, HttpTransport};
pub use video_id::{is_video_id, resolve_video_id};
pub use wire::{
    comment_page_request, initial_comment_continuation, parse_comment_page, parse_video,
    reply_continuation, video_request,
};

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Errors raised while building requests or decoding responses
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid video identifier: {0}")]
    InvalidVideoId(String),

    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse comment #{index}: {source}")]
    Comment {
        index: usize,
        source: serde_json::Error,
    },
}

/// Transport-level failures
#[derive(Debug, Error)]
pub enum TransportError {
    /// Every connection is busy; the request was never sent
    #[error("No free connections available")]
    NoFreeConnections,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request failed: {0}")]
    Failed(String),
}

impl TransportError {
    /// Returns true if sending the same request again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoFreeConnections)
    }
}

/// A request to the comment gateway, relative to its base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Returns the first query value stored under `name`
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path.trim_start_matches('/'))?;
        if !self.query.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.query)
                .finish();
            write!(f, "?{}", query)?;
        }
        Ok(())
    }
}

/// A raw gateway response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to the comment gateway
///
/// Implementations must report connection-pool exhaustion as
/// `TransportError::NoFreeConnections` so callers can back off and retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}
