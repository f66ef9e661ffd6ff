//! Comment-Ripple: streams every comment of a video, replies included
//!
//! A video job resolves the video, picks a traversal strategy for the requested
//! sort order and walks the comment tree concurrently, one task per reply thread.
//! Every comment is serialized onto the caller's output channel as it arrives.

pub mod api;
pub mod config;
pub mod crawler;
pub mod model;
pub mod output;

use thiserror::Error;

/// Job-level error type for Comment-Ripple operations
///
/// Only setup failures surface here. Failures inside a single reply thread are
/// logged where they happen and never fail the job.
#[derive(Debug, Error)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upstream API error: {0}")]
    Api(#[from] api::ApiError),

    #[error("Failed to fetch video {video}: {source}")]
    VideoFetch {
        video: String,
        source: crawler::FetchError,
    },

    #[error("Failed to request comments of video {0}: no comment continuation")]
    CommentsUnavailable(String),

    #[error("Unknown sort order: {0}")]
    UnknownSortOrder(String),

    #[error("Failed to serialize comment {id}: {source}")]
    Serialize {
        id: String,
        source: serde_json::Error,
    },

    #[error("Output channel closed before video {0} finished streaming")]
    OutputClosed(String),

    #[error("Comment stream of video {0} cancelled")]
    Cancelled(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Comment-Ripple operations
pub type Result<T> = std::result::Result<T, RippleError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{PageFetcher, Scheduler};
pub use model::{Comment, CommentPage, ContinuationToken, Job, SortOrder, Video};
