//! Video comment stream - per-job orchestration
//!
//! This module sets up and drains the traversal of one video:
//! - Resolving the video identifier and fetching the video
//! - Deriving the first continuation
//! - Starting the traversal for the job's sort order
//! - Serializing every comment onto the job's output channel

use crate::api;
use crate::config::StreamConfig;
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::traversal::Traversal;
use crate::model::{Comment, Job};
use crate::RippleError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Per-job stream tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Capacity of the comment channel shared by all branches
    pub channel_capacity: usize,

    /// Pause between two polls in live mode
    pub live_poll_interval: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self::from(&StreamConfig::default())
    }
}

impl From<&StreamConfig> for StreamSettings {
    fn from(config: &StreamConfig) -> Self {
        Self {
            channel_capacity: config.channel_capacity.max(1),
            live_poll_interval: Duration::from_millis(config.live_poll_interval_ms),
        }
    }
}

/// Streams every comment of the job's video to `out`, one JSON record each
///
/// Setup failures (bad identifier, video fetch failure, comments disabled)
/// fail the job before any traversal starts. Once the traversal runs, failures
/// of single threads are logged where they happen and the job still returns
/// `Ok(())` when every branch has finished.
///
/// # Returns
///
/// * `Ok(())` - Every branch finished and every comment was written
/// * `Err(RippleError::Cancelled)` - The job was cancelled
/// * `Err(RippleError)` - Setup failed, or the output broke
pub async fn stream_comments(
    fetcher: Arc<PageFetcher>,
    job: Arc<Job>,
    out: mpsc::Sender<Vec<u8>>,
    settings: &StreamSettings,
) -> Result<(), RippleError> {
    let video_id = api::resolve_video_id(job.video_id())?;

    let video = fetcher
        .fetch_video(&video_id, job.cancellation_token())
        .await
        .map_err(|source| match source {
            FetchError::Cancelled => RippleError::Cancelled(video_id.clone()),
            source => RippleError::VideoFetch {
                video: video_id.clone(),
                source,
            },
        })?;

    let token = api::initial_comment_continuation(&video)
        .ok_or_else(|| RippleError::CommentsUnavailable(video_id.clone()))?;

    tracing::debug!(video = %video_id, sort = %job.sort(), "Starting comment traversal");

    let (tx, mut rx) = mpsc::channel(settings.channel_capacity);
    Traversal::new(fetcher, Arc::clone(&job), tx, settings.live_poll_interval).start(token);

    let forwarded = forward(&job, &video_id, &mut rx, &out).await;
    if forwarded.is_err() || job.is_cancelled() {
        job.cancel();
        // Cancelled branches stop on their own; wait so none outlives the job
        while rx.recv().await.is_some() {}
    }
    forwarded?;

    if job.is_cancelled() {
        return Err(RippleError::Cancelled(video_id));
    }
    Ok(())
}

/// Serializes comments onto `out` until the channel closes or the job is cancelled
async fn forward(
    job: &Job,
    video_id: &str,
    comments: &mut mpsc::Receiver<Comment>,
    out: &mpsc::Sender<Vec<u8>>,
) -> Result<(), RippleError> {
    while let Some(comment) = comments.recv().await {
        let record = serde_json::to_vec(&comment).map_err(|source| RippleError::Serialize {
            id: comment.id.clone(),
            source,
        })?;

        let sent = tokio::select! {
            biased;
            _ = job.cancellation_token().cancelled() => return Ok(()),
            sent = out.send(record) => sent,
        };
        if sent.is_err() {
            return Err(RippleError::OutputClosed(video_id.to_string()));
        }
    }
    Ok(())
}
