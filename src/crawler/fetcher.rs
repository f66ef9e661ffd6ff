//! Page fetcher implementation
//!
//! This module issues every request the crawler makes, including:
//! - Retrying pool exhaustion with exponential backoff
//! - Classifying the outcome (retryable, permanent, limit reached)
//! - Parsing comment pages and logging per-comment parse failures
//! - Updating the owning job's counters

use crate::api::{self, ApiError, ApiRequest, ApiResponse, Transport, TransportError};
use crate::crawler::backoff::RetryPolicy;
use crate::model::{CommentPage, ContinuationToken, Job, Video};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Status codes the gateway uses to refuse an oversized continuation
const LIMIT_STATUSES: [u16; 2] = [413, 414];

/// Outcome of a failed fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// The gateway refused the continuation as too large; the thread is truncated here
    #[error("Continuation limit reached")]
    LimitReached,

    #[error("Retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        source: TransportError,
    },

    #[error("Transport error: {0}")]
    Transport(TransportError),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Failed to parse response: {0}")]
    Api(#[from] ApiError),

    #[error("Cancelled")]
    Cancelled,
}

impl FetchError {
    /// Returns true if the error marks a truncated thread rather than a failure
    pub fn is_limit_reached(&self) -> bool {
        matches!(self, Self::LimitReached)
    }
}

/// Fetches videos and comment pages through an injected transport
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl PageFetcher {
    pub fn new(transport: Arc<dyn Transport>, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// Fetches and parses the video record
    pub async fn fetch_video(
        &self,
        video_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Video, FetchError> {
        let response = self.execute(&api::video_request(video_id), cancel).await?;
        check_status(&response)?;
        Ok(api::parse_video(video_id, &response)?)
    }

    /// Fetches the page `token` points at on behalf of `job`
    ///
    /// `index` is the page's position within its thread, `None` for the
    /// priming fetch of the age and live strategies.
    pub async fn fetch_page(
        &self,
        job: &Job,
        token: &ContinuationToken,
        index: Option<u64>,
    ) -> Result<CommentPage, FetchError> {
        let request = api::comment_page_request(token);
        let response = self.execute(&request, job.cancellation_token()).await?;
        check_status(&response)?;

        let page = api::parse_comment_page(&response, token)?;
        for err in &page.parse_errors {
            tracing::error!(video = %job.video_id(), error = %err, "Failed to parse comment");
        }

        if token.is_reply_thread() {
            tracing::info!(
                video = %job.video_id(),
                index,
                parent_id = token.parent_id.as_deref(),
                "Sub page"
            );
        } else {
            tracing::info!(video = %job.video_id(), index, "Page");
        }

        job.record_page(page.comments.len());
        Ok(page)
    }

    /// Sends a request, retrying while the transport has no free connection
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | No free connections | Back off, retry until the budget is spent |
    /// | Any other transport error | Immediate → Transport |
    /// | Budget spent | RetriesExhausted |
    /// | Job cancelled | Cancelled, also while sleeping |
    async fn execute(
        &self,
        request: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse, FetchError> {
        let started = Instant::now();
        let mut retry = 0;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                outcome = self.transport.send(request) => outcome,
            };

            match outcome {
                Ok(response) => {
                    if retry > 0 {
                        tracing::debug!(attempt = retry + 1, "Request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(err) if err.is_retryable() => {
                    retry += 1;
                    if !self.retry.allows(retry, started.elapsed()) {
                        return Err(FetchError::RetriesExhausted {
                            attempts: retry,
                            source: err,
                        });
                    }

                    let delay = self.retry.delay(retry);
                    tracing::warn!(
                        error = %err,
                        attempt = retry,
                        delay_ms = delay.as_millis() as u64,
                        "No free connections, throttling"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(err) => return Err(FetchError::Transport(err)),
            }
        }
    }
}

/// Maps non-success statuses to fetch errors
fn check_status(response: &ApiResponse) -> Result<(), FetchError> {
    if LIMIT_STATUSES.contains(&response.status) {
        return Err(FetchError::LimitReached);
    }
    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }
    Ok(())
}
