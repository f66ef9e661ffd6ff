//! Crawler module for streaming video comments
//!
//! This module contains the core crawling logic, including:
//! - Page fetching with retry and outcome classification
//! - Concurrent comment tree traversal, one task per reply thread
//! - Per-video stream orchestration
//! - Job scheduling, tracking and cancellation

mod backoff;
mod coordinator;
mod fetcher;
mod scheduler;
mod traversal;

#[cfg(test)]
pub(crate) mod testing;

pub use backoff::RetryPolicy;
pub use coordinator::{stream_comments, StreamSettings};
pub use fetcher::{FetchError, PageFetcher};
pub use scheduler::{JobHandle, JobId, Scheduler};
pub use traversal::Traversal;

use crate::config::Config;
use crate::model::Job;
use crate::RippleError;
use tokio::sync::mpsc;

/// Streams the comments of every job to `out` and waits for all of them
///
/// This is a convenience entry point for one-shot runs. It will:
/// 1. Build the HTTP transport and page fetcher from `config`
/// 2. Schedule one stream per job
/// 3. Wait until every job has finished
///
/// Individual job failures are logged by the scheduler and do not fail the run.
///
/// # Example
///
/// ```no_run
/// use comment_ripple::crawler::stream_all;
/// use comment_ripple::{Config, Job, SortOrder};
/// use tokio::sync::mpsc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (out, mut records) = mpsc::channel::<Vec<u8>>(64);
/// tokio::spawn(async move {
///     while let Some(record) = records.recv().await {
///         println!("{}", String::from_utf8_lossy(&record));
///     }
/// });
/// stream_all(&Config::default(), vec![Job::new("dQw4w9WgXcQ", SortOrder::Top)], out).await?;
/// # Ok(())
/// # }
/// ```
pub async fn stream_all(
    config: &Config,
    jobs: Vec<Job>,
    out: mpsc::Sender<Vec<u8>>,
) -> Result<(), RippleError> {
    let scheduler = Scheduler::from_config(config)?;
    let handles: Vec<JobHandle> = jobs
        .into_iter()
        .map(|job| scheduler.schedule(job, out.clone()))
        .collect();
    drop(out);

    for handle in handles {
        handle.wait().await;
    }
    Ok(())
}
