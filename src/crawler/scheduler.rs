//! Scheduler for running many video comment streams at once
//!
//! This module handles:
//! - Tracking the set of running jobs for introspection
//! - Launching one comment stream task per job
//! - Logging job failures without propagating them
//! - Cancelling running jobs

use crate::api::HttpTransport;
use crate::config::Config;
use crate::crawler::backoff::RetryPolicy;
use crate::crawler::coordinator::{stream_comments, StreamSettings};
use crate::crawler::fetcher::PageFetcher;
use crate::model::Job;
use crate::RippleError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifier the scheduler assigns to each scheduled job
pub type JobId = u64;

type JobTable = Mutex<HashMap<JobId, Arc<Job>>>;

/// A scheduled job and the task streaming it
#[derive(Debug)]
pub struct JobHandle {
    pub id: JobId,
    pub job: Arc<Job>,
    task: JoinHandle<()>,
}

impl JobHandle {
    /// Waits until the job has finished and left the active set
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            tracing::error!(video = %self.job.video_id(), error = %e, "Comment stream task panicked");
        }
    }

    pub fn cancel(&self) {
        self.job.cancel();
    }
}

/// Scheduler tracks and runs video comment jobs
///
/// The job table is guarded by a single mutex; it is touched once when a job
/// starts and once when it ends, never per comment.
pub struct Scheduler {
    fetcher: Arc<PageFetcher>,
    settings: StreamSettings,
    jobs: Arc<JobTable>,
    next_id: AtomicU64,
}

impl Scheduler {
    pub fn new(fetcher: Arc<PageFetcher>, settings: StreamSettings) -> Self {
        Self {
            fetcher,
            settings,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Builds a scheduler talking HTTP to the configured gateway
    pub fn from_config(config: &Config) -> Result<Self, RippleError> {
        let transport = HttpTransport::new(&config.client)?;
        let fetcher = PageFetcher::new(Arc::new(transport), RetryPolicy::from(&config.retry));
        Ok(Self::new(
            Arc::new(fetcher),
            StreamSettings::from(&config.stream),
        ))
    }

    /// Starts streaming `job` into `out`
    ///
    /// The job is in the active set before its task starts and leaves it once
    /// the stream has ended, successfully or not. Must be called from within a
    /// Tokio runtime.
    pub fn schedule(&self, job: Job, out: mpsc::Sender<Vec<u8>>) -> JobHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let job = Arc::new(job);
        lock(&self.jobs).insert(id, Arc::clone(&job));

        let fetcher = Arc::clone(&self.fetcher);
        let settings = self.settings.clone();
        let jobs = Arc::clone(&self.jobs);
        let streamed = Arc::clone(&job);

        let task = tokio::spawn(async move {
            match stream_comments(fetcher, Arc::clone(&streamed), out, &settings).await {
                Ok(()) => tracing::info!(
                    video = %streamed.video_id(),
                    pages = streamed.pages(),
                    items = streamed.items(),
                    "Finished streaming comments"
                ),
                Err(RippleError::Cancelled(_)) => {
                    tracing::info!(video = %streamed.video_id(), "Comment stream cancelled")
                }
                Err(e) => tracing::error!(
                    video = %streamed.video_id(),
                    error = %e,
                    "Failed to stream comments of video"
                ),
            }
            lock(&jobs).remove(&id);
        });

        JobHandle { id, job, task }
    }

    /// Returns the jobs currently streaming, ordered by id
    pub fn active_jobs(&self) -> Vec<(JobId, Arc<Job>)> {
        let mut jobs: Vec<_> = lock(&self.jobs)
            .iter()
            .map(|(id, job)| (*id, Arc::clone(job)))
            .collect();
        jobs.sort_by_key(|(id, _)| *id);
        jobs
    }

    pub fn active_count(&self) -> usize {
        lock(&self.jobs).len()
    }

    /// Cancels one job; returns false if it is not running
    pub fn cancel(&self, id: JobId) -> bool {
        match lock(&self.jobs).get(&id) {
            Some(job) => {
                job.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels every running job
    pub fn cancel_all(&self) {
        for job in lock(&self.jobs).values() {
            job.cancel();
        }
    }
}

/// A panicking job task cannot leave the table half-updated, so poisoning is ignored
fn lock(jobs: &JobTable) -> MutexGuard<'_, HashMap<JobId, Arc<Job>>> {
    jobs.lock().unwrap_or_else(PoisonError::into_inner)
}
