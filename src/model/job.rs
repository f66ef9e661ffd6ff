//! Job definitions for tracking one video's comment stream
//!
//! A job is shared by every traversal branch of its video, so all mutable
//! state lives behind atomics.
use crate::RippleError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Order in which the comments of a video are traversed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Walk the existing comment tree once, relevance ranked
    Top,

    /// Re-base on the newest-first feed, then walk it once
    Age,

    /// Keep polling the newest-first feed for fresh comments
    Live,
}

impl SortOrder {
    /// Returns the lowercase name used on the command line and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Age => "age",
            Self::Live => "live",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = RippleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Self::Top),
            "age" => Ok(Self::Age),
            "live" => Ok(Self::Live),
            other => Err(RippleError::UnknownSortOrder(other.to_string())),
        }
    }
}

/// One requested video comment stream
///
/// Counters are only ever incremented, from any branch of the job.
#[derive(Debug)]
pub struct Job {
    video_id: String,
    sort: SortOrder,
    pages: AtomicU64,
    items: AtomicU64,
    branches: AtomicUsize,
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
}

impl Job {
    /// Creates a new job for a video identifier (or URL) and sort order
    pub fn new(video_id: impl Into<String>, sort: SortOrder) -> Self {
        Self {
            video_id: video_id.into(),
            sort,
            pages: AtomicU64::new(0),
            items: AtomicU64::new(0),
            branches: AtomicUsize::new(0),
            started_at: Utc::now(),
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a job from a textual sort order
    ///
    /// Fails with `UnknownSortOrder` before anything touches the network.
    pub fn parse(video_id: impl Into<String>, sort: &str) -> Result<Self, RippleError> {
        Ok(Self::new(video_id, sort.parse()?))
    }

    /// The video identifier as given by the caller
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    /// Number of pages fetched so far, across all branches
    pub fn pages(&self) -> u64 {
        self.pages.load(Ordering::Relaxed)
    }

    /// Number of comments fetched so far, across all branches
    pub fn items(&self) -> u64 {
        self.items.load(Ordering::Relaxed)
    }

    /// Number of traversal branches currently running
    pub fn active_branches(&self) -> usize {
        self.branches.load(Ordering::Acquire)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Records one fetched page holding `comments` comments
    pub fn record_page(&self, comments: usize) {
        self.pages.fetch_add(1, Ordering::Relaxed);
        self.items.fetch_add(comments as u64, Ordering::Relaxed);
    }

    /// Registers a running branch; it is unregistered when the guard drops
    pub fn enter_branch(self: &Arc<Self>) -> BranchGuard {
        self.branches.fetch_add(1, Ordering::AcqRel);
        BranchGuard {
            job: Arc::clone(self),
        }
    }

    /// Asks every branch of this job to stop
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Keeps a job's branch count raised while a traversal branch runs
#[derive(Debug)]
pub struct BranchGuard {
    job: Arc<Job>,
}

impl Drop for BranchGuard {
    fn drop(&mut self) {
        self.job.branches.fetch_sub(1, Ordering::AcqRel);
    }
}
