//! Statistics snapshots of running and finished jobs
//!
//! This module provides functionality for reading a job's live counters
//! and displaying them. Standard output carries the comment records, so
//! everything here goes to the log or to standard error.

use crate::crawler::JobId;
use crate::model::{Job, SortOrder};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Point-in-time statistics of one job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStats {
    /// Scheduler id, if the job was scheduled
    pub id: Option<JobId>,

    /// Video identifier as the job was created with
    pub video_id: String,

    pub sort: SortOrder,

    /// Pages fetched so far, reply pages included
    pub pages: u64,

    /// Comments seen on those pages
    pub items: u64,

    /// Branches still walking
    pub active_branches: usize,

    pub started_at: DateTime<Utc>,

    /// Seconds since the job was created
    pub elapsed_secs: f64,
}

impl JobStats {
    /// Snapshots the counters of `job`
    pub fn from_job(id: Option<JobId>, job: &Job) -> Self {
        let elapsed = Utc::now() - job.started_at();

        Self {
            id,
            video_id: job.video_id().to_string(),
            sort: job.sort(),
            pages: job.pages(),
            items: job.items(),
            active_branches: job.active_branches(),
            started_at: job.started_at(),
            elapsed_secs: elapsed.num_milliseconds().max(0) as f64 / 1000.0,
        }
    }

    /// Comments per second since the job started
    pub fn items_per_sec(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            self.items as f64 / self.elapsed_secs
        } else {
            0.0
        }
    }
}

/// Logs one progress line per job
pub fn log_progress(stats: &[JobStats]) {
    for stat in stats {
        tracing::info!(
            job = stat.id,
            video = %stat.video_id,
            sort = %stat.sort,
            pages = stat.pages,
            items = stat.items,
            branches = stat.active_branches,
            "Progress"
        );
    }
}

/// Prints statistics to stderr in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display, one entry per job
pub fn print_statistics(stats: &[JobStats]) {
    eprintln!("=== Comment Statistics ===\n");

    for stat in stats {
        eprintln!("Video {} ({}):", stat.video_id, stat.sort);
        eprintln!("  Pages fetched: {}", stat.pages);
        eprintln!("  Comments: {}", stat.items);
        eprintln!(
            "  Elapsed: {:.1}s ({:.1} comments/s)",
            stat.elapsed_secs,
            stat.items_per_sec()
        );
        if stat.active_branches > 0 {
            eprintln!("  Unfinished branches: {}", stat.active_branches);
        }
        eprintln!();
    }

    let pages: u64 = stats.iter().map(|s| s.pages).sum();
    let items: u64 = stats.iter().map(|s| s.items).sum();
    eprintln!(
        "Total: {} comments on {} pages across {} videos",
        items,
        pages,
        stats.len()
    );
}
