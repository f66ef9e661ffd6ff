//! Output module for writing comment records and job statistics
//!
//! This module handles:
//! - Writing serialized comments as newline-delimited JSON
//! - Snapshotting and printing per-job statistics

pub mod stats;

pub use stats::{log_progress, print_statistics, JobStats};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Writes every record from `records` to `writer`, one per line
///
/// Records are expected to be single-line JSON documents as produced by the
/// comment streams. The writer is flushed after each burst of records and once
/// more when the channel closes.
///
/// # Returns
///
/// * `Ok(u64)` - Number of records written
/// * `Err(io::Error)` - The writer failed; remaining records are dropped
pub async fn write_records<W>(
    mut records: mpsc::Receiver<Vec<u8>>,
    mut writer: W,
) -> std::io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;

    while let Some(record) = records.recv().await {
        writer.write_all(&record).await?;
        writer.write_all(b"\n").await?;
        written += 1;

        // Keep writing while records are queued, flush once the channel is idle
        if records.is_empty() {
            writer.flush().await?;
        }
    }

    writer.flush().await?;
    Ok(written)
}
