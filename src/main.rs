//! Comment-Ripple main entry point
//!
//! This is the command-line interface for the Comment-Ripple comment streamer.

use anyhow::Context;
use clap::Parser;
use comment_ripple::config::{load_config_with_hash, Config};
use comment_ripple::crawler::{JobHandle, Scheduler};
use comment_ripple::output::{log_progress, print_statistics, write_records, JobStats};
use comment_ripple::Job;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Comment-Ripple: streams every comment of a video
///
/// Comment-Ripple walks the comment tree of each video concurrently, reply
/// threads included, and writes every comment to stdout as one JSON object
/// per line.
#[derive(Parser, Debug)]
#[command(name = "comment-ripple")]
#[command(version)]
#[command(about = "Streams every comment of a video as NDJSON", long_about = None)]
struct Cli {
    /// Video ids or watch URLs
    #[arg(value_name = "VIDEO", required = true)]
    videos: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Sort order: top, age or live
    #[arg(short, long, default_value = "top")]
    sort: String,

    /// Seconds between two progress lines
    #[arg(long, default_value_t = 10)]
    progress_secs: u64,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    // Reject a bad sort order before anything touches the network
    let jobs = cli
        .videos
        .iter()
        .map(|video| Job::parse(video.as_str(), &cli.sort))
        .collect::<Result<Vec<_>, _>>()?;

    handle_stream(&config, jobs, Duration::from_secs(cli.progress_secs.max(1))).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries the comment records.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("comment_ripple=info,warn"),
            1 => EnvFilter::new("comment_ripple=debug,info"),
            2 => EnvFilter::new("comment_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Streams all jobs to stdout until they finish or Ctrl-C cancels them
async fn handle_stream(
    config: &Config,
    jobs: Vec<Job>,
    progress_every: Duration,
) -> anyhow::Result<()> {
    let scheduler = Scheduler::from_config(config)?;
    tracing::info!(
        videos = jobs.len(),
        gateway = %config.client.base_url,
        "Starting comment streams"
    );

    let (out, records) = mpsc::channel(config.stream.channel_capacity.max(1));
    let writer = tokio::spawn(write_records(records, tokio::io::stdout()));

    let handles: Vec<JobHandle> = jobs
        .into_iter()
        .map(|job| scheduler.schedule(job, out.clone()))
        .collect();
    drop(out);

    let tracked: Vec<_> = handles
        .iter()
        .map(|handle| (handle.id, Arc::clone(&handle.job)))
        .collect();

    let finished = async {
        for handle in handles {
            handle.wait().await;
        }
    };
    tokio::pin!(finished);

    let mut progress = tokio::time::interval(progress_every);
    progress.tick().await;
    let mut interrupted = false;

    loop {
        tokio::select! {
            _ = &mut finished => break,
            _ = progress.tick() => {
                let stats: Vec<_> = scheduler
                    .active_jobs()
                    .iter()
                    .map(|(id, job)| JobStats::from_job(Some(*id), job))
                    .collect();
                log_progress(&stats);
            }
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                match signal {
                    Ok(()) => {
                        tracing::warn!("Interrupted, cancelling {} jobs", scheduler.active_count());
                        scheduler.cancel_all();
                    }
                    Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
                }
            }
        }
    }

    let written = writer.await?.context("Failed to write comments to stdout")?;
    tracing::info!(records = written, "All comment streams finished");

    let stats: Vec<_> = tracked
        .iter()
        .map(|(id, job)| JobStats::from_job(Some(*id), job))
        .collect();
    print_statistics(&stats);

    Ok(())
}
