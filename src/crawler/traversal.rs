//! Comment traversal - concurrent walks over a video's comment tree
//!
//! Every thread (the top-level feed or one comment's replies) is walked by its
//! own task. A walk that meets a comment with replies spawns a sibling task for
//! that reply thread, so the tree fans out as wide and as deep as it is.
//!
//! All branches of a job share one bounded comment channel. Each branch owns a
//! clone of the sender, so the channel closes exactly when the root branch and
//! every branch spawned from it, at any depth, has returned.

use crate::api;
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::model::{Comment, ContinuationToken, Job, SortOrder};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One job's traversal, cloned into every branch
#[derive(Clone)]
pub struct Traversal {
    fetcher: Arc<PageFetcher>,
    job: Arc<Job>,
    comments: mpsc::Sender<Comment>,
    live_poll_interval: Duration,
}

impl Traversal {
    pub fn new(
        fetcher: Arc<PageFetcher>,
        job: Arc<Job>,
        comments: mpsc::Sender<Comment>,
        live_poll_interval: Duration,
    ) -> Self {
        Self {
            fetcher,
            job,
            comments,
            live_poll_interval,
        }
    }

    /// Starts the root branch for the job's sort order
    ///
    /// Consumes the traversal so that no sender outlives the branches.
    pub fn start(self, token: ContinuationToken) -> JoinHandle<()> {
        let guard = self.job.enter_branch();
        tokio::spawn(async move {
            match self.job.sort() {
                SortOrder::Top => self.walk(token).await,
                SortOrder::Age => self.walk_new(token).await,
                SortOrder::Live => self.walk_live(token).await,
            }
            // Release the branch count before the sender closes
            drop(guard);
            drop(self);
        })
    }

    fn spawn_branch(&self, token: ContinuationToken) {
        let branch = self.clone();
        let guard = self.job.enter_branch();
        tokio::spawn(async move {
            branch.walk(token).await;
            drop(guard);
            drop(branch);
        });
    }

    /// Walks one thread page by page until it is exhausted
    async fn walk(&self, mut token: ContinuationToken) {
        let mut index = 0;
        let result = loop {
            if self.job.is_cancelled() {
                break Err(FetchError::Cancelled);
            }

            let page = match self.fetcher.fetch_page(&self.job, &token, Some(index)).await {
                Ok(page) => page,
                Err(err) => break Err(err),
            };
            if !self.dispatch(page.comments).await {
                break Err(FetchError::Cancelled);
            }

            match page.next {
                Some(next) => token = next,
                None => break Ok(()),
            }
            index += 1;
        };

        self.finish(&token, result);
    }

    /// Re-bases on the newest-first feed, then walks it once
    async fn walk_new(&self, token: ContinuationToken) {
        if let Some(token) = self.prime(&token).await {
            self.walk(token).await;
        }
    }

    /// Polls the newest-first feed until it runs dry or the job is cancelled
    ///
    /// Nothing remembers what was already emitted, so a comment the gateway
    /// returns again in a later window is emitted again.
    async fn walk_live(&self, token: ContinuationToken) {
        let Some(mut token) = self.prime(&token).await else {
            return;
        };

        let mut index = 0;
        let result = loop {
            if self.job.is_cancelled() {
                break Err(FetchError::Cancelled);
            }

            let page = match self.fetcher.fetch_page(&self.job, &token, Some(index)).await {
                Ok(page) => page,
                Err(err) => break Err(err),
            };
            let next = page.new_comments;
            if !self.dispatch(page.comments).await {
                break Err(FetchError::Cancelled);
            }

            match next {
                Some(next) => token = next,
                None => {
                    tracing::warn!(video = %self.job.video_id(), "Live feed ended without a new comments continuation");
                    break Ok(());
                }
            }
            index += 1;

            if !self.pause(self.live_poll_interval).await {
                break Err(FetchError::Cancelled);
            }
        };

        self.finish(&token, result);
    }

    /// Fetches the first page only for its newest-first continuation
    async fn prime(&self, token: &ContinuationToken) -> Option<ContinuationToken> {
        match self.fetcher.fetch_page(&self.job, token, None).await {
            Ok(page) => {
                if page.new_comments.is_none() {
                    tracing::error!(video = %self.job.video_id(), "Comment stream aborted: no new comments continuation");
                }
                page.new_comments
            }
            Err(err) => {
                self.finish(token, Err(err));
                None
            }
        }
    }

    /// Spawns reply walks and emits the comments of one page
    ///
    /// Returns false once the job is cancelled or nobody reads the channel.
    async fn dispatch(&self, comments: Vec<Comment>) -> bool {
        for comment in comments {
            if let Some(replies) = api::reply_continuation(&comment) {
                self.spawn_branch(replies);
            }
            if !self.emit(comment).await {
                return false;
            }
        }
        true
    }

    async fn emit(&self, comment: Comment) -> bool {
        tokio::select! {
            biased;
            _ = self.job.cancellation_token().cancelled() => false,
            sent = self.comments.send(comment) => sent.is_ok(),
        }
    }

    async fn pause(&self, interval: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.job.cancellation_token().cancelled() => false,
            _ = tokio::time::sleep(interval) => true,
        }
    }

    fn finish(&self, token: &ContinuationToken, result: Result<(), FetchError>) {
        let video = self.job.video_id();
        let parent_id = token.parent_id.as_deref();
        match result {
            Ok(()) => tracing::debug!(video, parent_id, "Thread exhausted"),
            Err(FetchError::Cancelled) => tracing::debug!(video, parent_id, "Comment stream stopped"),
            Err(err) if err.is_limit_reached() => {
                tracing::warn!(video, parent_id, "Continuation limit reached")
            }
            Err(err) => tracing::error!(video, parent_id, error = %err, "Comment stream aborted"),
        }
    }
}
