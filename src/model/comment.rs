use crate::api::ApiError;
use serde::{Deserialize, Serialize};

/// Cursor for the next page of one comment thread
///
/// A token belongs to exactly one in-flight fetch at a time. `parent_id` is
/// `None` for the top-level feed and names the parent comment for a reply thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContinuationToken {
    pub video_id: String,
    pub cursor: String,
    pub parent_id: Option<String>,
}

impl ContinuationToken {
    /// Creates a token for the top-level comment feed of a video
    pub fn top_level(video_id: impl Into<String>, cursor: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            cursor: cursor.into(),
            parent_id: None,
        }
    }

    /// Creates a token for the reply thread of `parent_id`
    pub fn replies(
        video_id: impl Into<String>,
        cursor: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            cursor: cursor.into(),
            parent_id: Some(parent_id.into()),
        }
    }

    /// Returns the token for the following page of the same thread
    pub fn advance(&self, cursor: impl Into<String>) -> Self {
        Self {
            video_id: self.video_id.clone(),
            cursor: cursor.into(),
            parent_id: self.parent_id.clone(),
        }
    }

    pub fn is_reply_thread(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Minimal resolved video record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: Option<String>,
    /// Cursor of the first top-level comment page, absent when comments are disabled
    pub comments_continuation: Option<String>,
}

/// One comment, serialized as one output record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub video_id: String,
    pub parent_id: Option<String>,
    pub author: String,
    pub author_id: Option<String>,
    pub text: String,
    pub published: Option<String>,
    pub likes: u64,
    pub reply_count: u64,
    #[serde(skip)]
    pub replies_continuation: Option<String>,
}

/// One fetched page of a comment thread
#[derive(Debug, Default)]
pub struct CommentPage {
    pub comments: Vec<Comment>,

    /// Next page of the same thread, if any
    pub next: Option<ContinuationToken>,

    /// Newest-first top-level feed, used by the age and live strategies
    pub new_comments: Option<ContinuationToken>,

    /// Comments on this page that failed to parse
    pub parse_errors: Vec<ApiError>,
}
