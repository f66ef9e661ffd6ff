//! Request builders and response parsers for the comment gateway
//!
//! The gateway speaks JSON:
//! - `GET /api/videos/{id}` returns `{"id", "title", "commentsContinuation"}`
//! - `GET /api/comments?continuation=…` returns
//!   `{"comments": [...], "nextContinuation", "newCommentsContinuation"}`

use crate::api::{ApiError, ApiRequest, ApiResponse};
use crate::model::{Comment, CommentPage, ContinuationToken, Video};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVideo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    comments_continuation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCommentPage {
    #[serde(default)]
    comments: Vec<serde_json::Value>,
    #[serde(default)]
    next_continuation: Option<String>,
    #[serde(default)]
    new_comments_continuation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawComment {
    id: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    author_id: Option<String>,
    text: String,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    reply_count: u64,
    #[serde(default)]
    replies_continuation: Option<String>,
}

/// Drops empty cursors, which the gateway sends instead of null at times
fn non_empty(cursor: Option<String>) -> Option<String> {
    cursor.filter(|c| !c.is_empty())
}

/// Builds the request resolving a video
pub fn video_request(video_id: &str) -> ApiRequest {
    ApiRequest::new(format!("api/videos/{}", video_id))
}

/// Parses the video lookup response
pub fn parse_video(video_id: &str, response: &ApiResponse) -> Result<Video, ApiError> {
    let raw: RawVideo = serde_json::from_str(&response.body)?;
    Ok(Video {
        id: video_id.to_string(),
        title: raw.title,
        comments_continuation: non_empty(raw.comments_continuation),
    })
}

/// Returns the token of the first top-level comment page, if comments are enabled
pub fn initial_comment_continuation(video: &Video) -> Option<ContinuationToken> {
    video
        .comments_continuation
        .as_ref()
        .map(|cursor| ContinuationToken::top_level(&video.id, cursor))
}

/// Returns the token of a comment's reply thread, if it has one
pub fn reply_continuation(comment: &Comment) -> Option<ContinuationToken> {
    comment
        .replies_continuation
        .as_ref()
        .map(|cursor| ContinuationToken::replies(&comment.video_id, cursor, &comment.id))
}

/// Builds the request fetching the page `token` points at
pub fn comment_page_request(token: &ContinuationToken) -> ApiRequest {
    ApiRequest::new("api/comments").with_query("continuation", &token.cursor)
}

/// Parses one comment page
///
/// A malformed page is an error. A malformed comment is recorded in
/// `parse_errors` and the rest of the page is kept.
pub fn parse_comment_page(
    response: &ApiResponse,
    token: &ContinuationToken,
) -> Result<CommentPage, ApiError> {
    let raw: RawCommentPage = serde_json::from_str(&response.body)?;

    let mut page = CommentPage {
        comments: Vec::with_capacity(raw.comments.len()),
        next: non_empty(raw.next_continuation).map(|cursor| token.advance(cursor)),
        new_comments: non_empty(raw.new_comments_continuation)
            .map(|cursor| ContinuationToken::top_level(&token.video_id, cursor)),
        parse_errors: Vec::new(),
    };

    for (index, value) in raw.comments.into_iter().enumerate() {
        match serde_json::from_value::<RawComment>(value) {
            Ok(raw) => page.comments.push(Comment {
                id: raw.id,
                video_id: token.video_id.clone(),
                parent_id: token.parent_id.clone(),
                author: raw.author,
                author_id: raw.author_id,
                text: raw.text,
                published: raw.published,
                likes: raw.likes,
                reply_count: raw.reply_count,
                replies_continuation: non_empty(raw.replies_continuation),
            }),
            Err(source) => page.parse_errors.push(ApiError::Comment { index, source }),
        }
    }

    Ok(page)
}
