//! Shared helpers for the integration tests

use comment_ripple::config::Config;
use comment_ripple::Comment;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock gateway
pub fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.client.base_url = base_url.to_string();
    config.client.timeout_ms = 5_000;
    config.retry.initial_interval_ms = 1;
    config.retry.max_interval_ms = 5;
    config.retry.max_retries = 3;
    config.stream.channel_capacity = 4;
    config.stream.live_poll_interval_ms = 1;
    config
}

pub fn comment_json(id: &str, text: &str) -> Value {
    json!({"id": id, "author": "someone", "text": text})
}

pub fn thread_json(id: &str, text: &str, replies: &str) -> Value {
    json!({"id": id, "author": "someone", "text": text, "replyCount": 2, "repliesContinuation": replies})
}

/// Mounts the video lookup for `id`
pub async fn mount_video(server: &MockServer, id: &str, continuation: Option<&str>) {
    Mock::given(method("GET"))
        .and(path(format!("/api/videos/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "title": "Test video",
            "commentsContinuation": continuation,
        })))
        .mount(server)
        .await;
}

/// Mounts one comment page answering `continuation`
pub async fn mount_page(
    server: &MockServer,
    continuation: &str,
    comments: Vec<Value>,
    next: Option<&str>,
    new_comments: Option<&str>,
) {
    Mock::given(method("GET"))
        .and(path("/api/comments"))
        .and(query_param("continuation", continuation))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "comments": comments,
            "nextContinuation": next,
            "newCommentsContinuation": new_comments,
        })))
        .mount(server)
        .await;
}

/// Mounts a bare status answering `continuation`
pub async fn mount_status(server: &MockServer, continuation: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path("/api/comments"))
        .and(query_param("continuation", continuation))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Drains serialized records until every sender is gone
pub async fn collect_comments(mut records: mpsc::Receiver<Vec<u8>>) -> Vec<Comment> {
    let mut comments = Vec::new();
    while let Some(record) = records.recv().await {
        comments.push(serde_json::from_slice(&record).expect("record is a comment"));
    }
    comments
}

pub fn sorted_texts(comments: &[Comment]) -> Vec<String> {
    let mut texts: Vec<_> = comments.iter().map(|c| c.text.clone()).collect();
    texts.sort();
    texts
}
