//! Scripted transport for exercising the crawler without sockets

use crate::api::{ApiRequest, ApiResponse, Transport, TransportError};
use crate::crawler::{PageFetcher, RetryPolicy};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Transport answering from canned responses
///
/// Comment requests are keyed by their continuation cursor, everything else
/// by request path. Unknown keys answer 404.
#[derive(Debug, Default)]
pub struct FixtureTransport {
    responses: HashMap<String, ApiResponse>,
    busy: Mutex<HashMap<String, u32>>,
    broken: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn video(mut self, id: &str, cursor: Option<&str>) -> Self {
        let body = json!({"id": id, "title": format!("Video {}", id), "commentsContinuation": cursor});
        self.responses
            .insert(format!("api/videos/{}", id), ApiResponse::new(200, body.to_string()));
        self
    }

    pub fn page(mut self, cursor: &str, body: Value) -> Self {
        self.responses
            .insert(cursor.to_string(), ApiResponse::new(200, body.to_string()));
        self
    }

    pub fn status(mut self, key: &str, status: u16) -> Self {
        self.responses
            .insert(key.to_string(), ApiResponse::new(status, ""));
        self
    }

    /// Fails the next `times` requests for `key` with `NoFreeConnections`
    pub fn busy(self, key: &str, times: u32) -> Self {
        self.busy.lock().unwrap().insert(key.to_string(), times);
        self
    }

    /// Fails every request for `key` with a permanent transport error
    pub fn broken(mut self, key: &str) -> Self {
        self.broken.insert(key.to_string());
        self
    }

    /// Keys of all requests received, in arrival order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, key: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|k| *k == key).count()
    }

    fn key(request: &ApiRequest) -> String {
        request
            .query_value("continuation")
            .map(str::to_string)
            .unwrap_or_else(|| request.path.trim_start_matches('/').to_string())
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let key = Self::key(request);
        self.calls.lock().unwrap().push(key.clone());

        // Let sibling branches interleave like they would on a real socket
        tokio::task::yield_now().await;

        if let Some(remaining) = self.busy.lock().unwrap().get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TransportError::NoFreeConnections);
            }
        }
        if self.broken.contains(&key) {
            return Err(TransportError::Failed(format!("connection reset: {}", key)));
        }

        Ok(self
            .responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| ApiResponse::new(404, "")))
    }
}

pub fn comment(id: &str, text: &str) -> Value {
    json!({"id": id, "author": "tester", "text": text})
}

pub fn comment_with_replies(id: &str, text: &str, replies: &str) -> Value {
    json!({"id": id, "author": "tester", "text": text, "repliesContinuation": replies})
}

pub fn page(comments: Vec<Value>, next: Option<&str>) -> Value {
    json!({"comments": comments, "nextContinuation": next})
}

pub fn live_page(comments: Vec<Value>, new_comments: Option<&str>) -> Value {
    json!({"comments": comments, "newCommentsContinuation": new_comments})
}

pub fn create_fetcher(transport: &Arc<FixtureTransport>) -> Arc<PageFetcher> {
    Arc::new(PageFetcher::new(
        transport.clone(),
        RetryPolicy::immediate(5),
    ))
}
