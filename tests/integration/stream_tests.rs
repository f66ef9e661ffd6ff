//! End-to-end comment streams against a mock gateway

use crate::fixtures::*;
use comment_ripple::config::load_config;
use comment_ripple::crawler::stream_all;
use comment_ripple::output::write_records;
use comment_ripple::{Comment, Job, Scheduler, SortOrder};
use std::io::Write;
use tokio::sync::mpsc;
use wiremock::MockServer;

#[tokio::test]
async fn test_hello_thread_over_http() {
    let server = MockServer::start().await;
    mount_video(&server, "abc", Some("c0")).await;
    mount_page(&server, "c0", vec![thread_json("1", "hello", "r0")], None, None).await;
    mount_page(
        &server,
        "r0",
        vec![comment_json("1.1", "r1"), comment_json("1.2", "r2")],
        None,
        None,
    )
    .await;

    let scheduler = Scheduler::from_config(&create_test_config(&server.uri())).unwrap();
    let (out, records) = mpsc::channel(8);
    let handle = scheduler.schedule(Job::new("abc", SortOrder::Top), out);
    let job = handle.job.clone();

    let comments = collect_comments(records).await;
    handle.wait().await;

    assert_eq!(sorted_texts(&comments), vec!["hello", "r1", "r2"]);
    let replies: Vec<&Comment> = comments.iter().filter(|c| c.text != "hello").collect();
    assert!(replies.iter().all(|c| c.parent_id.as_deref() == Some("1")));
    assert_eq!(job.pages(), 2);
    assert_eq!(job.items(), 3);
    assert_eq!(job.active_branches(), 0);
    assert_eq!(scheduler.active_count(), 0);
}

#[tokio::test]
async fn test_follows_top_level_pages() {
    let server = MockServer::start().await;
    mount_video(&server, "abc", Some("c0")).await;
    mount_page(&server, "c0", vec![comment_json("1", "first")], Some("c1"), None).await;
    mount_page(&server, "c1", vec![comment_json("2", "second")], Some("c2"), None).await;
    mount_page(&server, "c2", vec![comment_json("3", "third")], None, None).await;

    let scheduler = Scheduler::from_config(&create_test_config(&server.uri())).unwrap();
    let (out, records) = mpsc::channel(8);
    let handle = scheduler.schedule(Job::new("abc", SortOrder::Top), out);

    let comments = collect_comments(records).await;
    handle.wait().await;

    let texts: Vec<_> = comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_limit_status_truncates_only_its_thread() {
    let server = MockServer::start().await;
    mount_video(&server, "abc", Some("c0")).await;
    mount_page(&server, "c0", vec![thread_json("1", "deep", "r0")], Some("c1"), None).await;
    mount_status(&server, "r0", 413).await;
    mount_page(&server, "c1", vec![comment_json("2", "after")], None, None).await;

    let scheduler = Scheduler::from_config(&create_test_config(&server.uri())).unwrap();
    let (out, records) = mpsc::channel(8);
    let handle = scheduler.schedule(Job::new("abc", SortOrder::Top), out);

    let comments = collect_comments(records).await;
    handle.wait().await;

    assert_eq!(sorted_texts(&comments), vec!["after", "deep"]);
}

#[tokio::test]
async fn test_age_rebases_on_new_comments() {
    let server = MockServer::start().await;
    mount_video(&server, "abc", Some("c0")).await;
    mount_page(&server, "c0", vec![comment_json("0", "ranked")], None, Some("n0")).await;
    mount_page(&server, "n0", vec![comment_json("1", "newest")], Some("n1"), None).await;
    mount_page(&server, "n1", vec![comment_json("2", "older")], None, None).await;

    let scheduler = Scheduler::from_config(&create_test_config(&server.uri())).unwrap();
    let (out, records) = mpsc::channel(8);
    let handle = scheduler.schedule(Job::new("abc", SortOrder::Age), out);
    let job = handle.job.clone();

    let comments = collect_comments(records).await;
    handle.wait().await;

    let texts: Vec<_> = comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["newest", "older"]);
    assert_eq!(job.pages(), 3);
}

#[tokio::test]
async fn test_comments_disabled_ends_job() {
    let server = MockServer::start().await;
    mount_video(&server, "abc", None).await;

    let scheduler = Scheduler::from_config(&create_test_config(&server.uri())).unwrap();
    let (out, records) = mpsc::channel(8);
    let handle = scheduler.schedule(Job::new("abc", SortOrder::Top), out);

    let comments = collect_comments(records).await;
    handle.wait().await;

    assert!(comments.is_empty());
    assert_eq!(scheduler.active_count(), 0);
}

#[tokio::test]
async fn test_cancel_live_stream() {
    let server = MockServer::start().await;
    mount_video(&server, "abc", Some("c0")).await;
    mount_page(&server, "c0", vec![], None, Some("n0")).await;
    mount_page(&server, "n0", vec![comment_json("1", "live")], None, Some("n0")).await;

    let scheduler = Scheduler::from_config(&create_test_config(&server.uri())).unwrap();
    let (out, mut records) = mpsc::channel::<Vec<u8>>(8);
    let handle = scheduler.schedule(Job::new("abc", SortOrder::Live), out);
    let job = handle.job.clone();

    for _ in 0..2 {
        let record = records.recv().await.expect("live comment");
        let comment: Comment = serde_json::from_slice(&record).unwrap();
        assert_eq!(comment.text, "live");
    }

    scheduler.cancel_all();
    let drain = tokio::spawn(async move { while records.recv().await.is_some() {} });
    handle.wait().await;
    drain.await.unwrap();

    assert!(job.is_cancelled());
    assert_eq!(job.active_branches(), 0);
    assert_eq!(scheduler.active_count(), 0);
}

#[tokio::test]
async fn test_stream_all_writes_ndjson() {
    let server = MockServer::start().await;
    mount_video(&server, "one", Some("a0")).await;
    mount_video(&server, "two", Some("b0")).await;
    mount_page(&server, "a0", vec![comment_json("1", "a")], None, None).await;
    mount_page(
        &server,
        "b0",
        vec![comment_json("2", "b"), comment_json("3", "c")],
        None,
        None,
    )
    .await;

    let (out, records) = mpsc::channel(4);
    let writer = tokio::spawn(async move {
        let mut buffer = Vec::new();
        let written = write_records(records, &mut buffer).await.unwrap();
        (written, buffer)
    });

    let jobs = vec![
        Job::new("one", SortOrder::Top),
        Job::new("https://www.youtube.com/watch?v=two", SortOrder::Top),
    ];
    stream_all(&create_test_config(&server.uri()), jobs, out)
        .await
        .unwrap();
    let (written, buffer) = writer.await.unwrap();

    assert_eq!(written, 3);
    let output = String::from_utf8(buffer).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 3);
    for line in lines {
        let comment: Comment = serde_json::from_str(line).unwrap();
        assert!(comment.video_id == "one" || comment.video_id == "two");
    }
}

#[tokio::test]
async fn test_config_file_drives_stream() {
    let server = MockServer::start().await;
    mount_video(&server, "abc", Some("c0")).await;
    mount_page(&server, "c0", vec![comment_json("1", "hello")], None, None).await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[client]
base-url = "{}"
user-agent = "ripple-test/1.0"

[retry]
initial-interval-ms = 1
max-interval-ms = 5

[stream]
channel-capacity = 2
"#,
        server.uri()
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.client.user_agent, "ripple-test/1.0");
    assert_eq!(config.stream.channel_capacity, 2);

    let (out, records) = mpsc::channel(4);
    let collector = tokio::spawn(collect_comments(records));
    stream_all(&config, vec![Job::new("abc", SortOrder::Top)], out)
        .await
        .unwrap();
    let comments = collector.await.unwrap();

    assert_eq!(sorted_texts(&comments), vec!["hello"]);
}
