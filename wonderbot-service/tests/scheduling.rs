mod common;

use common::*;
use dedup_log::DedupLogs;
use std::time::Duration;
use wonderbot_core::{ConfigError, CoreError, RedditApiError};
use wonderbot_service::{BatchProcessor, Scheduler};

fn processor_with(forum: MockForum) -> BatchProcessor<MockForum> {
    let dir = test_log_dir();
    let logs = DedupLogs::open(&dir).unwrap();
    BatchProcessor::new(forum, test_config(dir), logs)
}

#[tokio::test]
async fn test_runs_passes_until_shutdown() {
    let forum = MockForum {
        comments: vec![comment("c1", "alice", "wonder")],
        ..MockForum::default()
    };
    let processor = processor_with(forum);
    let scheduler = Scheduler::new(Duration::from_millis(20));

    let result = scheduler
        .run(&processor, tokio::time::sleep(Duration::from_millis(70)))
        .await;
    assert!(result.is_ok());

    // Each pass fetches comments and submissions.
    let fetches = processor.client().fetch_count();
    assert!(fetches >= 2, "expected at least one pass, saw {} fetches", fetches);
    assert_eq!(fetches % 2, 0);
    // Repeated passes over the same window reply once.
    assert_eq!(processor.client().sent().len(), 1);
}

#[tokio::test]
async fn test_retryable_failures_keep_the_loop_alive() {
    let forum = MockForum {
        fetch_error: Some(|| {
            CoreError::RedditApi(RedditApiError::ServerError { status_code: 502 })
        }),
        ..MockForum::default()
    };
    let processor = processor_with(forum);
    let scheduler = Scheduler::new(Duration::from_millis(10));

    let result = scheduler
        .run(&processor, tokio::time::sleep(Duration::from_millis(60)))
        .await;
    assert!(result.is_ok());
    assert!(processor.client().fetch_count() >= 2);
}

#[tokio::test]
async fn test_fatal_failures_stop_the_loop() {
    let forum = MockForum {
        fetch_error: Some(|| {
            CoreError::Config(ConfigError::NoCredentials {
                tried: "login file, environment".to_string(),
            })
        }),
        ..MockForum::default()
    };
    let processor = processor_with(forum);
    let scheduler = Scheduler::new(Duration::from_millis(10));

    let result = scheduler
        .run(&processor, tokio::time::sleep(Duration::from_secs(30)))
        .await;
    assert!(matches!(result, Err(CoreError::Config(_))));
    assert_eq!(processor.client().fetch_count(), 1);
}
