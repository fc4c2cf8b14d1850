mod common;

use common::*;
use dedup_log::DedupLogs;
use std::fs;
use wonderbot_core::{Category, CoreError, RedditApiError};
use wonderbot_service::{BatchProcessor, Outcome};

fn processor_with(forum: MockForum) -> (BatchProcessor<MockForum>, DedupLogs) {
    let dir = test_log_dir();
    let logs = DedupLogs::open(&dir).unwrap();
    let processor = BatchProcessor::new(forum, test_config(dir), logs.clone());
    (processor, logs)
}

#[tokio::test]
async fn test_reply_once_per_comment() {
    let (processor, logs) = processor_with(MockForum::default());
    let item = comment("c1", "someuser", "I wonder if this works");

    let outcome = processor.process_item(&item).await.unwrap();
    assert_eq!(outcome, Outcome::Replied);

    let log_path = logs.for_category(Category::Comment).path().to_path_buf();
    assert_eq!(fs::read_to_string(&log_path).unwrap(), "c1\n");
    let sent = processor.client().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].fullname, "t1_c1");
    assert_eq!(sent[0].text, REPLY);

    // Same comment again: nothing written, nothing sent.
    let outcome = processor.process_item(&item).await.unwrap();
    assert_eq!(outcome, Outcome::AlreadyLogged);
    assert_eq!(fs::read_to_string(&log_path).unwrap(), "c1\n");
    assert_eq!(processor.client().sent().len(), 1);
}

#[tokio::test]
async fn test_own_items_are_never_answered() {
    let (processor, logs) = processor_with(MockForum::default());
    let item = comment("c2", BOT, "And I'm Tony Wonder");

    let outcome = processor.process_item(&item).await.unwrap();
    assert_eq!(outcome, Outcome::SkippedSelfAuthor);
    assert!(processor.client().sent().is_empty());
    assert!(!logs.for_category(Category::Comment).contains("c2"));
}

#[tokio::test]
async fn test_unmatched_items_leave_no_trace() {
    let (processor, logs) = processor_with(MockForum::default());
    let item = comment("c3", "someuser", "Nothing magical here");

    let outcome = processor.process_item(&item).await.unwrap();
    assert_eq!(outcome, Outcome::NotMatched);
    assert!(processor.client().sent().is_empty());
    assert!(!logs.for_category(Category::Comment).path().exists());
}

#[tokio::test]
async fn test_posts_match_on_title_or_body() {
    let (processor, logs) = processor_with(MockForum::default());

    let by_title = post("p1", "someuser", "Mr.Wonder strikes again", "");
    let by_body = post("p2", "someuser", "Magic", "He can work wonders");
    let neither = post("p3", "someuser", "Magic", "Illusions");

    assert_eq!(processor.process_item(&by_title).await.unwrap(), Outcome::Replied);
    assert_eq!(processor.process_item(&by_body).await.unwrap(), Outcome::Replied);
    assert_eq!(processor.process_item(&neither).await.unwrap(), Outcome::NotMatched);

    let submissions = logs.for_category(Category::Submission);
    assert!(submissions.contains("p1"));
    assert!(submissions.contains("p2"));
    assert!(!logs.for_category(Category::Comment).contains("p1"));

    let fullnames: Vec<String> = processor
        .client()
        .sent()
        .into_iter()
        .map(|r| r.fullname)
        .collect();
    assert_eq!(fullnames, vec!["t3_p1", "t3_p2"]);
}

#[tokio::test]
async fn test_id_is_logged_before_reply() {
    let dir = test_log_dir();
    let logs = DedupLogs::open(&dir).unwrap();
    let forum = MockForum {
        watched_logs: Some(logs.clone()),
        ..MockForum::default()
    };
    let processor = BatchProcessor::new(forum, test_config(dir), logs);

    processor
        .process_item(&comment("c4", "someuser", "I **wonder**"))
        .await
        .unwrap();

    assert_eq!(processor.client().sent()[0].was_logged, Some(true));
}

#[tokio::test]
async fn test_batch_counts_every_outcome() {
    let forum = MockForum {
        comments: vec![
            comment("c1", "alice", "I wonder if this works"),
            comment("c2", BOT, "I wonder too"),
            comment("c3", "bob", "no keyword"),
            comment("c1", "alice", "I wonder if this works"),
        ],
        ..MockForum::default()
    };
    let (processor, _logs) = processor_with(forum);

    let summary = processor.process_category(Category::Comment).await.unwrap();
    assert_eq!(summary.fetched, 4);
    assert_eq!(summary.replied, 1);
    assert_eq!(summary.skipped_self, 1);
    assert_eq!(summary.not_matched, 1);
    assert_eq!(summary.already_logged, 1);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_batch_respects_fetch_limit() {
    let comments = (0..15)
        .map(|i| comment(&format!("c{}", i), "someuser", "wonder"))
        .collect();
    let forum = MockForum {
        comments,
        ..MockForum::default()
    };
    let (processor, _logs) = processor_with(forum);

    let summary = processor.process_category(Category::Comment).await.unwrap();
    assert_eq!(summary.fetched, 10);
    assert_eq!(processor.client().sent().len(), 10);
}

#[tokio::test]
async fn test_failed_reply_does_not_stop_the_batch() {
    let forum = MockForum {
        comments: vec![
            comment("locked", "alice", "wonder"),
            comment("open", "bob", "wonder"),
        ],
        failing_replies: ["locked".to_string()].into_iter().collect(),
        ..MockForum::default()
    };
    let (processor, logs) = processor_with(forum);

    let summary = processor.process_category(Category::Comment).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.replied, 1);
    assert_eq!(processor.client().sent()[0].fullname, "t1_open");

    // The failed item stays logged, so it is not attempted again.
    assert!(logs.for_category(Category::Comment).contains("locked"));
    let again = processor.process_category(Category::Comment).await.unwrap();
    assert_eq!(again.already_logged, 2);
    assert_eq!(processor.client().sent().len(), 1);
}

#[tokio::test]
async fn test_log_write_failure_aborts_batch() {
    let dir = test_log_dir();
    let logs = DedupLogs::open(&dir).unwrap();
    // A directory in place of the log file makes every append fail.
    fs::create_dir_all(logs.for_category(Category::Comment).path()).unwrap();

    let forum = MockForum {
        comments: vec![
            comment("c1", "alice", "wonder"),
            comment("c2", "bob", "wonder"),
        ],
        ..MockForum::default()
    };
    let processor = BatchProcessor::new(forum, test_config(dir), logs);

    let result = processor.process_category(Category::Comment).await;
    assert!(matches!(result, Err(CoreError::DedupLog(_))));
    assert!(processor.client().sent().is_empty());
}

#[tokio::test]
async fn test_fetch_errors_propagate() {
    let forum = MockForum {
        fetch_error: Some(|| {
            CoreError::RedditApi(RedditApiError::ServerError { status_code: 503 })
        }),
        ..MockForum::default()
    };
    let (processor, _logs) = processor_with(forum);

    let result = processor.run_pass().await;
    assert!(matches!(
        result,
        Err(CoreError::RedditApi(RedditApiError::ServerError { status_code: 503 }))
    ));
}

#[tokio::test]
async fn test_pass_covers_both_categories() {
    let forum = MockForum {
        comments: vec![comment("c1", "alice", "I dig Wonder's act")],
        submissions: vec![post("p1", "bob", "WONDER", "")],
        ..MockForum::default()
    };
    let (processor, logs) = processor_with(forum);

    let summary = processor.run_pass().await.unwrap();
    assert_eq!(summary.comments.replied, 1);
    assert_eq!(summary.submissions.replied, 1);
    assert_eq!(summary.replied(), 2);
    assert!(logs.for_category(Category::Comment).contains("c1"));
    assert!(logs.for_category(Category::Submission).contains("p1"));

    // A second pass over the same window is a no-op.
    let summary = processor.run_pass().await.unwrap();
    assert_eq!(summary.replied(), 0);
    assert_eq!(processor.client().sent().len(), 2);
}

#[tokio::test]
async fn test_anonymous_authors_are_answered() {
    let (processor, _logs) = processor_with(MockForum::default());
    let item = wonderbot_core::Item::Comment {
        id: "anon".to_string(),
        author: None,
        body: "wonder".to_string(),
    };

    assert_eq!(processor.process_item(&item).await.unwrap(), Outcome::Replied);
}
