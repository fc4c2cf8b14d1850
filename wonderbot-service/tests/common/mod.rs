#![allow(dead_code)]

use dedup_log::DedupLogs;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use wonderbot_core::{BotConfig, Category, CoreError, Item, ItemSource, RedditApiError, ReplySink};

pub const BOT: &str = "__WonderBot__";
pub const REPLY: &str = "*And I'm Tony Wonder.*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReply {
    pub fullname: String,
    pub text: String,
    /// Whether the id was already in the dedup log when the reply went out.
    pub was_logged: Option<bool>,
}

/// In-memory stand-in for the subreddit.
#[derive(Default)]
pub struct MockForum {
    pub comments: Vec<Item>,
    pub submissions: Vec<Item>,
    pub failing_replies: HashSet<String>,
    pub fetch_error: Option<fn() -> CoreError>,
    pub watched_logs: Option<DedupLogs>,
    pub replies: Mutex<Vec<SentReply>>,
    pub fetches: AtomicUsize,
}

impl MockForum {
    pub fn sent(&self) -> Vec<SentReply> {
        self.replies.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ItemSource for MockForum {
    async fn fetch_new(&self, category: Category, limit: u32) -> Result<Vec<Item>, CoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(make_error) = self.fetch_error {
            return Err(make_error());
        }
        let items = match category {
            Category::Comment => &self.comments,
            Category::Submission => &self.submissions,
        };
        Ok(items.iter().take(limit as usize).cloned().collect())
    }
}

impl ReplySink for MockForum {
    async fn reply(&self, item: &Item, text: &str) -> Result<(), CoreError> {
        if self.failing_replies.contains(item.id()) {
            return Err(CoreError::RedditApi(RedditApiError::Rejected {
                thing_id: item.fullname(),
                reason: "THREAD_LOCKED".to_string(),
            }));
        }
        let was_logged = self
            .watched_logs
            .as_ref()
            .map(|logs| logs.for_category(item.category()).contains(item.id()));
        self.replies.lock().unwrap().push(SentReply {
            fullname: item.fullname(),
            text: text.to_string(),
            was_logged,
        });
        Ok(())
    }
}

pub fn comment(id: &str, author: &str, body: &str) -> Item {
    Item::Comment {
        id: id.to_string(),
        author: Some(author.to_string()),
        body: body.to_string(),
    }
}

pub fn post(id: &str, author: &str, title: &str, body: &str) -> Item {
    Item::Post {
        id: id.to_string(),
        author: Some(author.to_string()),
        title: title.to_string(),
        body: body.to_string(),
    }
}

pub fn test_config(log_dir: PathBuf) -> BotConfig {
    BotConfig {
        bot_account: BOT.to_string(),
        reply_text: REPLY.to_string(),
        log_dir,
        ..BotConfig::default()
    }
}

pub fn test_log_dir() -> PathBuf {
    std::env::temp_dir().join(format!("test_wonderbot_{}", uuid::Uuid::new_v4()))
}
