use serde::{Deserialize, Serialize};
use std::fmt;

/// Which Reddit listing an item came from. Each category has its own
/// dedup log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Comment,
    Submission,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Comment => "comment",
            Category::Submission => "submission",
        }
    }

    pub fn log_file_name(&self) -> &'static str {
        match self {
            Category::Comment => "comments_replied.txt",
            Category::Submission => "submissions_replied.txt",
        }
    }

    /// Reddit "thing" kind prefix used to build fullnames.
    pub fn kind(&self) -> &'static str {
        match self {
            Category::Comment => "t1",
            Category::Submission => "t3",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A post or comment fetched from the subreddit. `author` is `None` for
/// deleted or anonymous authors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Post {
        id: String,
        author: Option<String>,
        title: String,
        body: String,
    },
    Comment {
        id: String,
        author: Option<String>,
        body: String,
    },
}

impl Item {
    pub fn id(&self) -> &str {
        match self {
            Item::Post { id, .. } | Item::Comment { id, .. } => id,
        }
    }

    pub fn author(&self) -> Option<&str> {
        match self {
            Item::Post { author, .. } | Item::Comment { author, .. } => author.as_deref(),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Item::Post { .. } => Category::Submission,
            Item::Comment { .. } => Category::Comment,
        }
    }

    /// Posts match on title and body, comments on body only.
    pub fn text_to_match(&self) -> String {
        match self {
            Item::Post { title, body, .. } => format!("{}\n{}", title, body),
            Item::Comment { body, .. } => body.clone(),
        }
    }

    pub fn fullname(&self) -> String {
        format!("{}_{}", self.category().kind(), self.id())
    }

    pub fn is_authored_by(&self, account: &str) -> bool {
        self.author() == Some(account)
    }
}
