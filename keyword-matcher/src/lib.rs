pub mod normalizer;

pub use normalizer::{normalize, normalize_token};

/// Decides whether a piece of text mentions the configured keyword.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keyword: String,
}

impl KeywordMatcher {
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.trim().to_lowercase(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn needs_reply(&self, text: &str) -> bool {
        let matched = normalize(text).iter().any(|token| *token == self.keyword);
        tracing::trace!(keyword = %self.keyword, matched, "Checked text for keyword");
        matched
    }
}
