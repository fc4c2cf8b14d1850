use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_KEYWORD: &str = "wonder";
pub const DEFAULT_BOT_ACCOUNT: &str = "__WonderBot__";
pub const DEFAULT_REPLY_TEXT: &str = "*And I'm Tony Wonder.*";

/// Reddit caps listing pages at 100 entries.
const MAX_FETCH_LIMIT: u32 = 100;

/// Everything the bot needs to know at runtime. Loaded once and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BotConfig {
    pub subreddit: String,
    pub bot_account: String,
    pub keyword: String,
    pub reply_text: String,
    pub fetch_limit: u32,
    pub log_dir: PathBuf,
    pub poll_interval_secs: u64,
    pub pass_pause_secs: u64,
    /// Sent on every Reddit request. Left unset, it is derived from
    /// `bot_account`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            subreddit: "wondertest".to_string(),
            bot_account: DEFAULT_BOT_ACCOUNT.to_string(),
            keyword: DEFAULT_KEYWORD.to_string(),
            reply_text: DEFAULT_REPLY_TEXT.to_string(),
            fetch_limit: 10,
            log_dir: PathBuf::from("logs"),
            poll_interval_secs: 60,
            pass_pause_secs: 0,
            user_agent: None,
        }
    }
}

impl BotConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: BotConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            ErrorKind::PermissionDenied => ConfigError::PermissionDenied {
                path: path.display().to_string(),
            },
            _ => ConfigError::InvalidFormat {
                details: format!("{}: {}", path.display(), e),
            },
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Like [`BotConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::FileNotFound { path }) => {
                tracing::info!("No configuration file at {}, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let keyword = self.keyword.trim();
        if keyword.is_empty() || keyword.chars().any(char::is_whitespace) {
            return Err(invalid("keyword", &self.keyword));
        }
        if self.subreddit.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "subreddit".to_string(),
            });
        }
        if self.bot_account.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "bot_account".to_string(),
            });
        }
        if self.reply_text.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "reply_text".to_string(),
            });
        }
        if self.fetch_limit == 0 || self.fetch_limit > MAX_FETCH_LIMIT {
            return Err(invalid("fetch_limit", &self.fetch_limit.to_string()));
        }
        if self
            .user_agent
            .as_deref()
            .is_some_and(|agent| agent.trim().is_empty())
        {
            return Err(invalid("user_agent", ""));
        }
        if self.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs", "0"));
        }
        Ok(())
    }

    pub fn user_agent(&self) -> String {
        match &self.user_agent {
            Some(agent) => agent.clone(),
            None => format!(
                "wonderbot/{} (by u/{})",
                env!("CARGO_PKG_VERSION"),
                self.bot_account
            ),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn pass_pause(&self) -> Duration {
        Duration::from_secs(self.pass_pause_secs)
    }
}

fn invalid(field: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}
