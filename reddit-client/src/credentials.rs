//! Reddit script-app credentials and the places they can come from.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use wonderbot_core::ConfigError;

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    #[serde(rename = "secret", alias = "client_secret")]
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    fn validate(self) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("client_id", &self.client_id),
            ("secret", &self.client_secret),
            ("username", &self.username),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }
        Ok(self)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub trait CredentialProvider {
    fn name(&self) -> &str;
    fn is_available(&self) -> bool;
    fn load(&self) -> Result<Credentials, ConfigError>;
}

/// JSON login file with `client_id`, `secret`, `username` and `password`.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for FileCredentials {
    fn name(&self) -> &str {
        "login file"
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<Credentials, ConfigError> {
        let contents =
            std::fs::read_to_string(&self.path).map_err(|_| ConfigError::FileNotFound {
                path: self.path.display().to_string(),
            })?;
        let credentials: Credentials =
            serde_json::from_str(&contents).map_err(|e| ConfigError::InvalidFormat {
                details: format!("{}: {}", self.path.display(), e),
            })?;
        credentials.validate()
    }
}

/// `<PREFIX>_CLIENT_ID`, `<PREFIX>_CLIENT_SECRET`, `<PREFIX>_USERNAME` and
/// `<PREFIX>_PASSWORD`. The prefix defaults to `REDDIT`.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    prefix: String,
}

impl EnvCredentials {
    pub fn new() -> Self {
        Self::with_prefix("REDDIT")
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    fn var_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.prefix, suffix)
    }

    fn var(&self, suffix: &str) -> Result<String, ConfigError> {
        let var_name = self.var_name(suffix);
        std::env::var(&var_name).map_err(|_| ConfigError::MissingEnvironmentVariable { var_name })
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for EnvCredentials {
    fn name(&self) -> &str {
        "environment"
    }

    fn is_available(&self) -> bool {
        std::env::var_os(self.var_name("CLIENT_ID")).is_some()
    }

    fn load(&self) -> Result<Credentials, ConfigError> {
        Credentials {
            client_id: self.var("CLIENT_ID")?,
            client_secret: self.var("CLIENT_SECRET")?,
            username: self.var("USERNAME")?,
            password: self.var("PASSWORD")?,
        }
        .validate()
    }
}

/// Loads from the first available provider, in order.
pub fn resolve_credentials(
    providers: &[&dyn CredentialProvider],
) -> Result<Credentials, ConfigError> {
    match providers.iter().find(|p| p.is_available()) {
        Some(provider) => {
            tracing::info!("Loading Reddit credentials from {}", provider.name());
            provider.load()
        }
        None => Err(ConfigError::NoCredentials {
            tried: providers
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}
