pub mod api;
pub mod credentials;


pub use api::RedditApiClient;
pub use credentials::{
    resolve_credentials, CredentialProvider, Credentials, EnvCredentials, FileCredentials,
};

use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, ClientId, ClientSecret, RequestTokenError, ResourceOwnerPassword,
    ResourceOwnerUsername, Scope, TokenResponse, TokenUrl,
};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use url::Url;
use wonderbot_core::{
    BotConfig, Category, ConfigError, CoreError, Item, ItemSource, RedditApiError, ReplySink,
};

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Tokens are renewed this long before Reddit would reject them.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RedditClientConfig {
    pub user_agent: String,
    pub subreddit: String,
    pub api_base: Url,
    pub token_url: String,
}

impl RedditClientConfig {
    pub fn new(user_agent: String, subreddit: String) -> Result<Self, ConfigError> {
        let api_base = Url::parse(api::REDDIT_API_BASE).map_err(|e| ConfigError::InvalidValue {
            field: "api_base".to_string(),
            value: e.to_string(),
        })?;

        Ok(Self {
            user_agent,
            subreddit,
            api_base,
            token_url: REDDIT_TOKEN_URL.to_string(),
        })
    }

    pub fn from_bot_config(config: &BotConfig) -> Result<Self, ConfigError> {
        Self::new(config.user_agent(), config.subreddit.clone())
    }

    pub fn with_api_base(mut self, api_base: Url) -> Self {
        self.api_base = api_base;
        self
    }

    fn listing_endpoint(&self, category: Category) -> String {
        match category {
            Category::Submission => format!("/r/{}/new", self.subreddit),
            Category::Comment => format!("/r/{}/comments", self.subreddit),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub scope: Vec<String>,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() + TOKEN_EXPIRY_MARGIN >= self.expires_at
    }
}

/// Logged-in session for one bot account against one subreddit.
pub struct RedditClient {
    config: RedditClientConfig,
    oauth_client: BasicClient,
    credentials: Credentials,
    api: RedditApiClient,
    token: Mutex<Option<RedditToken>>,
}

impl RedditClient {
    pub fn new(config: RedditClientConfig, credentials: Credentials) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "auth_url".to_string(),
                value: e.to_string(),
            }
        })?;
        let token_url = TokenUrl::new(config.token_url.clone()).map_err(|e| {
            ConfigError::InvalidValue {
                field: "token_url".to_string(),
                value: e.to_string(),
            }
        })?;

        let oauth_client = BasicClient::new(
            ClientId::new(credentials.client_id.clone()),
            Some(ClientSecret::new(credentials.client_secret.clone())),
            auth_url,
            Some(token_url),
        );
        let api = RedditApiClient::new(&config.user_agent, config.api_base.clone())?;

        Ok(Self {
            config,
            oauth_client,
            credentials,
            api,
            token: Mutex::new(None),
        })
    }

    pub fn get_required_scopes() -> Vec<&'static str> {
        vec!["read", "submit"]
    }

    pub fn subreddit(&self) -> &str {
        &self.config.subreddit
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_token().is_some_and(|t| !t.is_expired())
    }

    pub fn needs_refresh(&self) -> bool {
        self.current_token().is_some_and(|t| t.is_expired())
    }

    pub fn set_token(&self, token: RedditToken) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token);
    }

    pub fn invalidate_token(&self) {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn current_token(&self) -> Option<RedditToken> {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Exchanges the account's username and password for a bearer token
    /// (Reddit "script" apps use the resource-owner password grant).
    ///
    /// Only a refused login is an `AuthenticationFailed`. An unreachable or
    /// overloaded token endpoint surfaces as the same retryable errors the
    /// API calls produce.
    pub async fn authenticate(&self) -> Result<RedditToken, CoreError> {
        info!("Authenticating to Reddit as u/{}", self.credentials.username);

        let username = ResourceOwnerUsername::new(self.credentials.username.clone());
        let password = ResourceOwnerPassword::new(self.credentials.password.clone());
        let mut request = self.oauth_client.exchange_password(&username, &password);
        for scope in Self::get_required_scopes() {
            request = request.add_scope(Scope::new(scope.to_string()));
        }

        let response = request
            .request_async(|http_request| self.api.token_request(http_request))
            .await
            .map_err(|e| {
                let reason = match e {
                    RequestTokenError::Request(transport) => return transport,
                    RequestTokenError::ServerResponse(response) => response.to_string(),
                    RequestTokenError::Parse(parse_error, body) => format!(
                        "{} (body: {})",
                        parse_error,
                        String::from_utf8_lossy(&body)
                    ),
                    RequestTokenError::Other(message) => message,
                };
                warn!("Reddit refused the login: {}", reason);
                CoreError::RedditApi(RedditApiError::AuthenticationFailed { reason })
            })?;

        let expires_in = response
            .expires_in()
            .unwrap_or_else(|| Duration::from_secs(3600));
        let token = RedditToken {
            access_token: response.access_token().secret().clone(),
            expires_at: SystemTime::now() + expires_in,
            scope: response
                .scopes()
                .map(|scopes| scopes.iter().map(|s| (**s).clone()).collect())
                .unwrap_or_default(),
        };

        debug!("Obtained Reddit token valid for {:?}", expires_in);
        self.set_token(token.clone());
        Ok(token)
    }

    async fn access_token(&self) -> Result<String, CoreError> {
        match self.current_token() {
            Some(token) if !token.is_expired() => Ok(token.access_token),
            _ => Ok(self.authenticate().await?.access_token),
        }
    }

    /// Drops the cached token when Reddit rejects it so the next call logs
    /// in again.
    fn observe<T>(&self, result: Result<T, CoreError>) -> Result<T, CoreError> {
        if let Err(CoreError::RedditApi(RedditApiError::InvalidToken)) = &result {
            self.invalidate_token();
        }
        result
    }

    pub async fn fetch_new_items(
        &self,
        category: Category,
        limit: u32,
    ) -> Result<Vec<Item>, CoreError> {
        let access_token = self.access_token().await?;
        let endpoint = self.config.listing_endpoint(category);

        let items = match category {
            Category::Submission => self
                .observe(
                    self.api
                        .get_listing::<api::RedditPostData>(&access_token, &endpoint, limit)
                        .await,
                )?
                .into_items(),
            Category::Comment => self
                .observe(
                    self.api
                        .get_listing::<api::RedditCommentData>(&access_token, &endpoint, limit)
                        .await,
                )?
                .into_items(),
        };

        info!(
            "Retrieved {} new {}s from r/{}",
            items.len(),
            category,
            self.config.subreddit
        );
        Ok(items)
    }

    /// Every comment under a submission, replies included, in thread order.
    pub async fn comments_for_submission(
        &self,
        submission_id: &str,
    ) -> Result<Vec<Item>, CoreError> {
        let access_token = self.access_token().await?;
        self.observe(self.api.get_comment_tree(&access_token, submission_id).await)
    }

    pub async fn reply_to(&self, item: &Item, text: &str) -> Result<(), CoreError> {
        let access_token = self.access_token().await?;
        self.observe(
            self.api
                .post_comment(&access_token, &item.fullname(), text)
                .await,
        )?;
        info!("Replied to {} {}", item.category(), item.id());
        Ok(())
    }
}

impl ItemSource for RedditClient {
    async fn fetch_new(&self, category: Category, limit: u32) -> Result<Vec<Item>, CoreError> {
        self.fetch_new_items(category, limit).await
    }
}

impl ReplySink for RedditClient {
    async fn reply(&self, item: &Item, text: &str) -> Result<(), CoreError> {
        self.reply_to(item, text).await
    }
}
