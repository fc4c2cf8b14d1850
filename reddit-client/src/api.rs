use oauth2::{HttpRequest, HttpResponse};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;
use wonderbot_core::{CoreError, Item, RedditApiError};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Reddit's stand-in author for removed accounts.
const DELETED_AUTHOR: &str = "[deleted]";

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

impl<T: Into<Item>> RedditListing<T> {
    pub fn into_items(self) -> Vec<Item> {
        self.data
            .children
            .into_iter()
            .map(|child| child.data.into())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subreddit: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub link_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentResponse {
    json: CommentResponseBody,
}

#[derive(Debug, Deserialize)]
struct CommentResponseBody {
    #[serde(default)]
    errors: Vec<Value>,
}

fn known_author(author: Option<String>) -> Option<String> {
    author.filter(|a| !a.is_empty() && a != DELETED_AUTHOR)
}

impl From<RedditPostData> for Item {
    fn from(post: RedditPostData) -> Self {
        Item::Post {
            id: post.id,
            author: known_author(post.author),
            title: post.title,
            body: post.selftext,
        }
    }
}

impl From<RedditCommentData> for Item {
    fn from(comment: RedditCommentData) -> Self {
        Item::Comment {
            id: comment.id,
            author: known_author(comment.author),
            body: comment.body,
        }
    }
}

/// Walks a comment listing depth-first, collecting every `t1` child and
/// its nested replies. "more" stubs are skipped.
pub fn flatten_comment_tree(listing: &Value, out: &mut Vec<Item>) {
    let Some(children) = listing["data"]["children"].as_array() else {
        return;
    };

    for child in children {
        if child["kind"] != "t1" {
            continue;
        }
        let data = &child["data"];
        match RedditCommentData::deserialize(data) {
            Ok(comment) => out.push(comment.into()),
            Err(e) => warn!("Skipping malformed comment in tree: {}", e),
        }
        // `replies` is an empty string when there are none.
        if data["replies"].is_object() {
            flatten_comment_tree(&data["replies"], out);
        }
    }
}

/// Converts a non-success status into the matching API error.
pub fn status_error(status: StatusCode, retry_after: Option<u64>, endpoint: &str) -> CoreError {
    let error = match status.as_u16() {
        401 => RedditApiError::InvalidToken,
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => RedditApiError::SubredditNotFound {
            subreddit: endpoint.to_string(),
        },
        429 => RedditApiError::RateLimitExceeded {
            retry_after: retry_after.unwrap_or(60),
        },
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::InvalidResponse {
            details: format!("Unexpected status {} for {}", code, endpoint),
        },
    };
    CoreError::RedditApi(error)
}

fn transport_error(e: reqwest::Error, endpoint: &str) -> CoreError {
    error!("Network error for {}: {}", endpoint, e);
    if e.is_timeout() {
        CoreError::RedditApi(RedditApiError::RequestTimeout)
    } else {
        CoreError::Network(e)
    }
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    ["retry-after", "x-ratelimit-reset"].iter().find_map(|name| {
        response
            .headers()
            .get(*name)?
            .to_str()
            .ok()?
            .trim()
            .parse::<f64>()
            .ok()
            .map(|secs| secs.ceil() as u64)
    })
}

/// Thin wrapper around the authenticated `oauth.reddit.com` endpoints.
#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    base_url: Url,
}

impl RedditApiClient {
    pub fn new(user_agent: &str, base_url: Url) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
    ) -> Result<RequestBuilder, CoreError> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| CoreError::InvalidInput {
                message: format!("Bad endpoint {}: {}", endpoint, e),
            })?;

        Ok(self
            .http_client
            .request(method, url)
            .bearer_auth(access_token))
    }

    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Response, CoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, endpoint))?;

        let status = response.status();
        if !status.is_success() {
            error!("Request failed with status: {} for {}", status, endpoint);
            return Err(status_error(status, retry_after_secs(&response), endpoint));
        }

        debug!("Request successful: {} {}", status, endpoint);
        Ok(response)
    }

    /// Sends an OAuth2 token request with this client's user agent and
    /// timeout. 429 and 5xx answers are returned as errors; any other answer
    /// is handed back for `oauth2` to interpret.
    pub async fn token_request(&self, request: HttpRequest) -> Result<HttpResponse, CoreError> {
        let endpoint = request.url.path().to_string();
        let mut builder = self
            .http_client
            .request(request.method, request.url.as_str())
            .body(request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_bytes());
        }

        debug!("Requesting access token from {}", request.url);
        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(e, &endpoint))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            error!("Token request failed with status: {}", status);
            return Err(status_error(status, retry_after_secs(&response), &endpoint));
        }

        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, &endpoint))?;

        Ok(HttpResponse {
            status_code: status,
            headers,
            body: body.to_vec(),
        })
    }

    pub async fn get_listing<T>(
        &self,
        access_token: &str,
        endpoint: &str,
        limit: u32,
    ) -> Result<RedditListing<T>, CoreError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let limit = limit.to_string();
        let request = self
            .request(Method::GET, endpoint, access_token)?
            .query(&[("limit", limit.as_str()), ("raw_json", "1")]);

        info!("Making Reddit API request: GET {}", endpoint);
        let response = self.send(request, endpoint).await?;

        let listing: RedditListing<T> = response.json().await.map_err(|e| {
            error!("Failed to parse listing: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse listing from {}", endpoint),
            })
        })?;

        debug!(
            "Retrieved {} entries from {}",
            listing.data.children.len(),
            endpoint
        );
        Ok(listing)
    }

    pub async fn get_comment_tree(
        &self,
        access_token: &str,
        submission_id: &str,
    ) -> Result<Vec<Item>, CoreError> {
        let endpoint = format!("/comments/{}", submission_id);
        let request = self
            .request(Method::GET, &endpoint, access_token)?
            .query(&[("raw_json", "1")]);

        info!("Making Reddit API request: GET {}", endpoint);
        let response = self.send(request, &endpoint).await?;

        // The endpoint answers with [post listing, comment listing].
        let body: Value = response.json().await.map_err(|e| {
            error!("Failed to parse comment tree: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse comments for {}", submission_id),
            })
        })?;

        let Some(listing) = body.as_array().and_then(|parts| parts.get(1)) else {
            error!("Unexpected comment tree shape for {}", submission_id);
            return Err(CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Expected a post and a comment listing for {}", submission_id),
            }));
        };

        let mut comments = Vec::new();
        flatten_comment_tree(listing, &mut comments);
        Ok(comments)
    }

    pub async fn post_comment(
        &self,
        access_token: &str,
        thing_id: &str,
        text: &str,
    ) -> Result<(), CoreError> {
        let endpoint = "/api/comment";
        let request = self.request(Method::POST, endpoint, access_token)?.form(&[
            ("api_type", "json"),
            ("thing_id", thing_id),
            ("text", text),
        ]);

        info!("Making Reddit API request: POST {} for {}", endpoint, thing_id);
        let response = self.send(request, endpoint).await?;

        let body: CommentResponse = response.json().await.map_err(|e| {
            error!("Failed to parse comment response: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse reply response for {}", thing_id),
            })
        })?;

        check_comment_errors(thing_id, &body.json.errors)
    }
}

/// Reddit reports rejected comments with HTTP 200 and a non-empty
/// `json.errors` array of `[code, message, field]` triples.
fn check_comment_errors(thing_id: &str, errors: &[Value]) -> Result<(), CoreError> {
    if errors.is_empty() {
        return Ok(());
    }

    let reason = errors
        .iter()
        .map(|e| match e.as_array() {
            Some(parts) => parts
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(": "),
            None => e.to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(CoreError::RedditApi(RedditApiError::Rejected {
        thing_id: thing_id.to_string(),
        reason,
    }))
}
