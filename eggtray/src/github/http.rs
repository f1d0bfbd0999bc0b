//! GitHub REST transport
//!
//! Shared by the enrichment client and the issue tracker. Every request:
//! 1. waits for the governor quota
//! 2. attaches the bearer token
//! 3. maps failures to [`GitHubError`]
//!
//! Rate limiting and transient failures are retried with capped backoff.
//! Non-idempotent requests (POST) are retried only when GitHub rejected
//! them for rate limiting, since the request was not processed.

use super::auth::{GitHubAuth, TokenProvider};
use crate::error::GitHubError;
use crate::utils::{retry_with_backoff, RetryPolicy, Retryable};
use chrono::Utc;
use eggtray_common::config::GitHubConfig;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

pub(crate) const MEDIA_TYPE: &str = "application/vnd.github+json";
pub(crate) const API_VERSION: &str = "2022-11-28";

/// Page size for list endpoints
pub const PER_PAGE: usize = 100;

/// Upper bound on pages fetched from one list endpoint
const MAX_PAGES: usize = 50;

/// Authenticated, rate-limited GitHub REST client
pub struct GitHubHttp {
    client: reqwest::Client,
    api_url: String,
    tokens: TokenProvider,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    retry: RetryPolicy,
}

impl GitHubHttp {
    pub fn new(config: &GitHubConfig, auth: GitHubAuth) -> Result<Self, GitHubError> {
        let per_second = NonZeroU32::new(config.requests_per_second).ok_or_else(|| {
            GitHubError::Api(0, "github.requests_per_second must be at least 1".to_string())
        })?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GitHubError::Transient(format!("cannot build HTTP client: {}", e)))?;

        debug!(
            api_url = %config.api_url,
            auth = auth.describe(),
            requests_per_second = config.requests_per_second,
            "GitHub client configured"
        );

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            tokens: TokenProvider::new(auth),
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                initial_backoff: Duration::from_millis(config.backoff_initial_ms),
                max_backoff: Duration::from_millis(config.backoff_max_ms),
            },
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitHubError> {
        self.get_json_with_query(path, &[]).await
    }

    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GitHubError> {
        retry_with_backoff(&format!("GET {}", path), &self.retry, || {
            self.send::<(), T>(Method::GET, path, query, None)
        })
        .await
    }

    /// GET every page of a list endpoint
    ///
    /// `query` must not carry `per_page`/`page` parameters.
    pub async fn get_all_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, GitHubError> {
        let mut items = Vec::new();
        for page in 1..=MAX_PAGES {
            let params = page_query(query, page);
            let batch: Vec<T> = self.get_json_with_query(path, &params).await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }
        Ok(items)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, GitHubError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        retry_with_backoff(&format!("POST {}", path), &self.retry, move || async move {
            self.send::<B, T>(Method::POST, path, &[], Some(body))
                .await
                .map_err(NotProcessed)
        })
        .await
        .map_err(|NotProcessed(err)| err)
    }

    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T, GitHubError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        retry_with_backoff(&format!("PATCH {}", path), &self.retry, || {
            self.send::<B, T>(Method::PATCH, path, &[], Some(body))
        })
        .await
    }

    /// One attempt
    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, GitHubError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.api_url, path);
        debug!(method = %method, url = %url, "GitHub request");

        let mut request = self
            .client
            .request(method, &url)
            .header(ACCEPT, MEDIA_TYPE)
            .header("X-GitHub-Api-Version", API_VERSION);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.tokens.bearer(&self.client, &self.api_url).await? {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GitHubError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &headers, &body, path));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GitHubError::Parse(format!("{}: {}", path, e)))
    }
}

/// Caller parameters plus paging
fn page_query<'a>(query: &[(&'a str, &str)], page: usize) -> Vec<(&'a str, String)> {
    let mut params: Vec<(&'a str, String)> = query
        .iter()
        .map(|(key, value)| (*key, value.to_string()))
        .collect();
    params.push(("per_page", PER_PAGE.to_string()));
    params.push(("page", page.to_string()));
    params
}

/// Error of a non-idempotent request: only rate limiting is retried
struct NotProcessed(GitHubError);

impl fmt::Display for NotProcessed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Retryable for NotProcessed {
    fn is_retryable(&self) -> bool {
        matches!(self.0, GitHubError::RateLimited { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        self.0.retry_after()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a non-success response to a typed error
pub(crate) fn classify_failure(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    path: &str,
) -> GitHubError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    match status.as_u16() {
        401 => GitHubError::Auth(message),
        403 if is_rate_limited(headers, &message) => GitHubError::RateLimited {
            retry_after: retry_after(headers),
        },
        403 => GitHubError::Auth(format!("forbidden: {}", message)),
        404 => GitHubError::NotFound(path.to_string()),
        429 => GitHubError::RateLimited {
            retry_after: retry_after(headers),
        },
        code if code >= 500 => GitHubError::Transient(format!("HTTP {}: {}", code, message)),
        code => GitHubError::Api(code, message),
    }
}

fn is_rate_limited(headers: &HeaderMap, message: &str) -> bool {
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false);
    exhausted || message.to_ascii_lowercase().contains("rate limit")
}

/// Server-requested delay from `retry-after` or `x-ratelimit-reset`
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
    };
    if let Some(seconds) = header("retry-after") {
        return Some(Duration::from_secs(seconds.max(0) as u64));
    }
    header("x-ratelimit-reset").map(|reset| {
        let wait = reset - Utc::now().timestamp();
        Duration::from_secs(wait.max(0) as u64)
    })
}
