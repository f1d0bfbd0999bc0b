//! GitHub authentication
//!
//! Three modes:
//! - anonymous (development only, low rate limit)
//! - static token
//! - GitHub App installation: an RS256 JWT signed with the App's private key
//!   is exchanged for an installation access token, cached until shortly
//!   before it expires.

use super::http::{classify_failure, API_VERSION, MEDIA_TYPE};
use crate::error::GitHubError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Installation tokens are refreshed this long before they expire
const REFRESH_MARGIN_SECS: i64 = 300;

/// App JWTs may live at most 10 minutes; stay below with clock drift
const JWT_LIFETIME_SECS: i64 = 9 * 60;
const JWT_BACKDATE_SECS: i64 = 60;

/// GitHub App credentials
#[derive(Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub client_id: String,
    pub installation_id: u64,
    /// PEM-encoded RSA private key
    pub private_key: String,
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("client_id", &self.client_id)
            .field("installation_id", &self.installation_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// How requests authenticate against GitHub
#[derive(Clone, PartialEq, Eq, Default)]
pub enum GitHubAuth {
    #[default]
    Anonymous,
    Token(String),
    App(AppCredentials),
}

impl GitHubAuth {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, GitHubAuth::Anonymous)
    }

    /// Short description for logs; never contains secrets
    pub fn describe(&self) -> &'static str {
        match self {
            GitHubAuth::Anonymous => "anonymous",
            GitHubAuth::Token(_) => "token",
            GitHubAuth::App(_) => "github app",
        }
    }
}

impl fmt::Debug for GitHubAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitHubAuth::Anonymous => f.write_str("Anonymous"),
            GitHubAuth::Token(_) => f.write_str("Token(<redacted>)"),
            GitHubAuth::App(creds) => f.debug_tuple("App").field(creds).finish(),
        }
    }
}

#[derive(Debug, Serialize)]
struct AppClaims<'a> {
    iat: i64,
    exp: i64,
    iss: &'a str,
}

#[derive(Debug, Deserialize)]
struct InstallationToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Sign the short-lived JWT that identifies the App itself
pub fn app_jwt(creds: &AppCredentials, now: DateTime<Utc>) -> Result<String, GitHubError> {
    let key = EncodingKey::from_rsa_pem(creds.private_key.as_bytes())
        .map_err(|e| GitHubError::Auth(format!("invalid GitHub App private key: {}", e)))?;
    let claims = AppClaims {
        iat: now.timestamp() - JWT_BACKDATE_SECS,
        exp: now.timestamp() + JWT_LIFETIME_SECS,
        iss: &creds.client_id,
    };
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| GitHubError::Auth(format!("cannot sign GitHub App JWT: {}", e)))
}

/// Supplies the bearer token for each request
pub(crate) struct TokenProvider {
    auth: GitHubAuth,
    installation_token: Mutex<Option<InstallationToken>>,
}

impl TokenProvider {
    pub fn new(auth: GitHubAuth) -> Self {
        Self {
            auth,
            installation_token: Mutex::new(None),
        }
    }

    /// Bearer token for the next request, `None` when anonymous
    pub async fn bearer(
        &self,
        client: &reqwest::Client,
        api_url: &str,
    ) -> Result<Option<String>, GitHubError> {
        match &self.auth {
            GitHubAuth::Anonymous => Ok(None),
            GitHubAuth::Token(token) => Ok(Some(token.clone())),
            GitHubAuth::App(creds) => {
                let mut cached = self.installation_token.lock().await;
                let now = Utc::now();
                if let Some(token) = cached.as_ref() {
                    if token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now {
                        return Ok(Some(token.token.clone()));
                    }
                    debug!("Installation token about to expire, refreshing");
                }
                let fresh = exchange_installation_token(client, api_url, creds, now).await?;
                let token = fresh.token.clone();
                *cached = Some(fresh);
                Ok(Some(token))
            }
        }
    }
}

async fn exchange_installation_token(
    client: &reqwest::Client,
    api_url: &str,
    creds: &AppCredentials,
    now: DateTime<Utc>,
) -> Result<InstallationToken, GitHubError> {
    let jwt = app_jwt(creds, now)?;
    let path = format!("/app/installations/{}/access_tokens", creds.installation_id);
    let response = client
        .post(format!("{}{}", api_url, path))
        .header(reqwest::header::ACCEPT, MEDIA_TYPE)
        .header("X-GitHub-Api-Version", API_VERSION)
        .bearer_auth(jwt)
        .send()
        .await
        .map_err(|e| GitHubError::Transient(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        return Err(match classify_failure(status, &headers, &body, &path) {
            // Unknown installation means the credentials are wrong
            GitHubError::NotFound(_) => GitHubError::Auth(format!(
                "GitHub App installation {} not found",
                creds.installation_id
            )),
            other => other,
        });
    }

    let token: InstallationToken = response
        .json()
        .await
        .map_err(|e| GitHubError::Parse(e.to_string()))?;
    info!(
        installation_id = creds.installation_id,
        expires_at = %token.expires_at,
        "Obtained GitHub App installation token"
    );
    Ok(token)
}
