//! GitHub enrichment client
//!
//! One identity costs three requests:
//! - `GET /users/{id}` (required; 404 means the account is missing)
//! - `GET /users/{id}/repos?type=owner&sort=pushed` (all pages)
//! - `GET /users/{id}/social_accounts`
//!
//! When the user lookup succeeds but a later request fails after retries,
//! the result is partial: the failed part is `None` and listed in
//! `missing`. Authentication failures always surface.

use super::EnrichmentSource;
use crate::error::{EnrichmentError, GitHubError};
use crate::github::GitHubHttp;
use crate::models::{EnrichmentPart, EnrichmentResult, Repository};
use async_trait::async_trait;
use eggtray_common::Identity;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
    name: Option<String>,
    bio: Option<String>,
    email: Option<String>,
    location: Option<String>,
    blog: Option<String>,
    avatar_url: Option<String>,
    #[serde(default)]
    public_repos: u32,
}

#[derive(Debug, Deserialize)]
struct SocialAccount {
    provider: String,
    url: String,
}

/// Enrichment source backed by the GitHub REST API
pub struct GitHubClient {
    http: Arc<GitHubHttp>,
}

impl GitHubClient {
    pub fn new(http: Arc<GitHubHttp>) -> Self {
        Self { http }
    }

    /// Whether the account exists
    pub async fn account_exists(&self, identity: &Identity) -> Result<bool, EnrichmentError> {
        match self
            .http
            .get_json::<UserResponse>(&format!("/users/{}", identity))
            .await
        {
            Ok(_) => Ok(true),
            Err(GitHubError::NotFound(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn fetch_repositories(&self, identity: &Identity) -> Result<Vec<Repository>, GitHubError> {
        self.http
            .get_all_pages(
                &format!("/users/{}/repos", identity),
                &[("type", "owner"), ("sort", "pushed")],
            )
            .await
    }

    async fn fetch_linkedin_url(&self, identity: &Identity) -> Result<Option<String>, GitHubError> {
        let accounts: Vec<SocialAccount> = self
            .http
            .get_json(&format!("/users/{}/social_accounts", identity))
            .await?;
        Ok(accounts
            .into_iter()
            .find(|a| a.provider.eq_ignore_ascii_case("linkedin"))
            .map(|a| a.url))
    }
}

/// Keep a part's value, or record it as missing
fn optional_part<T>(
    identity: &Identity,
    part: EnrichmentPart,
    outcome: Result<T, GitHubError>,
    missing: &mut Vec<EnrichmentPart>,
) -> Result<Option<T>, EnrichmentError> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(err @ GitHubError::Auth(_)) => Err(err.into()),
        Err(err) => {
            warn!(
                identity = %identity,
                part = %part,
                error = %err,
                "Enrichment part unavailable"
            );
            missing.push(part);
            Ok(None)
        }
    }
}

#[async_trait]
impl EnrichmentSource for GitHubClient {
    async fn fetch(&self, identity: &Identity) -> Result<EnrichmentResult, EnrichmentError> {
        debug!(identity = %identity, "Fetching GitHub profile");

        let user: UserResponse = self
            .http
            .get_json(&format!("/users/{}", identity))
            .await
            .map_err(|err| match err {
                GitHubError::NotFound(_) => EnrichmentError::NotFound(identity.to_string()),
                other => other.into(),
            })?;

        let mut missing = Vec::new();
        let repositories = optional_part(
            identity,
            EnrichmentPart::Repositories,
            self.fetch_repositories(identity).await,
            &mut missing,
        )?;
        let linkedin_url = optional_part(
            identity,
            EnrichmentPart::SocialAccounts,
            self.fetch_linkedin_url(identity).await,
            &mut missing,
        )?
        .flatten();

        info!(
            identity = %identity,
            repositories = ?repositories.as_ref().map(|r| r.len()),
            partial = !missing.is_empty(),
            "Fetched GitHub profile"
        );

        Ok(EnrichmentResult {
            login: user.login,
            name: user.name,
            bio: user.bio,
            email: user.email,
            location: user.location,
            blog: user.blog,
            avatar_url: user.avatar_url,
            linkedin_url,
            public_repos: user.public_repos,
            repositories,
            missing,
        })
    }
}
