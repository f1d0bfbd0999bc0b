//! GitHub issues tracker

use super::{IssueDraft, IssueReport, IssueState, IssueTracker};
use crate::error::{GitHubError, TrackerError};
use crate::github::GitHubHttp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct LabelResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    number: u64,
    title: String,
    body: Option<String>,
    state: IssueState,
    #[serde(default)]
    labels: Vec<LabelResponse>,
    user: Option<UserResponse>,
    html_url: String,
    /// Present when the "issue" is a pull request
    pull_request: Option<serde_json::Value>,
}

impl From<IssueResponse> for IssueReport {
    fn from(issue: IssueResponse) -> Self {
        IssueReport {
            number: issue.number,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            state: issue.state,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            author: issue.user.map(|u| u.login),
            html_url: issue.html_url,
        }
    }
}

#[derive(Debug, Serialize)]
struct IssueUpdate<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

/// Issues of one `owner/repo`
pub struct GitHubTracker {
    http: Arc<GitHubHttp>,
    owner: String,
    repo: String,
}

impl GitHubTracker {
    pub fn new(http: Arc<GitHubHttp>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            http,
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    fn issues_path(&self) -> String {
        format!("/repos/{}/{}/issues", self.owner, self.repo)
    }

    fn issue_path(&self, number: u64) -> String {
        format!("{}/{}", self.issues_path(), number)
    }
}

fn issue_error(number: u64, err: GitHubError) -> TrackerError {
    match err {
        GitHubError::NotFound(_) => TrackerError::NotFound(number),
        other => other.into(),
    }
}

#[async_trait]
impl IssueTracker for GitHubTracker {
    async fn list_open(&self, label: &str) -> Result<Vec<IssueReport>, TrackerError> {
        let issues: Vec<IssueResponse> = self
            .http
            .get_all_pages(&self.issues_path(), &[("state", "open"), ("labels", label)])
            .await?;
        let reports: Vec<IssueReport> = issues
            .into_iter()
            .filter(|issue| issue.pull_request.is_none())
            .map(IssueReport::from)
            .collect();
        debug!(label = %label, count = reports.len(), "Listed open issues");
        Ok(reports)
    }

    async fn get(&self, number: u64) -> Result<IssueReport, TrackerError> {
        let issue: IssueResponse = self
            .http
            .get_json(&self.issue_path(number))
            .await
            .map_err(|e| issue_error(number, e))?;
        Ok(issue.into())
    }

    async fn create(&self, draft: &IssueDraft) -> Result<IssueReport, TrackerError> {
        let body = json!({
            "title": draft.title,
            "body": draft.body,
            "labels": draft.labels,
        });
        let issue: IssueResponse = self.http.post_json(&self.issues_path(), &body).await?;
        Ok(issue.into())
    }

    async fn update(
        &self,
        number: u64,
        title: &str,
        body: Option<&str>,
    ) -> Result<IssueReport, TrackerError> {
        let update = IssueUpdate { title, body };
        let issue: IssueResponse = self
            .http
            .patch_json(&self.issue_path(number), &update)
            .await
            .map_err(|e| issue_error(number, e))?;
        Ok(issue.into())
    }

    async fn comment(&self, number: u64, body: &str) -> Result<(), TrackerError> {
        let path = format!("{}/comments", self.issue_path(number));
        let _: serde_json::Value = self
            .http
            .post_json(&path, &json!({ "body": body }))
            .await
            .map_err(|e| issue_error(number, e))?;
        Ok(())
    }

    async fn close(&self, number: u64) -> Result<(), TrackerError> {
        let _: IssueResponse = self
            .http
            .patch_json(&self.issue_path(number), &json!({ "state": "closed" }))
            .await
            .map_err(|e| issue_error(number, e))?;
        Ok(())
    }
}
