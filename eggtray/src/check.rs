//! Ad-hoc profile check requested through an issue
//!
//! Someone opens an issue labelled `check` that mentions `@handle` (or
//! nobody, in which case the issue author is checked). The check:
//! 1. skips issues in a disallowed state or without the label
//! 2. fetches platform data; an authentication failure stops here, before
//!    anything is written to the tracker
//! 3. retitles the issue and posts an acknowledgement
//! 4. merges and validates the profile; the descriptor from the profiles
//!    directory is used when one exists, otherwise only the platform rules run
//! 5. posts the findings (or a "profile does not exist" note)
//! 6. closes the issue

use crate::enrichment::EnrichmentSource;
use crate::error::{EnrichmentError, SystemicError, SystemicResult};
use crate::issues::{render, IssueState, IssueTracker};
use crate::loader::{find_descriptor, load_descriptor};
use crate::merge::merge;
use crate::models::{Descriptor, Finding, ReadinessState};
use crate::pipeline::Pipeline;
use crate::validators::Validator;
use chrono::{DateTime, Utc};
use eggtray_common::config::ValidationConfig;
use eggtray_common::{Error, Identity};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Which issue to check and how to report
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub issue: u64,
    /// Issue states that may be checked; usually only `open`
    pub states: Vec<IssueState>,
    /// Link appended to comments (CI run log)
    pub run_url: Option<String>,
}

/// What the check did
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Skipped { reason: String },
    AccountMissing { identity: Identity },
    Checked {
        identity: Identity,
        state: ReadinessState,
        findings: Vec<Finding>,
    },
}

/// Runs check requests
pub struct Checker {
    tracker: Arc<dyn IssueTracker>,
    source: Arc<dyn EnrichmentSource>,
    validation: ValidationConfig,
    check_label: String,
    profiles_dir: Option<PathBuf>,
    max_projects: usize,
}

impl Checker {
    pub fn new(
        tracker: Arc<dyn IssueTracker>,
        source: Arc<dyn EnrichmentSource>,
        validation: ValidationConfig,
        check_label: impl Into<String>,
    ) -> Self {
        Self {
            tracker,
            source,
            validation,
            check_label: check_label.into(),
            profiles_dir: None,
            max_projects: 6,
        }
    }

    /// Look up descriptors in this directory
    pub fn with_profiles_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profiles_dir = Some(dir.into());
        self
    }

    pub fn with_max_projects(mut self, max_projects: usize) -> Self {
        self.max_projects = max_projects;
        self
    }

    pub async fn run(&self, request: &CheckRequest, as_of: DateTime<Utc>) -> SystemicResult<CheckOutcome> {
        let number = request.issue;
        info!(issue = number, "Fetching check issue");
        let issue = self.tracker.get(number).await?;

        if !request.states.contains(&issue.state) {
            let reason = format!("issue #{} is {}", number, issue.state);
            warn!(issue = number, state = %issue.state, "Issue state not allowed, skipping");
            return Ok(CheckOutcome::Skipped { reason });
        }
        if !issue.has_label(&self.check_label) {
            warn!(issue = number, label = %self.check_label, "Issue is missing the check label, skipping");
            return Ok(CheckOutcome::Skipped {
                reason: format!("issue #{} lacks the {:?} label", number, self.check_label),
            });
        }

        let identity = match render::mentioned_handle(&issue.body) {
            Some(identity) => {
                info!(issue = number, identity = %identity, "Issue mentions a handle");
                identity
            }
            None => match issue.author.as_deref().and_then(|a| Identity::parse(a).ok()) {
                Some(identity) => {
                    info!(issue = number, identity = %identity, "No handle mentioned, checking the author");
                    identity
                }
                None => {
                    warn!(issue = number, "Issue mentions no handle and has no author");
                    return Ok(CheckOutcome::Skipped {
                        reason: format!("issue #{} names nobody to check", number),
                    });
                }
            },
        };

        // No tracker writes before a systemic failure can surface
        let enrichment = self.source.fetch(&identity).await;
        if let Err(err) = &enrichment {
            if err.is_systemic() {
                return Err(SystemicError::Auth(err.to_string()));
            }
        }

        let run_url = request.run_url.as_deref();
        self.tracker
            .update(number, &render::check_title(&identity), None)
            .await?;
        self.tracker
            .comment(number, &render::wait_comment(&identity, run_url))
            .await?;

        let outcome = match &enrichment {
            Err(EnrichmentError::NotFound(_)) => {
                error!(identity = %identity, "Profile does not exist");
                self.tracker
                    .comment(number, &render::missing_account_comment(&identity, run_url))
                    .await?;
                CheckOutcome::AccountMissing { identity }
            }
            _ => {
                let (descriptor, validator) = self.descriptor_and_validator(&identity);
                let profile = merge(&identity, &descriptor, enrichment.as_ref(), as_of, self.max_projects);
                let classified = Pipeline::new(self.source.clone(), validator).evaluate(profile);
                info!(
                    identity = %identity,
                    state = %classified.state,
                    findings = classified.findings.len(),
                    "Posting check summary"
                );
                self.tracker
                    .comment(
                        number,
                        &render::summary_comment(&identity, classified.state, &classified.findings, run_url),
                    )
                    .await?;
                CheckOutcome::Checked {
                    identity,
                    state: classified.state,
                    findings: classified.findings,
                }
            }
        };

        self.tracker.close(number).await?;
        info!(issue = number, "Check issue closed");
        Ok(outcome)
    }

    fn descriptor_and_validator(&self, identity: &Identity) -> (Descriptor, Validator) {
        let path = self
            .profiles_dir
            .as_deref()
            .and_then(|dir| find_descriptor(dir, identity));
        match path.map(|p| load_descriptor(&p)) {
            Some(Ok((_, descriptor))) => {
                debug!(identity = %identity, "Checking with descriptor");
                (descriptor, Validator::standard(self.validation.clone()))
            }
            Some(Err(err)) => {
                warn!(identity = %identity, error = %err, "Descriptor unusable, checking platform data only");
                (Descriptor::default(), Validator::platform_only(self.validation.clone()))
            }
            None => {
                debug!(identity = %identity, "No descriptor, checking platform data only");
                (Descriptor::default(), Validator::platform_only(self.validation.clone()))
            }
        }
    }
}

#[derive(Deserialize)]
struct EventPayload {
    issue: EventIssue,
}

#[derive(Deserialize)]
struct EventIssue {
    number: u64,
}

/// Issue number from a GitHub Actions event payload
pub fn issue_number_from_event(path: &Path) -> eggtray_common::Result<u64> {
    let content = std::fs::read_to_string(path)?;
    let payload: EventPayload = serde_json::from_str(&content).map_err(|e| {
        Error::Parse(format!("{}: not an issue event payload: {}", path.display(), e))
    })?;
    Ok(payload.issue.number)
}

/// Link to a GitHub Actions run
pub fn run_url(repository: &str, run_id: u64) -> String {
    format!("https://github.com/{}/actions/runs/{}", repository, run_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_issue_number_from_event() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(&path, r#"{"action":"labeled","issue":{"number":17,"title":"x"}}"#).unwrap();
        assert_eq!(issue_number_from_event(&path).unwrap(), 17);

        std::fs::write(&path, r#"{"action":"push"}"#).unwrap();
        assert!(issue_number_from_event(&path).is_err());
    }

    #[test]
    fn test_run_url() {
        assert_eq!(
            run_url("org/profiles", 99),
            "https://github.com/org/profiles/actions/runs/99"
        );
    }
}
