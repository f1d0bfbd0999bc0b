//! Issue reporting
//!
//! Keeps one open "not ready" report per identity in sync with the latest
//! validation outcome.
//!
//! # Reconciliation
//! [`plan`] is a pure function from (identity, state, findings, open
//! reports) to [`ReportAction`]s:
//! - not ready, no report: create one
//! - not ready, one report: update it when title or body changed
//! - not ready, several reports: keep the lowest number, close the rest as
//!   duplicates
//! - ready, open reports: close them as fixed
//! - ready, no report: nothing
//!
//! [`Reporter`] executes plans against an [`IssueTracker`].

pub mod github;
pub mod render;
pub mod reporter;

pub use github::GitHubTracker;
pub use reporter::{ReconcileReport, ReportSubject, Reporter};

use crate::error::TrackerError;
use crate::models::{Finding, ReadinessState};
use async_trait::async_trait;
use eggtray_common::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Issue state as reported by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => f.write_str("open"),
            IssueState::Closed => f.write_str("closed"),
        }
    }
}

/// Tracked issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueReport {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub state: IssueState,
    pub labels: Vec<String>,
    pub author: Option<String>,
    pub html_url: String,
}

impl IssueReport {
    /// Identity the report is about: body marker first, then `@handle` in the title
    pub fn identity(&self) -> Option<Identity> {
        render::parse_identity_marker(&self.body).or_else(|| render::mentioned_handle(&self.title))
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// New issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// Why a report gets closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The profile became ready
    Fixed,
    /// Another open report for the same identity is kept
    Duplicate { of: u64 },
}

impl CloseReason {
    pub fn comment(&self) -> String {
        match self {
            CloseReason::Fixed => render::FIXED_COMMENT.to_string(),
            CloseReason::Duplicate { of } => render::duplicate_comment(*of),
        }
    }
}

/// One tracker operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportAction {
    Create(IssueDraft),
    Update {
        number: u64,
        title: String,
        body: String,
    },
    Close {
        number: u64,
        reason: CloseReason,
    },
    NoOp,
}

/// Issue tracker operations used by the reporter and the check command
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Open issues carrying `label`, pull requests excluded
    async fn list_open(&self, label: &str) -> Result<Vec<IssueReport>, TrackerError>;

    async fn get(&self, number: u64) -> Result<IssueReport, TrackerError>;

    async fn create(&self, draft: &IssueDraft) -> Result<IssueReport, TrackerError>;

    /// Replace title and, when given, body
    async fn update(
        &self,
        number: u64,
        title: &str,
        body: Option<&str>,
    ) -> Result<IssueReport, TrackerError>;

    async fn comment(&self, number: u64, body: &str) -> Result<(), TrackerError>;

    async fn close(&self, number: u64) -> Result<(), TrackerError>;
}

/// Decide how to bring the reports of one identity up to date
///
/// `open_reports` may contain reports of other identities; they are ignored.
pub fn plan(
    identity: &Identity,
    state: ReadinessState,
    findings: &[Finding],
    open_reports: &[IssueReport],
    label: &str,
) -> Vec<ReportAction> {
    let mut own: Vec<&IssueReport> = open_reports
        .iter()
        .filter(|r| r.state == IssueState::Open)
        .filter(|r| r.identity().as_ref() == Some(identity))
        .collect();
    own.sort_by_key(|r| r.number);

    let mut actions = Vec::new();
    match state {
        ReadinessState::Ready => {
            actions.extend(own.iter().map(|r| ReportAction::Close {
                number: r.number,
                reason: CloseReason::Fixed,
            }));
        }
        ReadinessState::NotReady => {
            let title = render::report_title(identity);
            let body = render::report_body(identity, findings);
            match own.split_first() {
                None => actions.push(ReportAction::Create(IssueDraft {
                    title,
                    body,
                    labels: vec![label.to_string()],
                })),
                Some((kept, duplicates)) => {
                    if kept.title != title || kept.body != body {
                        actions.push(ReportAction::Update {
                            number: kept.number,
                            title,
                            body,
                        });
                    }
                    if !duplicates.is_empty() {
                        warn!(
                            identity = %identity,
                            kept = kept.number,
                            duplicates = duplicates.len(),
                            "Several open reports for one identity"
                        );
                    }
                    actions.extend(duplicates.iter().map(|r| ReportAction::Close {
                        number: r.number,
                        reason: CloseReason::Duplicate { of: kept.number },
                    }));
                }
            }
        }
    }

    if actions.is_empty() {
        actions.push(ReportAction::NoOp);
    }
    actions
}
