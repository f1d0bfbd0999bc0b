//! Reconciliation runner
//!
//! Lists the open reports once, then reconciles identities concurrently.
//! The actions of one identity run in order; a tracker failure for one
//! identity is logged and collected without stopping the others.

use super::{plan, IssueReport, IssueTracker, ReportAction};
use crate::artifact::ArtifactEntry;
use crate::error::TrackerError;
use crate::models::{ClassifiedProfile, Finding, ReadinessState};
use eggtray_common::Identity;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// What the reporter needs to know about one profile
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSubject {
    pub identity: Identity,
    pub state: ReadinessState,
    pub findings: Vec<Finding>,
}

impl From<&ClassifiedProfile> for ReportSubject {
    fn from(classified: &ClassifiedProfile) -> Self {
        Self {
            identity: classified.profile.identity.clone(),
            state: classified.state,
            findings: classified.findings.clone(),
        }
    }
}

impl From<&ArtifactEntry> for ReportSubject {
    fn from(entry: &ArtifactEntry) -> Self {
        Self {
            identity: entry.github_username.clone(),
            state: if entry.is_ready {
                ReadinessState::Ready
            } else {
                ReadinessState::NotReady
            },
            findings: entry.issues.clone(),
        }
    }
}

/// Outcome of one reconciliation run
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Open report of every not-ready identity that was reconciled
    pub report_urls: BTreeMap<Identity, String>,
    /// Tracker operations performed (no-ops excluded)
    pub operations: usize,
    pub failures: Vec<(Identity, TrackerError)>,
}

/// Executes reconciliation plans against a tracker
pub struct Reporter {
    tracker: Arc<dyn IssueTracker>,
    label: String,
    concurrency: usize,
}

impl Reporter {
    pub fn new(tracker: Arc<dyn IssueTracker>, label: impl Into<String>, concurrency: usize) -> Self {
        Self {
            tracker,
            label: label.into(),
            concurrency: concurrency.max(1),
        }
    }

    /// Reconcile every subject
    ///
    /// Fails only when the open reports cannot be listed.
    pub async fn reconcile_all(
        &self,
        subjects: &[ReportSubject],
    ) -> Result<ReconcileReport, TrackerError> {
        info!(label = %self.label, "Fetching open reports");
        let open = self.tracker.list_open(&self.label).await?;
        info!(open = open.len(), subjects = subjects.len(), "Reconciling reports");

        let outcomes: Vec<(Identity, Result<(usize, Option<String>), TrackerError>)> =
            stream::iter(subjects)
                .map(|subject| {
                    let open = &open;
                    async move {
                        let outcome = self.reconcile_one(subject, open).await;
                        (subject.identity.clone(), outcome)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        let mut report = ReconcileReport::default();
        for (identity, outcome) in outcomes {
            match outcome {
                Ok((operations, url)) => {
                    report.operations += operations;
                    if let Some(url) = url {
                        report.report_urls.insert(identity, url);
                    }
                }
                Err(err) => {
                    error!(identity = %identity, error = %err, "Report reconciliation failed");
                    report.failures.push((identity, err));
                }
            }
        }
        report.failures.sort_by(|a, b| a.0.cmp(&b.0));

        info!(
            operations = report.operations,
            failures = report.failures.len(),
            "Reports reconciled"
        );
        Ok(report)
    }

    /// Run the plan of one identity; returns operation count and report URL
    async fn reconcile_one(
        &self,
        subject: &ReportSubject,
        open: &[IssueReport],
    ) -> Result<(usize, Option<String>), TrackerError> {
        let identity = &subject.identity;
        let actions = plan(identity, subject.state, &subject.findings, open, &self.label);

        let mut url = if subject.state.is_ready() {
            None
        } else {
            open.iter()
                .filter(|r| r.identity().as_ref() == Some(identity))
                .min_by_key(|r| r.number)
                .map(|r| r.html_url.clone())
        };
        let mut operations = 0;

        for action in actions {
            match action {
                ReportAction::NoOp => {
                    debug!(identity = %identity, "Report up to date");
                }
                ReportAction::Create(draft) => {
                    let created = self.tracker.create(&draft).await?;
                    info!(identity = %identity, url = %created.html_url, "Report created");
                    url = Some(created.html_url);
                    operations += 1;
                }
                ReportAction::Update { number, title, body } => {
                    let updated = self.tracker.update(number, &title, Some(&body)).await?;
                    info!(identity = %identity, url = %updated.html_url, "Report updated");
                    url = Some(updated.html_url);
                    operations += 1;
                }
                ReportAction::Close { number, reason } => {
                    // Closed reports are not listed again, so the comment
                    // is posted at most once.
                    self.tracker.close(number).await?;
                    self.tracker.comment(number, &reason.comment()).await?;
                    info!(identity = %identity, number, reason = ?reason, "Report closed");
                    operations += 2;
                }
            }
        }

        Ok((operations, url))
    }
}
