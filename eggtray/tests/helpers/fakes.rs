//! Test doubles for the enrichment source and the issue tracker

use async_trait::async_trait;
use eggtray::enrichment::EnrichmentSource;
use eggtray::error::{EnrichmentError, TrackerError};
use eggtray::issues::{IssueDraft, IssueReport, IssueState, IssueTracker};
use eggtray::models::EnrichmentResult;
use eggtray_common::Identity;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Canned enrichment outcomes
///
/// Identities without a canned outcome do not exist on the platform.
/// Tracks how many fetches ran at the same time.
#[derive(Default)]
pub struct FakeSource {
    responses: BTreeMap<Identity, Result<EnrichmentResult, EnrichmentError>>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, handle: &str, outcome: Result<EnrichmentResult, EnrichmentError>) -> Self {
        self.responses
            .insert(Identity::parse(handle).unwrap(), outcome);
        self
    }

    /// Make every fetch take this long
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnrichmentSource for FakeSource {
    async fn fetch(&self, identity: &Identity) -> Result<EnrichmentResult, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.responses
            .get(identity)
            .cloned()
            .unwrap_or_else(|| Err(EnrichmentError::NotFound(identity.to_string())))
    }
}

#[derive(Default)]
struct TrackerState {
    issues: BTreeMap<u64, IssueReport>,
    comments: Vec<(u64, String)>,
    next_number: u64,
    writes: usize,
    unavailable: bool,
    failing_close: bool,
}

/// Issue tracker kept in memory
#[derive(Default)]
pub struct InMemoryTracker {
    state: Mutex<TrackerState>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker whose listing always fails
    pub fn unavailable() -> Self {
        let tracker = Self::default();
        tracker.state.lock().unwrap().unavailable = true;
        tracker
    }

    /// Tracker that rejects every close
    pub fn with_failing_close(self) -> Self {
        self.state.lock().unwrap().failing_close = true;
        self
    }

    /// Add an open issue directly, bypassing the write counter
    pub fn seed(&self, title: &str, body: &str, labels: &[&str], author: Option<&str>) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.next_number += 1;
        let number = state.next_number;
        state.issues.insert(
            number,
            IssueReport {
                number,
                title: title.to_string(),
                body: body.to_string(),
                state: IssueState::Open,
                labels: labels.iter().map(|l| l.to_string()).collect(),
                author: author.map(str::to_string),
                html_url: issue_url(number),
            },
        );
        number
    }

    pub fn issue(&self, number: u64) -> Option<IssueReport> {
        self.state.lock().unwrap().issues.get(&number).cloned()
    }

    pub fn open_issues(&self) -> Vec<IssueReport> {
        self.state
            .lock()
            .unwrap()
            .issues
            .values()
            .filter(|i| i.state == IssueState::Open)
            .cloned()
            .collect()
    }

    pub fn comments_on(&self, number: u64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .comments
            .iter()
            .filter(|(n, _)| *n == number)
            .map(|(_, body)| body.clone())
            .collect()
    }

    /// Create, update, comment and close calls so far
    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }
}

fn issue_url(number: u64) -> String {
    format!("https://github.com/org/profiles/issues/{}", number)
}

#[async_trait]
impl IssueTracker for InMemoryTracker {
    async fn list_open(&self, label: &str) -> Result<Vec<IssueReport>, TrackerError> {
        let state = self.state.lock().unwrap();
        if state.unavailable {
            return Err(TrackerError::Network("connection refused".to_string()));
        }
        Ok(state
            .issues
            .values()
            .filter(|i| i.state == IssueState::Open && i.has_label(label))
            .cloned()
            .collect())
    }

    async fn get(&self, number: u64) -> Result<IssueReport, TrackerError> {
        self.issue(number).ok_or(TrackerError::NotFound(number))
    }

    async fn create(&self, draft: &IssueDraft) -> Result<IssueReport, TrackerError> {
        let mut state = self.state.lock().unwrap();
        state.next_number += 1;
        state.writes += 1;
        let number = state.next_number;
        let issue = IssueReport {
            number,
            title: draft.title.clone(),
            body: draft.body.clone(),
            state: IssueState::Open,
            labels: draft.labels.clone(),
            author: Some("eggtray[bot]".to_string()),
            html_url: issue_url(number),
        };
        state.issues.insert(number, issue.clone());
        Ok(issue)
    }

    async fn update(
        &self,
        number: u64,
        title: &str,
        body: Option<&str>,
    ) -> Result<IssueReport, TrackerError> {
        let mut state = self.state.lock().unwrap();
        state.writes += 1;
        let issue = state
            .issues
            .get_mut(&number)
            .ok_or(TrackerError::NotFound(number))?;
        issue.title = title.to_string();
        if let Some(body) = body {
            issue.body = body.to_string();
        }
        Ok(issue.clone())
    }

    async fn comment(&self, number: u64, body: &str) -> Result<(), TrackerError> {
        let mut state = self.state.lock().unwrap();
        if !state.issues.contains_key(&number) {
            return Err(TrackerError::NotFound(number));
        }
        state.writes += 1;
        state.comments.push((number, body.to_string()));
        Ok(())
    }

    async fn close(&self, number: u64) -> Result<(), TrackerError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_close {
            return Err(TrackerError::Network("connection reset".to_string()));
        }
        state.writes += 1;
        let issue = state
            .issues
            .get_mut(&number)
            .ok_or(TrackerError::NotFound(number))?;
        issue.state = IssueState::Closed;
        Ok(())
    }
}
