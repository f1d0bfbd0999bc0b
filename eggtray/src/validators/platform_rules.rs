//! Rules over platform data
//!
//! None of these look at descriptor content, so they also apply to
//! accounts checked without a descriptor. Unknown platform data (a failed
//! lookup) never produces a content finding; it is reported once by
//! [`EnrichmentUnavailableRule`].

use super::{rules, Rule, Violation};
use crate::models::{CanonicalProfile, EnrichmentStatus, Severity};
use chrono::Duration;
use eggtray_common::config::ValidationConfig;

/// The account does not exist on the platform
pub struct AccountMissingRule;

impl Rule for AccountMissingRule {
    fn id(&self) -> &'static str {
        rules::github::ACCOUNT_MISSING
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, profile: &CanonicalProfile, _config: &ValidationConfig) -> Vec<Violation> {
        match profile.enrichment {
            EnrichmentStatus::AccountMissing => vec![Violation::new(format!(
                "GitHub account {} does not exist",
                profile.github_url
            ))],
            _ => Vec::new(),
        }
    }
}

/// Platform data is missing, fully or partly
pub struct EnrichmentUnavailableRule;

impl Rule for EnrichmentUnavailableRule {
    fn id(&self) -> &'static str {
        rules::github::ENRICHMENT_UNAVAILABLE
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, profile: &CanonicalProfile, _config: &ValidationConfig) -> Vec<Violation> {
        match &profile.enrichment {
            EnrichmentStatus::Unavailable { reason } => vec![Violation::new(format!(
                "GitHub data could not be fetched ({}); platform checks were skipped",
                reason
            ))],
            EnrichmentStatus::Partial { missing } => {
                let parts: Vec<String> = missing.iter().map(|p| p.to_string()).collect();
                vec![Violation::new(format!(
                    "Some GitHub data could not be fetched: {}",
                    parts.join(", ")
                ))]
            }
            EnrichmentStatus::Fetched | EnrichmentStatus::AccountMissing => Vec::new(),
        }
    }
}

/// Repositories are known and none qualifies as a project
pub struct NoProjectsRule;

impl Rule for NoProjectsRule {
    fn id(&self) -> &'static str {
        rules::github::NO_PROJECTS
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, profile: &CanonicalProfile, _config: &ValidationConfig) -> Vec<Violation> {
        match &profile.projects {
            Some(projects) if projects.is_empty() => vec![Violation::on_field(
                "projects",
                "No public repository of your own to show; publish at least one project \
                 that is neither a fork nor archived",
            )],
            _ => Vec::new(),
        }
    }
}

/// No push within `stale_after_days` of `as_of`
pub struct ActivityStaleRule;

impl Rule for ActivityStaleRule {
    fn id(&self) -> &'static str {
        rules::github::ACTIVITY_STALE
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, profile: &CanonicalProfile, config: &ValidationConfig) -> Vec<Violation> {
        // Repository list unknown
        if profile.projects.is_none() {
            return Vec::new();
        }
        match profile.last_activity_at {
            None => vec![Violation::new("No push to any of your repositories was found")],
            Some(last) if profile.as_of - last > Duration::days(config.stale_after_days) => {
                vec![Violation::new(format!(
                    "Last push to your repositories was on {}, more than {} days ago",
                    last.format("%Y-%m-%d"),
                    config.stale_after_days
                ))]
            }
            Some(_) => Vec::new(),
        }
    }
}
