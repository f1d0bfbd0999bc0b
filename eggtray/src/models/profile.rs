//! Canonical profile: the merged unit of truth for one identity

use super::enrichment::EnrichmentPart;
use chrono::{DateTime, Utc};
use eggtray_common::{Experience, Identity, Language, School, Skill, Tagged};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How much of the platform data made it into the profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Fetched,
    Partial { missing: Vec<EnrichmentPart> },
    Unavailable { reason: String },
    /// The platform reports that the account does not exist
    AccountMissing,
}

impl EnrichmentStatus {
    pub fn is_fetched(&self) -> bool {
        matches!(self, EnrichmentStatus::Fetched | EnrichmentStatus::Partial { .. })
    }
}

/// Repository exposed as a showcase project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u32,
    pub demo_url: Option<String>,
    pub topics: Vec<String>,
}

/// Merged profile
///
/// `None` on an enrichment-derived field means "unknown" (the lookup failed),
/// while an empty collection means "known to be empty".
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalProfile {
    pub identity: Identity,
    pub github_url: String,
    pub display_name: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub looking_for: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub discord_id: Option<u64>,
    pub linkedin_url: Option<String>,
    pub avatar_url: Option<String>,
    /// `None` when the descriptor omits the field
    pub skills: Option<BTreeSet<Tagged<Skill>>>,
    pub domains: Vec<String>,
    pub experience: BTreeSet<Tagged<Experience>>,
    pub secondary_school: Option<Tagged<School>>,
    pub university: Option<Tagged<School>>,
    /// `None` when the descriptor omits the field
    pub languages: Option<Vec<Tagged<Language>>>,
    pub projects: Option<Vec<Project>>,
    pub repository_languages: Option<BTreeSet<String>>,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub enrichment: EnrichmentStatus,
    /// Reference time for recency rules
    pub as_of: DateTime<Utc>,
}
