//! Artifact builder
//!
//! Serializes the finalized batch into the published listing. The file is
//! written all-or-nothing: content goes to a temporary sibling first and is
//! renamed into place.
//!
//! The listing carries no timestamps, so unchanged inputs produce a
//! byte-identical file. Consumers get the JSON schema of an entry in
//! `item_schema`.

use crate::models::{ClassifiedProfile, Finding, Project};
use eggtray_common::config::InclusionPolicy;
use eggtray_common::{Experience, Identity, Language, School, Skill, Tagged};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Published listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub count: usize,
    pub items: Vec<ArtifactEntry>,
    #[serde(default)]
    pub item_schema: serde_json::Value,
}

impl Listing {
    /// Point entries at their open reports
    ///
    /// Ready entries lose their link. A not-ready entry missing from
    /// `report_urls` (its reconciliation failed) keeps the link it had.
    pub fn apply_report_urls(&mut self, report_urls: &BTreeMap<Identity, String>) {
        for item in &mut self.items {
            if item.is_ready {
                item.report_url = None;
            } else if let Some(url) = report_urls.get(&item.github_username) {
                item.report_url = Some(url.clone());
            }
        }
    }
}

/// JSON schema of one [`ArtifactEntry`]
pub fn item_schema() -> serde_json::Value {
    json!(schema_for!(ArtifactEntry))
}

/// One profile in the listing
///
/// Every key is always written; unknown values are `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactEntry {
    pub github_username: Identity,
    pub github_url: String,
    pub name: String,
    pub bio: Option<String>,
    pub looking_for: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub discord_id: Option<u64>,
    pub linkedin_url: Option<String>,
    pub skills: Option<Vec<Tagged<Skill>>>,
    pub domains: Vec<String>,
    pub experience: Vec<Tagged<Experience>>,
    pub secondary_school: Option<Tagged<School>>,
    pub university: Option<Tagged<School>>,
    pub languages: Option<Vec<Tagged<Language>>>,
    pub projects: Option<Vec<Project>>,
    pub issues: Vec<Finding>,
    pub is_ready: bool,
    pub report_url: Option<String>,
}

impl ArtifactEntry {
    pub fn from_classified(classified: &ClassifiedProfile, report_url: Option<String>) -> Self {
        let profile = &classified.profile;
        Self {
            github_username: profile.identity.clone(),
            github_url: profile.github_url.clone(),
            name: profile.display_name.clone(),
            bio: profile.bio.clone(),
            looking_for: profile.looking_for.clone(),
            email: profile.email.clone(),
            avatar_url: profile.avatar_url.clone(),
            location: profile.location.clone(),
            discord_id: profile.discord_id,
            linkedin_url: profile.linkedin_url.clone(),
            skills: profile
                .skills
                .as_ref()
                .map(|skills| skills.iter().cloned().collect()),
            domains: profile.domains.clone(),
            experience: profile.experience.iter().cloned().collect(),
            secondary_school: profile.secondary_school.clone(),
            university: profile.university.clone(),
            languages: profile.languages.clone(),
            projects: profile.projects.clone(),
            issues: classified.findings.clone(),
            is_ready: classified.state.is_ready(),
            report_url,
        }
    }
}

/// Build the listing from finalized profiles
///
/// Entries are sorted by identity regardless of input order.
pub fn build_listing(
    profiles: &[ClassifiedProfile],
    report_urls: &BTreeMap<Identity, String>,
    include: InclusionPolicy,
) -> Listing {
    let mut items: Vec<ArtifactEntry> = profiles
        .iter()
        .filter(|p| match include {
            InclusionPolicy::All => true,
            InclusionPolicy::Ready => p.state.is_ready(),
        })
        .map(|p| ArtifactEntry::from_classified(p, report_urls.get(&p.profile.identity).cloned()))
        .collect();
    items.sort_by(|a, b| a.github_username.cmp(&b.github_username));

    Listing {
        count: items.len(),
        items,
        item_schema: item_schema(),
    }
}

/// Write the listing as pretty JSON, replacing `path` atomically
pub fn write_listing(listing: &Listing, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(listing)?;

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(&json)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    info!(
        count = listing.count,
        path = %path.display(),
        "Listing written"
    );
    Ok(())
}

/// Read a listing written by [`write_listing`]
pub fn read_listing(path: &Path) -> std::io::Result<Listing> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(std::io::Error::from)
}
