//! Facts fetched from the code-hosting platform for one identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Part of an enrichment lookup that can fail on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentPart {
    Repositories,
    SocialAccounts,
}

impl std::fmt::Display for EnrichmentPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentPart::Repositories => f.write_str("repositories"),
            EnrichmentPart::SocialAccounts => f.write_str("social accounts"),
        }
    }
}

/// Public repository owned by the account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
    pub pushed_at: Option<DateTime<Utc>>,
    pub homepage: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Result of enriching one identity
///
/// `repositories` and `linkedin_url` may be unknown when their lookup
/// failed; such parts are listed in `missing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub avatar_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub public_repos: u32,
    pub repositories: Option<Vec<Repository>>,
    #[serde(default)]
    pub missing: Vec<EnrichmentPart>,
}

impl EnrichmentResult {
    /// Minimal result for an account with no public data
    pub fn empty(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            name: None,
            bio: None,
            email: None,
            location: None,
            blog: None,
            avatar_url: None,
            linkedin_url: None,
            public_repos: 0,
            repositories: Some(Vec::new()),
            missing: Vec::new(),
        }
    }

    /// Latest push to any owned repository
    pub fn last_activity_at(&self) -> Option<DateTime<Utc>> {
        self.repositories
            .as_ref()?
            .iter()
            .filter(|r| !r.fork)
            .filter_map(|r| r.pushed_at)
            .max()
    }

    /// Primary languages of owned repositories
    pub fn repository_languages(&self) -> Option<BTreeSet<String>> {
        let repos = self.repositories.as_ref()?;
        Some(
            repos
                .iter()
                .filter(|r| !r.fork)
                .filter_map(|r| r.language.clone())
                .collect(),
        )
    }

    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn repo(name: &str, language: Option<&str>, fork: bool, pushed: Option<DateTime<Utc>>) -> Repository {
        Repository {
            name: name.to_string(),
            html_url: format!("https://github.com/someone/{}", name),
            description: None,
            language: language.map(str::to_string),
            stargazers_count: 0,
            fork,
            archived: false,
            pushed_at: pushed,
            homepage: None,
            topics: Vec::new(),
        }
    }

    #[test]
    fn test_last_activity_ignores_forks() {
        let old = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let new = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut result = EnrichmentResult::empty("someone");
        result.repositories = Some(vec![
            repo("own", Some("Python"), false, Some(old)),
            repo("forked", Some("Rust"), true, Some(new)),
        ]);
        assert_eq!(result.last_activity_at(), Some(old));
        assert_eq!(
            result.repository_languages().unwrap().into_iter().collect::<Vec<_>>(),
            vec!["Python".to_string()]
        );
    }

    #[test]
    fn test_unknown_repositories() {
        let mut result = EnrichmentResult::empty("someone");
        result.repositories = None;
        result.missing = vec![EnrichmentPart::Repositories];
        assert_eq!(result.last_activity_at(), None);
        assert_eq!(result.repository_languages(), None);
        assert!(result.is_partial());
    }
}
