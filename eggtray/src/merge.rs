//! Merge engine
//!
//! Combines a descriptor with the enrichment outcome for the same identity
//! into a [`CanonicalProfile`].
//!
//! # Precedence
//!
//! Descriptor values win for `name`, `bio`, `email`, `location` and
//! `linkedin_url`; platform values only fill fields the descriptor leaves
//! unset or empty. Declared values are carried over verbatim. `display_name` falls back from the descriptor name to the
//! platform name to the handle itself.
//!
//! A failed enrichment never fails the merge: the profile is built from the
//! descriptor alone and the failure is recorded in
//! [`CanonicalProfile::enrichment`].

use crate::error::EnrichmentError;
use crate::models::{
    CanonicalProfile, Descriptor, EnrichmentResult, EnrichmentStatus, Project, Repository,
};
use chrono::{DateTime, Utc};
use eggtray_common::Identity;
use std::cmp::Reverse;

/// Merge one descriptor with its enrichment outcome
///
/// Pure: identical inputs give an identical profile.
pub fn merge(
    identity: &Identity,
    descriptor: &Descriptor,
    enrichment: Result<&EnrichmentResult, &EnrichmentError>,
    as_of: DateTime<Utc>,
    max_projects: usize,
) -> CanonicalProfile {
    let fetched = enrichment.ok();

    let name = prefer(&descriptor.name, fetched.and_then(|e| e.name.as_ref()));
    let display_name = name
        .clone()
        .unwrap_or_else(|| identity.as_str().to_string());

    CanonicalProfile {
        identity: identity.clone(),
        github_url: identity.profile_url(),
        display_name,
        name,
        bio: prefer(&descriptor.bio, fetched.and_then(|e| e.bio.as_ref())),
        looking_for: non_empty(&descriptor.looking_for),
        email: prefer(&descriptor.email, fetched.and_then(|e| e.email.as_ref())),
        location: prefer(&descriptor.location, fetched.and_then(|e| e.location.as_ref())),
        discord_id: descriptor.discord_id,
        linkedin_url: prefer(
            &descriptor.linkedin_url,
            fetched.and_then(|e| e.linkedin_url.as_ref()),
        ),
        avatar_url: fetched.and_then(|e| e.avatar_url.clone()),
        skills: descriptor
            .skills
            .as_ref()
            .map(|skills| skills.iter().cloned().collect()),
        domains: descriptor.domains.clone(),
        experience: descriptor.experience.iter().cloned().collect(),
        secondary_school: descriptor.secondary_school.clone(),
        university: descriptor.university.clone(),
        languages: descriptor.languages.clone(),
        projects: fetched
            .and_then(|e| e.repositories.as_deref())
            .map(|repos| select_projects(repos, max_projects)),
        repository_languages: fetched.and_then(|e| e.repository_languages()),
        last_activity_at: fetched.and_then(|e| e.last_activity_at()),
        enrichment: status_of(enrichment),
        as_of,
    }
}

/// Owned, non-fork, non-archived repositories; most starred first
pub fn select_projects(repositories: &[Repository], max_projects: usize) -> Vec<Project> {
    let mut candidates: Vec<&Repository> = repositories
        .iter()
        .filter(|r| !r.fork && !r.archived)
        .collect();
    candidates.sort_by(|a, b| {
        (Reverse(a.stargazers_count), &a.name).cmp(&(Reverse(b.stargazers_count), &b.name))
    });
    candidates
        .into_iter()
        .take(max_projects)
        .map(|r| Project {
            name: r.name.clone(),
            url: r.html_url.clone(),
            description: non_empty(&r.description),
            language: r.language.clone(),
            stars: r.stargazers_count,
            demo_url: non_empty(&r.homepage),
            topics: r.topics.clone(),
        })
        .collect()
}

fn status_of(enrichment: Result<&EnrichmentResult, &EnrichmentError>) -> EnrichmentStatus {
    match enrichment {
        Ok(result) if result.is_partial() => EnrichmentStatus::Partial {
            missing: result.missing.clone(),
        },
        Ok(_) => EnrichmentStatus::Fetched,
        Err(EnrichmentError::NotFound(_)) => EnrichmentStatus::AccountMissing,
        Err(err) => EnrichmentStatus::Unavailable {
            reason: err.to_string(),
        },
    }
}

fn prefer(own: &Option<String>, fallback: Option<&String>) -> Option<String> {
    non_empty(own).or_else(|| fallback.and_then(|v| non_empty_str(v)))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().and_then(non_empty_str)
}

fn non_empty_str(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnrichmentPart;
    use chrono::TimeZone;
    use eggtray_common::{Skill, Tagged};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn identity() -> Identity {
        Identity::parse("octocat").unwrap()
    }

    fn repo(name: &str, stars: u32, fork: bool, archived: bool) -> Repository {
        Repository {
            name: name.to_string(),
            html_url: format!("https://github.com/octocat/{}", name),
            description: Some(format!("{} project", name)),
            language: Some("Python".to_string()),
            stargazers_count: stars,
            fork,
            archived,
            pushed_at: None,
            homepage: Some(String::new()),
            topics: Vec::new(),
        }
    }

    fn enrichment() -> EnrichmentResult {
        let mut result = EnrichmentResult::empty("octocat");
        result.name = Some("The Octocat".to_string());
        result.bio = Some("GitHub mascot".to_string());
        result.location = Some("San Francisco".to_string());
        result.avatar_url = Some("https://avatars.example/octocat".to_string());
        result.repositories = Some(vec![repo("b", 5, false, false), repo("a", 5, false, false)]);
        result
    }

    #[test]
    fn test_descriptor_wins_over_platform() {
        let descriptor = Descriptor {
            name: Some("Mona Lisa".to_string()),
            bio: Some(String::new()),
            ..Default::default()
        };
        let result = enrichment();
        let profile = merge(&identity(), &descriptor, Ok(&result), as_of(), 6);

        assert_eq!(profile.name.as_deref(), Some("Mona Lisa"));
        assert_eq!(profile.display_name, "Mona Lisa");
        // Empty descriptor values count as unset
        assert_eq!(profile.bio.as_deref(), Some("GitHub mascot"));
        assert_eq!(profile.location.as_deref(), Some("San Francisco"));
        assert_eq!(profile.github_url, "https://github.com/octocat");
        assert_eq!(profile.enrichment, EnrichmentStatus::Fetched);
    }

    #[test]
    fn test_declared_values_are_kept_verbatim() {
        let descriptor = Descriptor {
            name: Some("  Jana  ".to_string()),
            bio: Some("line\n".to_string()),
            location: Some(" ".to_string()),
            ..Default::default()
        };
        let result = enrichment();
        let profile = merge(&identity(), &descriptor, Ok(&result), as_of(), 6);

        assert_eq!(profile.name, descriptor.name);
        assert_eq!(profile.bio, descriptor.bio);
        assert_eq!(profile.location, descriptor.location);
        assert_eq!(profile.display_name, "  Jana  ");
    }

    #[test]
    fn test_projects_sorted_by_stars_then_name_and_capped() {
        let repos = vec![
            repo("zeta", 10, false, false),
            repo("beta", 3, false, false),
            repo("alpha", 3, false, false),
            repo("forked", 100, true, false),
            repo("old", 50, false, true),
        ];
        let projects = select_projects(&repos, 2);
        let names: Vec<_> = projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(projects[0].demo_url, None);
    }

    #[test]
    fn test_failed_enrichment_gives_descriptor_only_profile() {
        let descriptor = Descriptor {
            skills: Some(vec![Tagged::Known(Skill::Python)]),
            ..Default::default()
        };
        let err = EnrichmentError::Transient("timeout".to_string());
        let profile = merge(&identity(), &descriptor, Err(&err), as_of(), 6);

        assert_eq!(profile.display_name, "octocat");
        assert_eq!(profile.projects, None);
        assert_eq!(profile.avatar_url, None);
        assert_eq!(profile.skills.as_ref().map(|s| s.len()), Some(1));
        assert!(matches!(profile.enrichment, EnrichmentStatus::Unavailable { .. }));
    }

    #[test]
    fn test_not_found_marks_account_missing() {
        let err = EnrichmentError::NotFound("octocat".to_string());
        let profile = merge(&identity(), &Descriptor::default(), Err(&err), as_of(), 6);
        assert_eq!(profile.enrichment, EnrichmentStatus::AccountMissing);
    }

    #[test]
    fn test_partial_enrichment_keeps_unknown_repositories() {
        let mut result = enrichment();
        result.repositories = None;
        result.missing = vec![EnrichmentPart::Repositories];
        let profile = merge(&identity(), &Descriptor::default(), Ok(&result), as_of(), 6);

        assert_eq!(profile.projects, None);
        assert_eq!(
            profile.enrichment,
            EnrichmentStatus::Partial {
                missing: vec![EnrichmentPart::Repositories]
            }
        );
    }

    #[test]
    fn test_merge_is_deterministic() {
        let descriptor = Descriptor::parse("skills: [python, rust]\nlanguages: [en]\n").unwrap();
        let result = enrichment();
        let first = merge(&identity(), &descriptor, Ok(&result), as_of(), 6);
        let second = merge(&identity(), &descriptor, Ok(&result), as_of(), 6);
        assert_eq!(first, second);
    }
}
