//! Rules that cross-check descriptor content against platform data

use super::{rules, Rule, Violation};
use crate::models::{CanonicalProfile, Severity};
use eggtray_common::config::ValidationConfig;
use eggtray_common::Tagged;
use std::collections::BTreeSet;

/// Declared language skills should show up in repository languages
///
/// Only skills that map to a repository language count. Nothing is
/// reported while the repository list is unknown.
pub struct SkillsUncorroboratedRule;

impl Rule for SkillsUncorroboratedRule {
    fn id(&self) -> &'static str {
        rules::skills::UNCORROBORATED
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, profile: &CanonicalProfile, _config: &ValidationConfig) -> Vec<Violation> {
        let Some(seen) = &profile.repository_languages else {
            return Vec::new();
        };
        let declared: BTreeSet<&'static str> = profile
            .skills
            .iter()
            .flatten()
            .filter_map(Tagged::known)
            .filter_map(|skill| skill.github_language())
            .collect();
        if declared.is_empty() || declared.iter().any(|lang| seen.contains(*lang)) {
            return Vec::new();
        }
        vec![Violation::on_field(
            "skills",
            format!(
                "None of the declared languages ({}) appear in your repositories",
                declared.into_iter().collect::<Vec<_>>().join(", ")
            ),
        )]
    }
}

/// Share of filled optional contact/content fields
pub struct ProfileIncompleteRule;

impl ProfileIncompleteRule {
    /// Names of empty optional fields and the filled share
    pub fn completeness(profile: &CanonicalProfile) -> (Vec<&'static str>, f32) {
        let fields: [(&'static str, bool); 7] = [
            ("name", profile.name.is_some()),
            ("bio", profile.bio.is_some()),
            ("looking_for", profile.looking_for.is_some()),
            ("email", profile.email.is_some()),
            ("location", profile.location.is_some()),
            ("linkedin_url", profile.linkedin_url.is_some()),
            ("discord_id", profile.discord_id.is_some()),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, filled)| !filled)
            .map(|(name, _)| *name)
            .collect();
        let score = (fields.len() - missing.len()) as f32 / fields.len() as f32;
        (missing, score)
    }
}

impl Rule for ProfileIncompleteRule {
    fn id(&self) -> &'static str {
        rules::profile::INCOMPLETE
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, profile: &CanonicalProfile, config: &ValidationConfig) -> Vec<Violation> {
        let (missing, score) = Self::completeness(profile);
        if score >= config.min_completeness {
            return Vec::new();
        }
        vec![Violation::new(format!(
            "Profile is {:.0}% complete; consider filling in: {}",
            score * 100.0,
            missing.join(", ")
        ))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::test_support::complete_profile;
    use eggtray_common::Skill;

    fn config() -> ValidationConfig {
        ValidationConfig::default()
    }

    #[test]
    fn test_uncorroborated_language_skills() {
        let mut profile = complete_profile();
        profile.skills = Some(
            [Tagged::Known(Skill::Rust), Tagged::Known(Skill::Docker)]
                .into_iter()
                .collect(),
        );
        let findings = SkillsUncorroboratedRule.evaluate(&profile, &config());
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("Rust"));
    }

    #[test]
    fn test_tool_skills_are_not_checked() {
        let mut profile = complete_profile();
        profile.skills = Some([Tagged::Known(Skill::Docker)].into_iter().collect());
        assert!(SkillsUncorroboratedRule.evaluate(&profile, &config()).is_empty());
    }

    #[test]
    fn test_unknown_repositories_skip_corroboration() {
        let mut profile = complete_profile();
        profile.skills = Some([Tagged::Known(Skill::Rust)].into_iter().collect());
        profile.repository_languages = None;
        assert!(SkillsUncorroboratedRule.evaluate(&profile, &config()).is_empty());
    }

    #[test]
    fn test_incomplete_profile() {
        let mut profile = complete_profile();
        profile.bio = None;
        profile.looking_for = None;
        profile.email = None;
        profile.linkedin_url = None;
        let (missing, score) = ProfileIncompleteRule::completeness(&profile);
        assert_eq!(missing, vec!["bio", "looking_for", "email", "linkedin_url"]);
        assert!(score < 0.5);
        let findings = ProfileIncompleteRule.evaluate(&profile, &config());
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Profile is 43% complete"));
    }
}
