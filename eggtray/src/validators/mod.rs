//! Profile validation
//!
//! A [`Validator`] runs an ordered list of [`Rule`]s over a
//! [`CanonicalProfile`] and concatenates their findings.
//!
//! # Rules
//! 1. **descriptor** - required fields, closed-set values, formats
//! 2. **platform** - account existence, enrichment health, projects, activity
//! 3. **content** - skill corroboration, completeness
//!
//! Each rule owns one id (see [`rules`]) and one severity. Rules report
//! [`Violation`]s; the severity and id are attached by [`Rule::evaluate`] so
//! a rule cannot emit findings under another rule's name.

pub mod content_rules;
pub mod descriptor_rules;
pub mod platform_rules;
pub mod rules;

pub use content_rules::{ProfileIncompleteRule, SkillsUncorroboratedRule};
pub use descriptor_rules::{InvalidFormatRule, MissingFieldRule, UnknownValueRule};
pub use platform_rules::{
    AccountMissingRule, ActivityStaleRule, EnrichmentUnavailableRule, NoProjectsRule,
};

use crate::models::{CanonicalProfile, Finding, Severity};
use eggtray_common::config::ValidationConfig;
use tracing::debug;

/// One problem reported by a rule, before id and severity are attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub message: String,
    pub field: Option<String>,
}

impl Violation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    pub fn on_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

/// A pure check over a merged profile
pub trait Rule: Send + Sync {
    /// Stable id from [`rules`]
    fn id(&self) -> &'static str;

    fn severity(&self) -> Severity;

    fn check(&self, profile: &CanonicalProfile, config: &ValidationConfig) -> Vec<Violation>;

    /// Run the check and turn violations into findings
    fn evaluate(&self, profile: &CanonicalProfile, config: &ValidationConfig) -> Vec<Finding> {
        self.check(profile, config)
            .into_iter()
            .map(|violation| Finding {
                rule: self.id().to_string(),
                severity: self.severity(),
                message: violation.message,
                field: violation.field,
            })
            .collect()
    }
}

/// Ordered rule set plus thresholds
pub struct Validator {
    rules: Vec<Box<dyn Rule>>,
    config: ValidationConfig,
}

impl Validator {
    /// Empty validator; add rules with [`Validator::with_rule`]
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            rules: Vec::new(),
            config,
        }
    }

    /// Every rule, for profiles backed by a descriptor
    pub fn standard(config: ValidationConfig) -> Self {
        Self::new(config)
            .with_rule(MissingFieldRule)
            .with_rule(UnknownValueRule)
            .with_rule(InvalidFormatRule)
            .with_rule(AccountMissingRule)
            .with_rule(EnrichmentUnavailableRule)
            .with_rule(NoProjectsRule)
            .with_rule(ActivityStaleRule)
            .with_rule(SkillsUncorroboratedRule)
            .with_rule(ProfileIncompleteRule)
    }

    /// Rules that only look at platform data
    ///
    /// Used when checking an account that has no descriptor.
    pub fn platform_only(config: ValidationConfig) -> Self {
        Self::new(config)
            .with_rule(AccountMissingRule)
            .with_rule(EnrichmentUnavailableRule)
            .with_rule(NoProjectsRule)
            .with_rule(ActivityStaleRule)
    }

    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Ids of the registered rules, in evaluation order
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Evaluate every rule in registration order
    pub fn validate(&self, profile: &CanonicalProfile) -> Vec<Finding> {
        let findings: Vec<Finding> = self
            .rules
            .iter()
            .flat_map(|rule| rule.evaluate(profile, &self.config))
            .collect();
        debug!(
            identity = %profile.identity,
            findings = findings.len(),
            "Profile validated"
        );
        findings
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::complete_profile;
    use super::*;
    use crate::models::EnrichmentStatus;
    use crate::validators::rules;

    #[test]
    fn test_complete_profile_has_no_findings() {
        let validator = Validator::standard(ValidationConfig::default());
        assert!(validator.validate(&complete_profile()).is_empty());
    }

    #[test]
    fn test_standard_registers_every_rule_once() {
        let validator = Validator::standard(ValidationConfig::default());
        assert_eq!(validator.rule_ids(), rules::ALL.to_vec());
    }

    #[test]
    fn test_platform_only_skips_descriptor_rules() {
        let mut profile = complete_profile();
        profile.skills = None;
        profile.languages = None;
        let findings = Validator::platform_only(ValidationConfig::default()).validate(&profile);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_validation_is_pure() {
        let mut profile = complete_profile();
        profile.skills = None;
        profile.projects = Some(Vec::new());
        profile.enrichment = EnrichmentStatus::Unavailable {
            reason: "timeout".to_string(),
        };
        let validator = Validator::standard(ValidationConfig::default());
        assert_eq!(validator.validate(&profile), validator.validate(&profile));
    }

    #[test]
    fn test_findings_carry_rule_severity() {
        let mut profile = complete_profile();
        profile.languages = Some(Vec::new());
        let findings = Validator::standard(ValidationConfig::default()).validate(&profile);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, rules::descriptor::MISSING_FIELD);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].field.as_deref(), Some("languages"));
    }
}
