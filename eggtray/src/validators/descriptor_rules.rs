//! Rules over hand-authored descriptor content

use super::{rules, Rule, Violation};
use crate::models::{CanonicalProfile, Severity};
use eggtray_common::config::ValidationConfig;
use eggtray_common::{Experience, RegistryEnum, School, Skill, Tagged};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("static regex"));

const LINKEDIN_HOST: &str = "linkedin.com";

/// `skills` and `languages` must be present and non-empty
pub struct MissingFieldRule;

impl Rule for MissingFieldRule {
    fn id(&self) -> &'static str {
        rules::descriptor::MISSING_FIELD
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, profile: &CanonicalProfile, _config: &ValidationConfig) -> Vec<Violation> {
        let mut violations = Vec::new();
        if profile.skills.as_ref().map_or(true, |s| s.is_empty()) {
            violations.push(Violation::on_field(
                "skills",
                "List at least one skill under `skills`",
            ));
        }
        if profile.languages.as_ref().map_or(true, |l| l.is_empty()) {
            violations.push(Violation::on_field(
                "languages",
                "List the languages you speak under `languages` (ISO 639-1 codes)",
            ));
        }
        violations
    }
}

/// One warning per value outside its closed set
pub struct UnknownValueRule;

impl UnknownValueRule {
    fn unknown_registry_value<T: RegistryEnum>(
        field: &str,
        value: &Tagged<T>,
    ) -> Option<Violation> {
        match value {
            Tagged::Known(_) => None,
            Tagged::Unknown(raw) => Some(Violation::on_field(
                field,
                format!(
                    "Unknown {} {:?}; allowed values: {}",
                    T::KIND,
                    raw,
                    T::allowed_values().join(", ")
                ),
            )),
        }
    }
}

impl Rule for UnknownValueRule {
    fn id(&self) -> &'static str {
        rules::descriptor::UNKNOWN_VALUE
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, profile: &CanonicalProfile, _config: &ValidationConfig) -> Vec<Violation> {
        let mut violations = Vec::new();

        for skill in profile.skills.iter().flatten() {
            violations.extend(Self::unknown_registry_value::<Skill>("skills", skill));
        }
        for experience in &profile.experience {
            violations.extend(Self::unknown_registry_value::<Experience>(
                "experience",
                experience,
            ));
        }
        if let Some(school) = &profile.secondary_school {
            violations.extend(Self::unknown_registry_value::<School>(
                "secondary_school",
                school,
            ));
        }
        if let Some(school) = &profile.university {
            violations.extend(Self::unknown_registry_value::<School>("university", school));
        }
        for language in profile.languages.iter().flatten() {
            if let Tagged::Unknown(raw) = language {
                violations.push(Violation::on_field(
                    "languages",
                    format!("Unknown language {:?}; use a two-letter ISO 639-1 code", raw),
                ));
            }
        }

        violations
    }
}

/// E-mail and URL syntax
pub struct InvalidFormatRule;

impl Rule for InvalidFormatRule {
    fn id(&self) -> &'static str {
        rules::descriptor::INVALID_FORMAT
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, profile: &CanonicalProfile, _config: &ValidationConfig) -> Vec<Violation> {
        let mut violations = Vec::new();

        if let Some(email) = &profile.email {
            if !EMAIL_RE.is_match(email) {
                violations.push(Violation::on_field(
                    "email",
                    format!("{:?} is not a valid e-mail address", email),
                ));
            }
        }

        if let Some(url) = &profile.linkedin_url {
            if let Err(reason) = check_linkedin_url(url) {
                violations.push(Violation::on_field("linkedin_url", reason));
            }
        }

        violations
    }
}

fn check_linkedin_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("{:?} is not a valid URL: {}", raw, e))?;
    if url.scheme() != "https" {
        return Err(format!("{:?} must use https", raw));
    }
    let host = url.host_str().unwrap_or_default();
    if host != LINKEDIN_HOST && !host.ends_with(&format!(".{}", LINKEDIN_HOST)) {
        return Err(format!("{:?} does not point to LinkedIn", raw));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::test_support::complete_profile;

    fn config() -> ValidationConfig {
        ValidationConfig::default()
    }

    #[test]
    fn test_missing_skills_and_languages() {
        let mut profile = complete_profile();
        profile.skills = None;
        profile.languages = Some(Vec::new());
        let findings = MissingFieldRule.evaluate(&profile, &config());
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.is_error()));
        assert_eq!(findings[0].field.as_deref(), Some("skills"));
        assert_eq!(findings[1].field.as_deref(), Some("languages"));
    }

    #[test]
    fn test_one_warning_per_unknown_value() {
        let mut profile = complete_profile();
        profile.skills = Some(
            [
                Tagged::Known(Skill::Python),
                Tagged::Unknown("cobol".to_string()),
                Tagged::Unknown("fortran".to_string()),
            ]
            .into_iter()
            .collect(),
        );
        profile.university = Some(Tagged::Unknown("law".to_string()));
        profile.languages = Some(vec![Tagged::Unknown("czech".to_string())]);

        let findings = UnknownValueRule.evaluate(&profile, &config());
        assert_eq!(findings.len(), 4);
        assert!(findings.iter().all(|f| f.severity == Severity::Warning));
        assert!(findings[0].message.contains("\"cobol\""));
        assert!(findings[0].message.contains("python"));
        assert_eq!(findings[2].field.as_deref(), Some("university"));
        assert_eq!(findings[3].field.as_deref(), Some("languages"));
    }

    #[test]
    fn test_invalid_email() {
        let mut profile = complete_profile();
        profile.email = Some("mona(at)example.com".to_string());
        let findings = InvalidFormatRule.evaluate(&profile, &config());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].field.as_deref(), Some("email"));
    }

    #[test]
    fn test_linkedin_url_checks() {
        assert!(check_linkedin_url("https://www.linkedin.com/in/mona").is_ok());
        assert!(check_linkedin_url("https://linkedin.com/in/mona").is_ok());
        assert!(check_linkedin_url("http://www.linkedin.com/in/mona").is_err());
        assert!(check_linkedin_url("https://notlinkedin.com/in/mona").is_err());
        assert!(check_linkedin_url("linkedin.com/in/mona").is_err());
    }
}
