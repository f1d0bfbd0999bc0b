//! Hand-authored profile descriptor
//!
//! One YAML file per identity. Unknown keys make the file malformed, while
//! unknown enum values are kept (see [`Tagged`]) and reported later by the
//! validator. Required fields are optional here for the same reason: a
//! missing `skills` list is a finding, not a load failure.

use eggtray_common::{Experience, Language, School, Skill, Tagged};
use serde::{Deserialize, Serialize};

/// Parsed descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Descriptor {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub looking_for: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub discord_id: Option<u64>,
    pub linkedin_url: Option<String>,
    /// Required
    pub skills: Option<Vec<Tagged<Skill>>>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub experience: Vec<Tagged<Experience>>,
    pub secondary_school: Option<Tagged<School>>,
    pub university: Option<Tagged<School>>,
    /// Required
    pub languages: Option<Vec<Tagged<Language>>>,
}

impl Descriptor {
    /// Parse YAML text
    ///
    /// Returns a human-readable reason on failure; callers attach the file.
    pub fn parse(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Err("descriptor is empty".to_string());
        }
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    }
}
