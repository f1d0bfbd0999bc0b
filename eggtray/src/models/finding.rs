//! Validation findings and readiness

use super::profile::CanonicalProfile;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Finding severity; `Error` sorts after `Warning`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn marker(&self) -> &'static str {
        match self {
            Severity::Error => "🔴",
            Severity::Warning => "🟠",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One validation outcome
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Finding {
    /// Stable rule identifier
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    /// Offending field path, when the finding concerns one field
    pub field: Option<String>,
}

impl Finding {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Coarse readiness of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    Ready,
    NotReady,
}

impl ReadinessState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReadinessState::Ready)
    }
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessState::Ready => f.write_str("ready"),
            ReadinessState::NotReady => f.write_str("not ready"),
        }
    }
}

/// Profile with its findings and derived state
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedProfile {
    pub profile: CanonicalProfile,
    pub findings: Vec<Finding>,
    pub state: ReadinessState,
}
