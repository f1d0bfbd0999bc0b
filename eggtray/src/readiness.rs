//! Readiness classifier
//!
//! A profile is not ready when any finding is an error. With
//! `warnings_demote` enabled, warnings demote it too.

use crate::models::{Finding, ReadinessState, Severity};
use eggtray_common::config::ValidationConfig;

/// Severity threshold that demotes a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub warnings_demote: bool,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            warnings_demote: false,
        }
    }
}

impl From<&ValidationConfig> for ReadinessPolicy {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            warnings_demote: config.warnings_demote,
        }
    }
}

impl ReadinessPolicy {
    fn demotes(&self, severity: Severity) -> bool {
        match severity {
            Severity::Error => true,
            Severity::Warning => self.warnings_demote,
        }
    }
}

/// Derive the readiness state from findings
pub fn classify(findings: &[Finding], policy: ReadinessPolicy) -> ReadinessState {
    if findings.iter().any(|f| policy.demotes(f.severity)) {
        ReadinessState::NotReady
    } else {
        ReadinessState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding {
            rule: "test.rule".to_string(),
            severity,
            message: "message".to_string(),
            field: None,
        }
    }

    #[test]
    fn test_no_findings_is_ready() {
        assert_eq!(classify(&[], ReadinessPolicy::default()), ReadinessState::Ready);
    }

    #[test]
    fn test_error_demotes() {
        let findings = vec![finding(Severity::Warning), finding(Severity::Error)];
        assert_eq!(
            classify(&findings, ReadinessPolicy::default()),
            ReadinessState::NotReady
        );
    }

    #[test]
    fn test_warnings_demote_only_when_enabled() {
        let findings = vec![finding(Severity::Warning)];
        assert_eq!(
            classify(&findings, ReadinessPolicy::default()),
            ReadinessState::Ready
        );
        assert_eq!(
            classify(&findings, ReadinessPolicy { warnings_demote: true }),
            ReadinessState::NotReady
        );
    }

    #[test]
    fn test_adding_an_error_never_promotes() {
        let policy = ReadinessPolicy::default();
        let mut findings = vec![finding(Severity::Warning)];
        for _ in 0..3 {
            let before = classify(&findings, policy);
            findings.push(finding(Severity::Error));
            let after = classify(&findings, policy);
            assert!(!(after.is_ready() && !before.is_ready()));
            assert_eq!(after, ReadinessState::NotReady);
        }
    }
}
