//! Rule id registry
//!
//! Stable identifiers for validation findings, following the
//! `<area>.<code>` pattern. Reports and the published artifact carry these
//! ids, so they must never be renamed.

/// Findings about descriptor content
pub mod descriptor {
    /// A required field (`skills`, `languages`) is absent or empty
    pub const MISSING_FIELD: &str = "descriptor.missing_field";
    /// A value outside its closed set
    pub const UNKNOWN_VALUE: &str = "descriptor.unknown_value";
    /// Malformed e-mail address or URL
    pub const INVALID_FORMAT: &str = "descriptor.invalid_format";
}

/// Findings about the platform account
pub mod github {
    /// The platform reports that the account does not exist
    pub const ACCOUNT_MISSING: &str = "github.account_missing";
    /// Platform data could not be fetched, fully or partly
    pub const ENRICHMENT_UNAVAILABLE: &str = "github.enrichment_unavailable";
    /// No repository qualifies as a showcase project
    pub const NO_PROJECTS: &str = "github.no_projects";
    /// No recent push to any owned repository
    pub const ACTIVITY_STALE: &str = "github.activity_stale";
}

/// Findings about declared skills
pub mod skills {
    /// Declared language skills never appear in repository languages
    pub const UNCORROBORATED: &str = "skills.uncorroborated";
}

/// Findings about the profile as a whole
pub mod profile {
    /// Too few optional contact/content fields are filled in
    pub const INCOMPLETE: &str = "profile.incomplete";
}

/// Every registered rule id
pub const ALL: &[&str] = &[
    descriptor::MISSING_FIELD,
    descriptor::UNKNOWN_VALUE,
    descriptor::INVALID_FORMAT,
    github::ACCOUNT_MISSING,
    github::ENRICHMENT_UNAVAILABLE,
    github::NO_PROJECTS,
    github::ACTIVITY_STALE,
    skills::UNCORROBORATED,
    profile::INCOMPLETE,
];
