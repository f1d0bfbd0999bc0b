//! Descriptor and enrichment fixtures

use chrono::{DateTime, Duration, TimeZone, Utc};
use eggtray::models::{EnrichmentResult, Repository};
use eggtray_common::Identity;
use std::path::{Path, PathBuf};

/// Every required field, every optional contact field, only known values
pub const COMPLETE_DESCRIPTOR: &str = r#"
name: Jana Nováková
bio: Backend developer switching from accounting
looking_for: Junior backend position
email: jana@example.com
location: Brno
discord_id: 123456789
linkedin_url: https://www.linkedin.com/in/jana-novakova
skills: [python, django]
domains: [fintech]
experience: [intern]
languages: [cs, en]
"#;

/// Complete, except for one skill outside the known set
pub const UNKNOWN_SKILL_DESCRIPTOR: &str = r#"
name: Jana Nováková
bio: Backend developer switching from accounting
looking_for: Junior backend position
email: jana@example.com
location: Brno
discord_id: 123456789
linkedin_url: https://www.linkedin.com/in/jana-novakova
skills: [python, cobol]
languages: [cs, en]
"#;

/// Complete, except that `skills` is absent
pub const MISSING_SKILLS_DESCRIPTOR: &str = r#"
name: Jana Nováková
bio: Backend developer switching from accounting
looking_for: Junior backend position
email: jana@example.com
location: Brno
discord_id: 123456789
linkedin_url: https://www.linkedin.com/in/jana-novakova
languages: [cs, en]
"#;

/// Reference time used by every scenario
pub fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn id(handle: &str) -> Identity {
    Identity::parse(handle).unwrap()
}

/// Write `<handle>.yml` into `dir`
pub fn write_descriptor(dir: &Path, handle: &str, yaml: &str) -> PathBuf {
    let path = dir.join(format!("{}.yml", handle));
    std::fs::write(&path, yaml).unwrap();
    path
}

/// Account with one Python repository pushed a month before [`as_of`]
pub fn active_account(login: &str) -> EnrichmentResult {
    let mut result = EnrichmentResult::empty(login);
    result.name = Some(login.to_string());
    result.avatar_url = Some(format!("https://avatars.githubusercontent.com/{}", login));
    result.public_repos = 1;
    result.repositories = Some(vec![Repository {
        name: "ledger-api".to_string(),
        html_url: format!("https://github.com/{}/ledger-api", login),
        description: Some("Bookkeeping REST API".to_string()),
        language: Some("Python".to_string()),
        stargazers_count: 3,
        fork: false,
        archived: false,
        pushed_at: Some(as_of() - Duration::days(30)),
        homepage: None,
        topics: vec!["django".to_string()],
    }]);
    result
}
