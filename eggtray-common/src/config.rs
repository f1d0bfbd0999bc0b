//! Configuration loading and config file resolution
//!
//! Config file priority order:
//! 1. Command-line argument (highest priority)
//! 2. `EGGTRAY_CONFIG` environment variable
//! 3. `eggtray.toml` in the working directory
//! 4. Platform config directory (`<config_dir>/eggtray/config.toml`)
//! 5. Compiled defaults (fallback)
//!
//! A missing config file is not an error: every key has a default and a
//! warning is logged.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "EGGTRAY_CONFIG";

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "eggtray.toml";

/// Deployment environment
///
/// Production runs refuse to talk to the platform unauthenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

/// Root configuration loaded from `eggtray.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub environment: Environment,
    pub logging: LoggingConfig,
    pub github: GitHubConfig,
    pub validation: ValidationConfig,
    pub artifact: ArtifactConfig,
    pub reports: ReportsConfig,
    pub cache: CacheConfig,
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when neither `--debug` nor `RUST_LOG` is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[github]` - platform access for enrichment and issue reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_url: String,
    pub user_agent: String,
    /// Static token (overridden by `GITHUB_TOKEN`)
    pub token: Option<String>,
    /// GitHub App client id (overridden by `GITHUB_CLIENT_ID`)
    pub client_id: Option<String>,
    /// GitHub App installation id (overridden by `GITHUB_INSTALLATION_ID`)
    pub installation_id: Option<u64>,
    /// GitHub App PEM private key (overridden by `GITHUB_PRIVATE_KEY`)
    pub private_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_initial_ms: u64,
    pub backoff_max_ms: u64,
    pub requests_per_second: u32,
    /// Number of identities enriched at the same time
    pub concurrency: usize,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            user_agent: concat!("eggtray/", env!("CARGO_PKG_VERSION")).to_string(),
            token: None,
            client_id: None,
            installation_id: None,
            private_key: None,
            timeout_secs: 30,
            max_retries: 3,
            backoff_initial_ms: 1_000,
            backoff_max_ms: 60_000,
            requests_per_second: 10,
            concurrency: 4,
        }
    }
}

/// `[validation]` - business rule thresholds and readiness policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Days without a push after which activity counts as stale
    pub stale_after_days: i64,
    /// Minimum share (0.0-1.0) of filled contact/content fields
    pub min_completeness: f32,
    /// When true, warning findings alone make a profile not ready
    pub warnings_demote: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            stale_after_days: 180,
            min_completeness: 0.5,
            warnings_demote: false,
        }
    }
}

/// Which profiles the published artifact exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InclusionPolicy {
    /// Every profile; not-ready ones are demoted (`is_ready = false`)
    #[default]
    All,
    /// Only ready profiles
    Ready,
}

/// `[artifact]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub include: InclusionPolicy,
    pub file_name: String,
    /// Maximum number of repositories exposed as projects
    pub max_projects: usize,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            include: InclusionPolicy::All,
            file_name: "profiles.json".to_string(),
            max_projects: 6,
        }
    }
}

/// `[reports]` - issue tracker integration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// `owner/repo` holding report and check issues
    pub repository: Option<String>,
    /// Label marking "profile not ready" reports
    pub label: String,
    /// Label marking ad-hoc check requests
    pub check_label: String,
    /// Number of identities reconciled at the same time
    pub concurrency: usize,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            repository: None,
            label: "profile not ready".to_string(),
            check_label: "check".to_string(),
            concurrency: 4,
        }
    }
}

/// Longest accepted cache lifetime (one year)
pub const MAX_CACHE_HOURS: u64 = 24 * 365;

/// `[cache]` - enrichment result cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    pub hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(".cache"),
            hours: 3,
        }
    }
}

impl ReportsConfig {
    /// Split `owner/repo`
    pub fn owner_repo(&self) -> Result<(String, String)> {
        let repository = self
            .repository
            .as_deref()
            .ok_or_else(|| Error::Config("reports.repository is not configured".to_string()))?;
        parse_owner_repo(repository)
    }
}

/// Parse an `owner/repo` slug
pub fn parse_owner_repo(slug: &str) -> Result<(String, String)> {
    match slug.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(Error::Config(format!(
            "repository must look like owner/repo: {:?}",
            slug
        ))),
    }
}

/// Find the config file to use, following the documented priority order
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Working directory
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    // Priority 4: Platform config directory
    dirs::config_dir()
        .map(|d| d.join("eggtray").join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Resolve and load configuration
///
/// A file that was explicitly requested (CLI or environment) must exist and
/// parse. Without any file, compiled defaults are used.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            load_toml_config(&path)
        }
        None => {
            warn!("No configuration file found; using defaults");
            Ok(TomlConfig::default())
        }
    }
}

impl TomlConfig {
    /// Reject values that would make the pipeline misbehave
    pub fn validate(&self) -> Result<()> {
        if self.github.concurrency == 0 {
            return Err(Error::Config("github.concurrency must be at least 1".to_string()));
        }
        if self.reports.concurrency == 0 {
            return Err(Error::Config("reports.concurrency must be at least 1".to_string()));
        }
        if self.github.requests_per_second == 0 {
            return Err(Error::Config(
                "github.requests_per_second must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.validation.min_completeness) {
            return Err(Error::Config(
                "validation.min_completeness must be within 0.0-1.0".to_string(),
            ));
        }
        if self.cache.hours > MAX_CACHE_HOURS {
            return Err(Error::Config(format!(
                "cache.hours must be at most {}",
                MAX_CACHE_HOURS
            )));
        }
        if let Some(repository) = &self.reports.repository {
            parse_owner_repo(repository)?;
        }
        Ok(())
    }
}
