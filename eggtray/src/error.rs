//! Error types for eggtray
//!
//! Per-file and per-identity failures (`LoadError`, `EnrichmentError`,
//! `TrackerError`) are isolated by the pipeline. `SystemicError` is the only
//! kind that aborts a run; when it surfaces nothing has been written.

use crate::utils::Retryable;
use eggtray_common::Identity;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A descriptor file that could not be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{}: cannot read file: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: file name is not a valid handle: {reason}", .path.display())]
    InvalidIdentity { path: PathBuf, reason: String },

    #[error("{}: malformed descriptor: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("{}: handle {identity} is already defined by {}", .path.display(), .first.display())]
    Duplicate {
        path: PathBuf,
        identity: Identity,
        first: PathBuf,
    },

    #[error("{}: not a descriptor (expected a .yml file)", .path.display())]
    UnexpectedFile { path: PathBuf },
}

impl LoadError {
    /// File the error is attributed to
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::Io { path, .. }
            | LoadError::InvalidIdentity { path, .. }
            | LoadError::Parse { path, .. }
            | LoadError::Duplicate { path, .. }
            | LoadError::UnexpectedFile { path } => path,
        }
    }
}

/// Typed failure of the external enrichment source
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnrichmentError {
    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Transient failure: {0}")]
    Transient(String),
}

impl EnrichmentError {
    /// Whether a retry may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EnrichmentError::RateLimited { .. } | EnrichmentError::Transient(_)
        )
    }

    /// Whether the failure would hit every identity the same way
    pub fn is_systemic(&self) -> bool {
        matches!(self, EnrichmentError::Auth(_))
    }
}

/// Issue tracker failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Issue not found: #{0}")]
    NotFound(u64),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Failure of one GitHub REST request, after retries
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitHubError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Retryable for GitHubError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            GitHubError::RateLimited { .. } | GitHubError::Transient(_)
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            GitHubError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<GitHubError> for EnrichmentError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::NotFound(what) => EnrichmentError::NotFound(what),
            GitHubError::RateLimited { retry_after } => EnrichmentError::RateLimited { retry_after },
            GitHubError::Auth(msg) => EnrichmentError::Auth(msg),
            GitHubError::Transient(msg) | GitHubError::Parse(msg) => {
                EnrichmentError::Transient(msg)
            }
            GitHubError::Api(status, msg) => {
                EnrichmentError::Transient(format!("HTTP {}: {}", status, msg))
            }
        }
    }
}

impl From<GitHubError> for TrackerError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::NotFound(what) => TrackerError::Api(404, what),
            GitHubError::RateLimited { .. } => TrackerError::RateLimited,
            GitHubError::Auth(msg) => TrackerError::Auth(msg),
            GitHubError::Transient(msg) => TrackerError::Network(msg),
            GitHubError::Api(status, msg) => TrackerError::Api(status, msg),
            GitHubError::Parse(msg) => TrackerError::Parse(msg),
        }
    }
}

/// Failure that affects the whole run
#[derive(Debug, Error)]
pub enum SystemicError {
    #[error("Platform authentication failed: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Issue tracker unavailable: {0}")]
    Tracker(#[from] TrackerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Common error: {0}")]
    Common(#[from] eggtray_common::Error),
}

/// Result type for whole-run operations
pub type SystemicResult<T> = Result<T, SystemicError>;
