//! File cache for enrichment results
//!
//! Stores each successful result as `<dir>/<identity>.json` together with
//! its fetch time. Entries older than the configured lifetime are refetched.
//! Failures are never cached, and a cache that cannot be read or written
//! only costs a refetch.

use super::EnrichmentSource;
use crate::error::EnrichmentError;
use crate::models::EnrichmentResult;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eggtray_common::Identity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    result: EnrichmentResult,
}

/// Caching decorator around another source
pub struct CachedSource<S> {
    inner: S,
    dir: PathBuf,
    max_age: Duration,
}

impl<S: EnrichmentSource> CachedSource<S> {
    pub fn new(inner: S, dir: impl Into<PathBuf>, max_age_hours: u64) -> Self {
        Self {
            inner,
            dir: dir.into(),
            max_age: i64::try_from(max_age_hours)
                .ok()
                .and_then(Duration::try_hours)
                .unwrap_or(Duration::MAX),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, identity: &Identity) -> PathBuf {
        self.dir.join(format!("{}.json", identity))
    }

    async fn read_fresh(&self, identity: &Identity, now: DateTime<Utc>) -> Option<EnrichmentResult> {
        let path = self.entry_path(identity);
        let bytes = tokio::fs::read(&path).await.ok()?;
        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };
        if now - entry.fetched_at > self.max_age {
            debug!(identity = %identity, "Cache entry expired");
            return None;
        }
        Some(entry.result)
    }

    async fn write(&self, identity: &Identity, result: &EnrichmentResult, now: DateTime<Utc>) {
        let path = self.entry_path(identity);
        let entry = CacheEntry {
            fetched_at: now,
            result: result.clone(),
        };
        let outcome: std::io::Result<()> = async {
            tokio::fs::create_dir_all(&self.dir).await?;
            let json = serde_json::to_vec(&entry)?;
            tokio::fs::write(&path, json).await
        }
        .await;
        if let Err(e) = outcome {
            warn!(path = %path.display(), error = %e, "Failed to write cache entry");
        }
    }
}

#[async_trait]
impl<S: EnrichmentSource> EnrichmentSource for CachedSource<S> {
    async fn fetch(&self, identity: &Identity) -> Result<EnrichmentResult, EnrichmentError> {
        let now = Utc::now();
        if let Some(result) = self.read_fresh(identity, now).await {
            debug!(identity = %identity, "Enrichment served from cache");
            return Ok(result);
        }

        let result = self.inner.fetch(identity).await?;
        // Partial results are refetched next time
        if !result.is_partial() {
            self.write(identity, &result, now).await;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl EnrichmentSource for CountingSource {
        async fn fetch(&self, identity: &Identity) -> Result<EnrichmentResult, EnrichmentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(EnrichmentError::Transient("down".to_string()))
            } else {
                Ok(EnrichmentResult::empty(identity.as_str()))
            }
        }
    }

    fn source(fail: bool) -> CountingSource {
        CountingSource {
            calls: AtomicUsize::new(0),
            fail,
        }
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let dir = TempDir::new().unwrap();
        let cached = CachedSource::new(source(false), dir.path().join("cache"), 3);
        let identity = Identity::parse("octocat").unwrap();

        let first = cached.fetch(&identity).await.unwrap();
        let second = cached.fetch(&identity).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
        assert!(dir.path().join("cache").join("octocat.json").exists());
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let dir = TempDir::new().unwrap();
        let cached = CachedSource::new(source(false), dir.path(), 0);
        let identity = Identity::parse("octocat").unwrap();

        let stale = CacheEntry {
            fetched_at: Utc::now() - Duration::hours(1),
            result: EnrichmentResult::empty("octocat"),
        };
        std::fs::write(
            dir.path().join("octocat.json"),
            serde_json::to_vec(&stale).unwrap(),
        )
        .unwrap();

        cached.fetch(&identity).await.unwrap();
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_huge_max_age_saturates() {
        let cached = CachedSource::new(source(false), "cache", u64::MAX);
        assert_eq!(cached.max_age, Duration::MAX);

        let cached = CachedSource::new(source(false), "cache", 3);
        assert_eq!(cached.max_age, Duration::hours(3));
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let dir = TempDir::new().unwrap();
        let cached = CachedSource::new(source(true), dir.path(), 3);
        let identity = Identity::parse("octocat").unwrap();

        assert!(cached.fetch(&identity).await.is_err());
        assert!(cached.fetch(&identity).await.is_err());
        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
        assert!(!dir.path().join("octocat.json").exists());
    }
}
