//! External enrichment
//!
//! An [`EnrichmentSource`] turns an identity into platform facts. The
//! pipeline only sees the trait, so tests inject fakes and the binary wraps
//! the GitHub client in a file cache.

pub mod cache;
pub mod github;

pub use cache::CachedSource;
pub use github::GitHubClient;

use crate::error::EnrichmentError;
use crate::models::EnrichmentResult;
use async_trait::async_trait;
use eggtray_common::Identity;
use std::sync::Arc;

/// Source of platform data for one identity
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    async fn fetch(&self, identity: &Identity) -> Result<EnrichmentResult, EnrichmentError>;
}

#[async_trait]
impl<S: EnrichmentSource + ?Sized> EnrichmentSource for Arc<S> {
    async fn fetch(&self, identity: &Identity) -> Result<EnrichmentResult, EnrichmentError> {
        (**self).fetch(identity).await
    }
}
