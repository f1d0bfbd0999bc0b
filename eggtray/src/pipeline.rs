//! Batch pipeline
//!
//! Enrich → merge → validate → classify, once per identity.
//!
//! # Concurrency
//! Identities are processed through `futures::stream::buffer_unordered`
//! with a fixed bound. Results are collected (barrier) and put back into
//! identity order before anything is returned, so output never depends on
//! completion order.
//!
//! # Failure handling
//! - Enrichment failures degrade one profile (descriptor-only merge)
//! - An authentication failure aborts the whole batch; in-flight work is
//!   dropped and nothing is returned for output

use crate::enrichment::EnrichmentSource;
use crate::error::{EnrichmentError, SystemicError, SystemicResult};
use crate::merge::merge;
use crate::models::{CanonicalProfile, ClassifiedProfile, Descriptor};
use crate::readiness::{classify, ReadinessPolicy};
use crate::validators::Validator;
use chrono::{DateTime, Utc};
use eggtray_common::Identity;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of one batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Every profile, in identity order
    pub profiles: Vec<ClassifiedProfile>,
    /// Identities whose enrichment failed, with the failure
    pub degraded: Vec<(Identity, EnrichmentError)>,
}

impl BatchReport {
    pub fn ready_count(&self) -> usize {
        self.profiles.iter().filter(|p| p.state.is_ready()).count()
    }
}

/// Pipeline configuration and collaborators
pub struct Pipeline {
    source: Arc<dyn EnrichmentSource>,
    validator: Validator,
    policy: ReadinessPolicy,
    concurrency: usize,
    max_projects: usize,
}

impl Pipeline {
    pub fn new(source: Arc<dyn EnrichmentSource>, validator: Validator) -> Self {
        let policy = ReadinessPolicy::from(validator.config());
        Self {
            source,
            validator,
            policy,
            concurrency: 4,
            max_projects: 6,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_projects(mut self, max_projects: usize) -> Self {
        self.max_projects = max_projects;
        self
    }

    /// Process every descriptor
    pub async fn run(
        &self,
        descriptors: &BTreeMap<Identity, Descriptor>,
        as_of: DateTime<Utc>,
    ) -> SystemicResult<BatchReport> {
        info!(
            profiles = descriptors.len(),
            concurrency = self.concurrency,
            "Processing profiles"
        );

        let results: Vec<(ClassifiedProfile, Option<EnrichmentError>)> =
            stream::iter(descriptors.iter())
                .map(|(identity, descriptor)| self.process(identity, descriptor, as_of))
                .buffer_unordered(self.concurrency)
                .try_collect()
                .await?;

        let mut report = BatchReport::default();
        for (classified, failure) in results {
            if let Some(err) = failure {
                report
                    .degraded
                    .push((classified.profile.identity.clone(), err));
            }
            report.profiles.push(classified);
        }
        report
            .profiles
            .sort_by(|a, b| a.profile.identity.cmp(&b.profile.identity));
        report.degraded.sort_by(|a, b| a.0.cmp(&b.0));

        info!(
            profiles = report.profiles.len(),
            ready = report.ready_count(),
            degraded = report.degraded.len(),
            "Profiles processed"
        );
        Ok(report)
    }

    /// Process one identity
    ///
    /// Returns the classified profile and the enrichment failure it was
    /// degraded by, if any.
    pub async fn process(
        &self,
        identity: &Identity,
        descriptor: &Descriptor,
        as_of: DateTime<Utc>,
    ) -> SystemicResult<(ClassifiedProfile, Option<EnrichmentError>)> {
        let enrichment = self.source.fetch(identity).await;

        let failure = match &enrichment {
            Ok(_) => None,
            Err(err) if err.is_systemic() => {
                error!(identity = %identity, error = %err, "Enrichment authentication failed");
                return Err(SystemicError::Auth(err.to_string()));
            }
            Err(EnrichmentError::NotFound(_)) => {
                warn!(identity = %identity, "GitHub account does not exist");
                None
            }
            Err(err) => {
                warn!(identity = %identity, error = %err, "Enrichment failed, using descriptor only");
                Some(err.clone())
            }
        };

        let profile = merge(identity, descriptor, enrichment.as_ref(), as_of, self.max_projects);
        Ok((self.evaluate(profile), failure))
    }

    /// Validate and classify a merged profile
    pub fn evaluate(&self, profile: CanonicalProfile) -> ClassifiedProfile {
        let findings = self.validator.validate(&profile);
        let state = classify(&findings, self.policy);
        debug!(
            identity = %profile.identity,
            state = %state,
            findings = findings.len(),
            "Profile classified"
        );
        ClassifiedProfile {
            profile,
            findings,
            state,
        }
    }
}
