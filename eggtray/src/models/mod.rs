//! Data models for eggtray
//!
//! - Descriptor: hand-authored YAML record
//! - EnrichmentResult: facts fetched from the platform
//! - CanonicalProfile: merged record
//! - Finding / ReadinessState: validation outcome

pub mod descriptor;
pub mod enrichment;
pub mod finding;
pub mod profile;

pub use descriptor::Descriptor;
pub use enrichment::{EnrichmentPart, EnrichmentResult, Repository};
pub use finding::{ClassifiedProfile, Finding, ReadinessState, Severity};
pub use profile::{CanonicalProfile, EnrichmentStatus, Project};
