//! eggtray library interface
//!
//! Turns hand-authored profile descriptors plus GitHub data into a validated
//! listing, and keeps "not ready" reports in the issue tracker in sync.
//!
//! Stages: [`loader`] → [`enrichment`] → [`merge`] → [`validators`] →
//! [`readiness`] → [`artifact`] / [`issues`], orchestrated by [`pipeline`].

pub mod artifact;
pub mod check;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod github;
pub mod issues;
pub mod loader;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod readiness;
pub mod utils;
pub mod validators;

pub use crate::error::{EnrichmentError, LoadError, SystemicError, SystemicResult, TrackerError};
pub use crate::pipeline::{BatchReport, Pipeline};
pub use crate::validators::Validator;
