//! Test Helper Utilities
//!
//! Shared utilities for testing eggtray

#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;

// Re-export commonly used items
pub use fakes::{FakeSource, InMemoryTracker};
pub use fixtures::{
    active_account, as_of, id, write_descriptor, COMPLETE_DESCRIPTOR, MISSING_SKILLS_DESCRIPTOR,
    UNKNOWN_SKILL_DESCRIPTOR,
};
