//! # eggtray common library
//!
//! Shared code for the eggtray crates:
//! - Error types
//! - Profile identity (GitHub handle)
//! - Schema & enum registry (skills, experience, schools, languages)
//! - Configuration loading

pub mod config;
pub mod error;
pub mod identity;
pub mod registry;

pub use error::{Error, Result};
pub use identity::Identity;
pub use registry::{Experience, Language, Registry, RegistryEnum, School, Skill, Tagged};
