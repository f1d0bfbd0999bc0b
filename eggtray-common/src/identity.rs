//! Profile identity: a case-insensitive GitHub handle
//!
//! Handles are normalized to lowercase at construction so that two
//! spellings of the same handle always compare equal and sort together.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject, StringValidation};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// GitHub handle syntax: alphanumerics separated by single hyphens, 1-39 chars
static HANDLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9]|-[a-z0-9])*$").expect("static regex"));

const MAX_HANDLE_LEN: usize = 39;

/// Unique key of a profile
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(String);

impl Identity {
    /// Parse and normalize a handle
    ///
    /// Fails with [`Error::InvalidInput`] when the handle does not follow
    /// the platform's syntax.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.to_ascii_lowercase();
        if normalized.is_empty() || normalized.len() > MAX_HANDLE_LEN {
            return Err(Error::InvalidInput(format!(
                "handle must be 1-{} characters long: {:?}",
                MAX_HANDLE_LEN, raw
            )));
        }
        if !HANDLE_RE.is_match(&normalized) {
            return Err(Error::InvalidInput(format!(
                "handle may contain only alphanumerics and single inner hyphens: {:?}",
                raw
            )));
        }
        Ok(Self(normalized))
    }

    /// Normalized (lowercase) handle
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public profile URL on the platform
    pub fn profile_url(&self) -> String {
        format!("https://github.com/{}", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Identity::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for Identity {
    fn schema_name() -> String {
        "Identity".to_string()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            string: Some(Box::new(StringValidation {
                max_length: Some(MAX_HANDLE_LEN as u32),
                min_length: Some(1),
                pattern: Some(HANDLE_RE.as_str().to_string()),
            })),
            ..Default::default()
        }
        .into()
    }
}
