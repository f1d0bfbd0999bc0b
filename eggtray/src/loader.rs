//! Descriptor loader
//!
//! Reads `<identity>.yml` files from one directory. Every problem is
//! attributed to its file and collected; the batch always continues with the
//! files that loaded.

use crate::error::LoadError;
use crate::models::Descriptor;
use eggtray_common::{Error, Identity, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extension every descriptor file carries
pub const DESCRIPTOR_EXTENSION: &str = "yml";

/// Descriptors that loaded plus per-file errors
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub descriptors: BTreeMap<Identity, Descriptor>,
    pub errors: Vec<LoadError>,
}

/// Load every descriptor in `dir`
///
/// Fails only when the directory itself cannot be listed.
pub fn load_descriptors(dir: &Path) -> Result<LoadOutcome> {
    if !dir.is_dir() {
        return Err(Error::Config(format!(
            "Descriptor directory not found: {}",
            dir.display()
        )));
    }

    let mut outcome = LoadOutcome::default();
    let entries = std::fs::read_dir(dir)?.map(|entry| entry.map(|e| e.path()));
    let mut paths: Vec<PathBuf> = listed_paths(dir, entries, &mut outcome.errors)
        .into_iter()
        .filter(|path| path.is_file())
        .filter(|path| !is_hidden(path))
        .collect();
    paths.sort();

    let mut origins: BTreeMap<Identity, PathBuf> = BTreeMap::new();

    for path in paths {
        if path.extension().and_then(|e| e.to_str()) != Some(DESCRIPTOR_EXTENSION) {
            warn!(path = %path.display(), "Unexpected file in descriptor directory");
            outcome.errors.push(LoadError::UnexpectedFile { path });
            continue;
        }

        match load_descriptor(&path) {
            Ok((identity, descriptor)) => {
                if let Some(first) = origins.get(&identity) {
                    warn!(
                        path = %path.display(),
                        identity = %identity,
                        "Duplicate descriptor for identity"
                    );
                    outcome.errors.push(LoadError::Duplicate {
                        path,
                        identity,
                        first: first.clone(),
                    });
                    continue;
                }
                debug!(identity = %identity, "Loaded descriptor");
                origins.insert(identity.clone(), path);
                outcome.descriptors.insert(identity, descriptor);
            }
            Err(err) => {
                warn!(error = %err, "Descriptor rejected");
                outcome.errors.push(err);
            }
        }
    }

    info!(
        loaded = outcome.descriptors.len(),
        rejected = outcome.errors.len(),
        "Descriptors loaded from {}",
        dir.display()
    );
    Ok(outcome)
}

/// Load a single descriptor; the file stem is the identity
pub fn load_descriptor(path: &Path) -> std::result::Result<(Identity, Descriptor), LoadError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| LoadError::InvalidIdentity {
            path: path.to_path_buf(),
            reason: "file name is not valid UTF-8".to_string(),
        })?;
    let identity = Identity::parse(stem).map_err(|e| LoadError::InvalidIdentity {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let descriptor = Descriptor::parse(&text).map_err(|reason| LoadError::Parse {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok((identity, descriptor))
}

/// Descriptor path for an identity inside `dir`, if such a file exists
pub fn find_descriptor(dir: &Path, identity: &Identity) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(DESCRIPTOR_EXTENSION))
        .find(|path| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.eq_ignore_ascii_case(identity.as_str()))
                .unwrap_or(false)
        })
}

/// Paths of a directory listing; unreadable entries become errors
fn listed_paths(
    dir: &Path,
    entries: impl Iterator<Item = std::io::Result<PathBuf>>,
    errors: &mut Vec<LoadError>,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => paths.push(path),
            Err(source) => {
                warn!(dir = %dir.display(), error = %source, "Unreadable directory entry");
                errors.push(LoadError::Io {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        }
    }
    paths
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}
