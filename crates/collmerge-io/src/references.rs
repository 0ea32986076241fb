//! Loading one reference collection per configured service.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use collmerge_core::model::Collection;
use collmerge_merge::{MergeConfig, ServiceConfig};
use log::{debug, warn};

use crate::collection_json::parse_collection_json_str;

/// Suffix of reference files: `<refdir>/<base>.postman_collection.json`.
pub const REFERENCE_SUFFIX: &str = ".postman_collection.json";

#[derive(Debug)]
pub enum ReferenceError {
    MissingDirectory { path: PathBuf },
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceError::MissingDirectory { path } => {
                write!(f, "reference directory not found: {}", path.display())
            }
        }
    }
}

impl std::error::Error for ReferenceError {}

pub fn reference_path(refdir: &Path, service: &ServiceConfig) -> PathBuf {
    refdir.join(format!("{}{REFERENCE_SUFFIX}", service.spec_base_name()))
}

/// Load the reference of every configured service, keyed by service name.
///
/// Unreadable or unparsable references are logged and left out, so the merge
/// skips those services.
pub fn load_references(
    refdir: &Path,
    config: &MergeConfig,
) -> Result<BTreeMap<String, Collection>, ReferenceError> {
    if !refdir.is_dir() {
        return Err(ReferenceError::MissingDirectory {
            path: refdir.to_path_buf(),
        });
    }

    let mut out = BTreeMap::new();
    for service in &config.services {
        let path = reference_path(refdir, service);
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) => {
                warn!("service '{}': cannot read {}: {e}", service.name, path.display());
                continue;
            }
        };
        match parse_collection_json_str(&text) {
            Ok(collection) => {
                debug!("service '{}': loaded {}", service.name, path.display());
                out.insert(service.name.clone(), collection);
            }
            Err(e) => warn!("service '{}': {}: {e}", service.name, path.display()),
        }
    }
    Ok(out)
}
