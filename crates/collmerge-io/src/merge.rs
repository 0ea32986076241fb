//! Reconciliation with before / after fingerprints.

use std::collections::BTreeMap;

use collmerge_core::model::Collection;
use collmerge_merge::{reconcile, MergeConfig, MergeError, MergeReport};
use log::{debug, info};

use crate::hashing::collection_fingerprint;

/// Run [`reconcile`] and record the working collection's fingerprint before
/// and after.
pub fn merge_collection(
    working: &mut Collection,
    references: &BTreeMap<String, Collection>,
    config: &MergeConfig,
) -> Result<MergeReport, MergeError> {
    let before = collection_fingerprint(working).ok();
    let mut report = reconcile(working, references, config)?;
    report.fingerprint_before = before;
    report.fingerprint_after = collection_fingerprint(working).ok();

    match report.changed() {
        Some(false) => info!("working collection unchanged"),
        Some(true) => debug!(
            "fingerprint {} -> {}",
            report.fingerprint_before.as_deref().unwrap_or("-"),
            report.fingerprint_after.as_deref().unwrap_or("-")
        ),
        None => {}
    }
    Ok(report)
}
