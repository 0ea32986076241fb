use serde::{Deserialize, Serialize};

/// Deterministic, machine-readable outcome of a merge run.
///
/// Notes:
/// - Contains *no* wall-clock timestamps (to preserve determinism).
/// - Keys are rendered identity keys (`METHOD path` or `operation:<id>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Matched endpoints whose fields were refreshed.
    pub updated: usize,
    /// Reference endpoints inserted into the working collection.
    pub added: usize,
    /// Orphans moved into `_retired` or deleted.
    pub retired: usize,
    /// Orphans left in place under `retireMode: skip`.
    pub orphans_kept: usize,

    pub services: Vec<ServiceReport>,

    /// SHA-256 of the canonical working collection before the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint_before: Option<String>,
    /// SHA-256 of the canonical working collection after the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint_after: Option<String>,
}

impl MergeReport {
    pub fn absorb(&mut self, service: ServiceReport) {
        self.updated += service.updated;
        self.added += service.added;
        self.retired += service.retired;
        self.orphans_kept += service.orphans_kept;
        self.services.push(service);
    }

    pub fn skipped_services(&self) -> impl Iterator<Item = &ServiceReport> {
        self.services
            .iter()
            .filter(|s| s.status == ServiceStatus::SkippedMissingReference)
    }

    /// Whether the run changed the working collection, when fingerprints are known.
    pub fn changed(&self) -> Option<bool> {
        match (&self.fingerprint_before, &self.fingerprint_after) {
            (Some(a), Some(b)) => Some(a != b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Merged,
    SkippedMissingReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceReport {
    pub name: String,
    pub status: ServiceStatus,
    pub updated: usize,
    pub added: usize,
    pub retired: usize,
    pub orphans_kept: usize,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added_keys: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub retired_keys: Vec<String>,
    /// Retired keys the reference itself files under `_retired`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub confirmed_retirements: Vec<String>,
}

impl ServiceReport {
    pub fn new(name: impl Into<String>, status: ServiceStatus) -> Self {
        Self {
            name: name.into(),
            status,
            updated: 0,
            added: 0,
            retired: 0,
            orphans_kept: 0,
            added_keys: Vec::new(),
            retired_keys: Vec::new(),
            confirmed_retirements: Vec::new(),
        }
    }
}
