//! `collmerge-io` is the single supported public entrypoint for reconciling
//! hand-curated request collections with machine-generated reference
//! collections.
//!
//! This crate contains **no** spec-to-collection conversion or publishing.
//! It focuses on:
//! - parsing and writing collection JSON
//! - loading merge configuration and reference collections
//! - running the merge
//! - canonical JSON and fingerprints

// -----------------------------------------------------------------------------
// Public API contract
// -----------------------------------------------------------------------------
//
// Consumers SHOULD import from `collmerge_io::prelude::*`.
// Anything not re-exported via the prelude is considered internal and may change
// without notice.

// Re-export the collection model and endpoint identity.
#[doc(hidden)]
pub mod core {
    pub use collmerge_core::identity::{identity_key, item_key, IdentityKey};
    pub use collmerge_core::model::{Collection, Folder, Item, Request, RequestItem, Url};
    pub use collmerge_core::path::{normalize_url, NormalizationError, NormalizedPath};
}

// Re-export the reconciliation engine and the standalone passes.
#[doc(hidden)]
pub mod engine {
    pub use collmerge_merge::restructure::nest_flat_folders;
    pub use collmerge_merge::tidy::tidy_collection;
    pub use collmerge_merge::walk::{children_at, walk_requests};
    pub use collmerge_merge::folders::{find_folder_path, split_folder_path};
    pub use collmerge_merge::{
        reconcile, EndpointIndex, FolderOrder, FolderPath, IndexEntry, MergeConfig, MergeError,
        MergeOptions, MergeReport, RetireMode, ServiceConfig, ServiceReport, ServiceStatus,
        WalkOptions,
    };
}

/// Deterministic JSON canonicalization helpers.
pub mod canonical_json;

/// Collection JSON parsing and pretty writing.
pub mod collection_json;

/// YAML merge configuration.
pub mod config;

/// Collection fingerprints.
pub mod hashing;

/// Fingerprinted merge runs.
pub mod merge;

/// Reference collection loading.
pub mod references;

/// Version constants.
pub mod version;

/// Convenience prelude for consumers.
///
/// This is the **only supported** import surface for external users.
pub mod prelude {
    pub use crate::collection_json::{
        parse_collection_json_str, parse_collection_value, to_pretty_json, CollectionJsonError,
    };
    pub use crate::config::{load_config, parse_config_str, ConfigError};
    pub use crate::core::{Collection, IdentityKey, Item, NormalizationError, RequestItem};
    pub use crate::engine::{
        EndpointIndex, FolderOrder, FolderPath, IndexEntry, MergeConfig, MergeError, MergeOptions,
        MergeReport, RetireMode, ServiceConfig, ServiceReport, ServiceStatus, WalkOptions,
    };
    pub use crate::engine::{nest_flat_folders, tidy_collection};
    pub use crate::merge::merge_collection;
    pub use crate::references::{load_references, reference_path, ReferenceError};
    pub use crate::{canonical_json, hashing};
}
