#![doc = r#"
⚠️ INTERNAL CRATE – NOT A STABLE API

This crate is an internal implementation detail of collmerge.

Do NOT depend on this crate directly.
Use `collmerge-io` instead.
"#]

pub mod error;
pub mod fields;
pub mod folders;
pub mod options;
pub mod reconcile;
pub mod report;
pub mod restructure;
pub mod tidy;
pub mod walk;

pub use error::MergeError;
pub use fields::{merge_request_item, FieldPolicy};
pub use options::{CollectionScope, FolderOrder, FolderPath, MergeConfig, MergeOptions, RetireMode, ServiceConfig};
pub use reconcile::reconcile;
pub use report::{MergeReport, ServiceReport, ServiceStatus};
pub use walk::{EndpointIndex, IndexEntry, ReferenceIndex, WalkOptions};
