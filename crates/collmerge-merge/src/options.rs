use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MergeError;
use crate::folders::split_folder_path;

/// What happens to working endpoints that no reference still declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetireMode {
    /// Relocate into the `_retired` folder under the service's target folder.
    #[default]
    Move,
    /// Leave in place.
    Skip,
    /// Remove permanently.
    Delete,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderOrder {
    #[default]
    Keep,
    Alpha,
}

/// Global merge options.
///
/// These options exist to make preservation trade-offs explicit and testable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeOptions {
    /// Match on an `operationId:` marker in the description before method + path.
    pub prefer_operation_id: bool,
    /// Keep the working item's name when updating from the reference.
    pub keep_working_item_name: bool,
    /// Separates human-authored text (above) from generated text (below).
    pub description_delimiter: String,
    /// Status tag for newly added items; empty disables tagging.
    #[serde(rename = "tagNew")]
    pub tag_new_marker: String,
    pub retire_mode: RetireMode,
    pub order: FolderOrder,
    /// Create `collection.targetFolder` when missing instead of failing.
    pub create_target_folder: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            prefer_operation_id: false,
            keep_working_item_name: true,
            description_delimiter: "\n---\n".to_string(),
            tag_new_marker: "status:new".to_string(),
            retire_mode: RetireMode::Move,
            order: FolderOrder::Keep,
            create_target_folder: false,
        }
    }
}

/// A folder location: `"A/B"` or `["A", "B"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FolderPath {
    Joined(String),
    Segments(Vec<String>),
}

impl FolderPath {
    pub fn segments(&self) -> Vec<String> {
        match self {
            FolderPath::Joined(s) => split_folder_path(s),
            FolderPath::Segments(v) => v
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// One upstream service whose reference collection is merged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub name: String,
    /// Spec file (or base name) the reference collection was generated from.
    #[serde(default, alias = "specBaseName")]
    pub spec: String,
    /// Target folder within the merge scope; the scope root when unset.
    #[serde(default, alias = "workingFolderPath", skip_serializing_if = "Option::is_none")]
    pub working_folder: Option<FolderPath>,
    /// Per-service override of `options.retireMode`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retire_mode: Option<RetireMode>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec: String::new(),
            working_folder: None,
            retire_mode: None,
        }
    }

    /// File stem of `spec` (`openapi/tcm.yaml` → `tcm`), or the service name.
    pub fn spec_base_name(&self) -> String {
        Path::new(self.spec.trim())
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.name.clone())
    }

    pub fn working_folder_segments(&self) -> Vec<String> {
        self.working_folder
            .as_ref()
            .map(FolderPath::segments)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionScope {
    /// `"Parent/Child"`; empty merges at the collection root.
    pub target_folder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub services: Vec<ServiceConfig>,
    pub collection: CollectionScope,
    pub options: MergeOptions,
}

impl MergeConfig {
    /// Reject configurations that must abort a run before any mutation.
    pub fn validate(&self) -> Result<(), MergeError> {
        if self.options.description_delimiter.is_empty() {
            return Err(MergeError::InvalidDelimiter);
        }

        check_folder_path(&self.collection.target_folder)?;
        for service in &self.services {
            if let Some(FolderPath::Joined(p)) = &service.working_folder {
                check_folder_path(p)?;
            }
            for seg in service.working_folder_segments() {
                check_folder_path(&seg)?;
            }
        }
        Ok(())
    }
}

fn check_folder_path(path: &str) -> Result<(), MergeError> {
    if path.contains("..") {
        return Err(MergeError::InvalidFolderPath {
            path: path.to_string(),
            reason: "contains '..'",
        });
    }
    if path.contains('\0') {
        return Err(MergeError::InvalidFolderPath {
            path: path.to_string(),
            reason: "contains a NUL character",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_base_name_is_file_stem() {
        let mut svc = ServiceConfig::new("tcm");
        svc.spec = "openapi/tcm-v2.yaml".to_string();
        assert_eq!(svc.spec_base_name(), "tcm-v2");

        svc.spec = String::new();
        assert_eq!(svc.spec_base_name(), "tcm");
    }

    #[test]
    fn folder_paths_accept_both_forms() {
        assert_eq!(
            FolderPath::Joined(" A / B /".into()).segments(),
            vec!["A".to_string(), "B".to_string()]
        );
        assert_eq!(
            FolderPath::Segments(vec!["A".into(), " ".into()]).segments(),
            vec!["A".to_string()]
        );
    }

    #[test]
    fn validate_rejects_empty_delimiter_and_traversal() {
        let mut cfg = MergeConfig::default();
        assert!(cfg.validate().is_ok());

        cfg.collection.target_folder = "A/../B".into();
        assert!(matches!(cfg.validate(), Err(MergeError::InvalidFolderPath { .. })));

        cfg.collection.target_folder.clear();
        cfg.options.description_delimiter.clear();
        assert_eq!(cfg.validate(), Err(MergeError::InvalidDelimiter));
    }
}
