use std::fmt;

/// Fatal merge failures.
///
/// All of these are detected before the working collection is mutated, so a
/// caller that gets an `Err` still holds an untouched tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// `collection.targetFolder` does not exist and creation was not requested.
    TargetFolderNotFound { path: String },
    /// The description delimiter is empty.
    InvalidDelimiter,
    /// A configured folder path is unusable.
    InvalidFolderPath { path: String, reason: &'static str },
}

impl MergeError {
    /// Stable, machine-readable code.
    pub const fn code(&self) -> &'static str {
        match self {
            MergeError::TargetFolderNotFound { .. } => "target_folder_not_found",
            MergeError::InvalidDelimiter => "invalid_delimiter",
            MergeError::InvalidFolderPath { .. } => "invalid_folder_path",
        }
    }
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeError::TargetFolderNotFound { path } => write!(
                f,
                "target folder not found: \"{path}\". Create it in the collection, set options.createTargetFolder, or clear collection.targetFolder to merge at the root."
            ),
            MergeError::InvalidDelimiter => {
                write!(f, "options.descriptionDelimiter must not be empty")
            }
            MergeError::InvalidFolderPath { path, reason } => {
                write!(f, "invalid folder path \"{path}\": {reason}")
            }
        }
    }
}

impl std::error::Error for MergeError {}
