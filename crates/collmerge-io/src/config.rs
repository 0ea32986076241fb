//! YAML merge configuration.
//!
//! Every field is optional except each service's `name`; missing options take
//! the defaults of [`MergeOptions`](collmerge_merge::MergeOptions).

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use collmerge_merge::{MergeConfig, MergeError};
use log::warn;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    InvalidYaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    Invalid {
        path: PathBuf,
        source: MergeError,
    },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::InvalidYaml { .. } => "config_invalid_yaml",
            ConfigError::Invalid { source, .. } => source.code(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read config {}: {source}", path.display())
            }
            ConfigError::InvalidYaml { path, source } => {
                write!(f, "invalid config {}: {source}", path.display())
            }
            ConfigError::Invalid { path, source } => {
                write!(f, "invalid config {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::InvalidYaml { source, .. } => Some(source),
            ConfigError::Invalid { source, .. } => Some(source),
        }
    }
}

pub fn load_config(path: &Path) -> Result<MergeConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&text, path)
}

/// Parse and validate configuration text. `origin` is only used in errors.
pub fn parse_config_str(text: &str, origin: &Path) -> Result<MergeConfig, ConfigError> {
    let config: MergeConfig = if text.trim().is_empty() {
        MergeConfig::default()
    } else {
        serde_yaml::from_str(text).map_err(|source| ConfigError::InvalidYaml {
            path: origin.to_path_buf(),
            source,
        })?
    };

    config.validate().map_err(|source| ConfigError::Invalid {
        path: origin.to_path_buf(),
        source,
    })?;

    if config.services.is_empty() {
        warn!("config {} declares no services; nothing to merge", origin.display());
    }
    let mut seen = BTreeSet::new();
    for svc in &config.services {
        if !seen.insert(svc.name.as_str()) {
            warn!("service '{}' is configured more than once", svc.name);
        }
    }

    Ok(config)
}
