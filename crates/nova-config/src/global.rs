//! Global Configuration (~/.nova/config.toml)
//!
//! Handles user-level defaults shared by every project on the machine.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.nova/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Build defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<GlobalBuildConfig>,

    /// Terminal output preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// User-level build defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalBuildConfig {
    /// Preferred compiler backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Default number of parallel compiler processes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

/// Terminal output preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Use ANSI colors (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(build) = &self.build {
            if let Some(target) = &build.target {
                crate::project::validate_target(target)?;
            }
            if build.jobs == Some(0) {
                return Err(ConfigError::invalid("build.jobs", "must be at least 1"));
            }
        }
        Ok(())
    }

    /// Path of the global configuration file
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".nova").join("config.toml"))
    }

    /// Preferred backend, if any
    pub fn target(&self) -> Option<&str> {
        self.build.as_ref().and_then(|b| b.target.as_deref())
    }

    /// Default job count, if any
    pub fn jobs(&self) -> Option<usize> {
        self.build.as_ref().and_then(|b| b.jobs)
    }

    /// Whether colored output is enabled
    pub fn color(&self) -> bool {
        self.output.as_ref().and_then(|o| o.color).unwrap_or(true)
    }
}
