//! Project Configuration (nova.toml)
//!
//! Handles project-level configuration stored in `nova.toml` at the project root.
//! Every section is optional; a missing file behaves like an empty one.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration from nova.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSection>,

    /// Directory layout overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<PathsConfig>,

    /// Build defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSection>,
}

/// `[project]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// Project name, used in banners
    pub name: String,

    /// Base name of the produced library and binaries (default: "nova")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
}

/// `[paths]` section, all relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deps: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmarks: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<PathBuf>,
}

/// `[build]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Preferred compiler backend ("gcc" or "msvc")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Optimization level, 1 to 3
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt_level: Option<u8>,

    /// Number of parallel compiler processes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,

    /// Enable compiler warnings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<bool>,

    /// Extra preprocessor defines passed to every compile
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub defines: Vec<String>,
}

/// Absolute directory layout of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub src: PathBuf,
    pub include: PathBuf,
    pub build: PathBuf,
    pub cache: PathBuf,
    pub deps: PathBuf,
    pub examples: PathBuf,
    pub benchmarks: PathBuf,
    pub tests: PathBuf,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config = Self::parse(&content).map_err(|e| match e {
            ConfigError::TomlParseError { error, .. } => ConfigError::TomlParseError {
                file: path.to_path_buf(),
                error,
            },
            other => other,
        })?;

        Ok(config)
    }

    /// Parse and validate project configuration from a TOML string
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: PathBuf::from(crate::PROJECT_FILE),
            error: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges that serde cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(build) = &self.build {
            if let Some(level) = build.opt_level {
                validate_opt_level(level)?;
            }
            if build.jobs == Some(0) {
                return Err(ConfigError::invalid("build.jobs", "must be at least 1"));
            }
            if let Some(target) = &build.target {
                validate_target(target)?;
            }
        }

        if let Some(project) = &self.project {
            if project.name.trim().is_empty() {
                return Err(ConfigError::invalid("project.name", "cannot be empty"));
            }
        }

        Ok(())
    }

    /// Base name for produced artifacts
    pub fn library_name(&self) -> &str {
        self.project
            .as_ref()
            .and_then(|p| p.library.as_deref())
            .unwrap_or("nova")
    }

    /// Resolve the directory layout against a project root
    pub fn paths(&self, root: &Path) -> ProjectPaths {
        let defaults = PathsConfig::default();
        let paths = self.paths.as_ref().unwrap_or(&defaults);
        let pick = |value: &Option<PathBuf>, default: &str| {
            root.join(value.as_deref().unwrap_or(Path::new(default)))
        };

        ProjectPaths {
            root: root.to_path_buf(),
            src: pick(&paths.src, "src"),
            include: pick(&paths.include, "include"),
            build: pick(&paths.build, "build"),
            cache: pick(&paths.cache, "cache"),
            deps: pick(&paths.deps, "deps"),
            examples: pick(&paths.examples, "examples"),
            benchmarks: pick(&paths.benchmarks, "benchmarks"),
            tests: pick(&paths.tests, "tests"),
        }
    }

    /// Mutable access to the build section, creating it when absent
    pub fn build_mut(&mut self) -> &mut BuildSection {
        self.build.get_or_insert_with(BuildSection::default)
    }
}

/// Check an optimization level is within 1..=3
pub fn validate_opt_level(level: u8) -> ConfigResult<()> {
    if (1..=3).contains(&level) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            "opt_level",
            format!("{level} is outside the range [1, 3]"),
        ))
    }
}

/// Check a backend name is one the build tool knows
pub fn validate_target(target: &str) -> ConfigResult<()> {
    match target.to_ascii_lowercase().as_str() {
        "gcc" | "msvc" => Ok(()),
        other => Err(ConfigError::invalid(
            "target",
            format!("unknown compiler target '{other}'"),
        )),
    }
}
