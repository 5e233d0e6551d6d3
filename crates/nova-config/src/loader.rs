//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{validate_opt_level, validate_target, ProjectConfig, ProjectPaths};
use crate::{ConfigError, ConfigResult, PROJECT_FILE};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.nova/config.toml) - lowest priority
/// 2. Project config (./nova.toml) - overrides global
/// 3. Environment variables (NOVA_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration (with environment overrides applied)
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where nova.toml was found)
    pub project_root: Option<PathBuf>,

    /// Color disabled through NOVA_NO_COLOR or NO_COLOR
    pub no_color_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global config file instead of ~/.nova/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find nova.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;

        // Global config is optional and a broken one never blocks a build
        let global_config = self.load_global_config().unwrap_or_default();

        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
            no_color_env: env::var_os("NOVA_NO_COLOR").is_some() || env::var_os("NO_COLOR").is_some(),
        })
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.nova/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to project config
    ///
    /// Recognized: NOVA_TARGET, NOVA_JOBS, NOVA_OPT_LEVEL
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(target) = env::var("NOVA_TARGET") {
            validate_target(&target)?;
            config.build_mut().target = Some(target);
        }

        if let Ok(jobs) = env::var("NOVA_JOBS") {
            let jobs: usize = jobs
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("NOVA_JOBS", format!("'{jobs}' is not a number")))?;
            if jobs == 0 {
                return Err(ConfigError::invalid("NOVA_JOBS", "must be at least 1"));
            }
            config.build_mut().jobs = Some(jobs);
        }

        if let Ok(level) = env::var("NOVA_OPT_LEVEL") {
            let level: u8 = level.trim().parse().map_err(|_| {
                ConfigError::invalid("NOVA_OPT_LEVEL", format!("'{level}' is not a number"))
            })?;
            validate_opt_level(level)?;
            config.build_mut().opt_level = Some(level);
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Whether a nova.toml was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Project root, falling back to the given working directory
    pub fn root<'a>(&'a self, cwd: &'a Path) -> &'a Path {
        self.project_root.as_deref().unwrap_or(cwd)
    }

    /// Resolved directory layout
    pub fn paths(&self, cwd: &Path) -> ProjectPaths {
        self.project.paths(self.root(cwd))
    }

    /// Preferred backend name (project > global)
    pub fn target(&self) -> Option<&str> {
        self.project
            .build
            .as_ref()
            .and_then(|b| b.target.as_deref())
            .or_else(|| self.global.target())
    }

    /// Configured job count (project > global)
    pub fn jobs(&self) -> Option<usize> {
        self.project
            .build
            .as_ref()
            .and_then(|b| b.jobs)
            .or_else(|| self.global.jobs())
    }

    /// Configured optimization level
    pub fn opt_level(&self) -> Option<u8> {
        self.project.build.as_ref().and_then(|b| b.opt_level)
    }

    /// Whether warnings are enabled by configuration
    pub fn warnings(&self) -> bool {
        self.project
            .build
            .as_ref()
            .and_then(|b| b.warnings)
            .unwrap_or(false)
    }

    /// Extra defines from configuration
    pub fn defines(&self) -> &[String] {
        self.project
            .build
            .as_ref()
            .map(|b| b.defines.as_slice())
            .unwrap_or(&[])
    }

    /// Whether colored output is enabled
    pub fn color(&self) -> bool {
        !self.no_color_env && self.global.color()
    }

    /// Base name for produced artifacts
    pub fn library_name(&self) -> &str {
        self.project.library_name()
    }

    /// Display name of the project
    pub fn project_name(&self) -> &str {
        self.project
            .project
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("Nova Physics")
    }
}
