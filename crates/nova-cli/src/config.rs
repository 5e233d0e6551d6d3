//! Effective settings for one invocation
//!
//! Command-line flags win over environment variables and `nova.toml`, which
//! win over the global config and the built-in defaults.

use crate::BuildFlags;
use anyhow::Result;
use nova_build::{BackendKind, FeatureToggles, OptLevel};
use nova_config::Config;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Forced compiler, `None` to auto-detect
    pub backend: Option<BackendKind>,
    pub opt_level: OptLevel,
    pub debug: bool,
    pub warnings: bool,
    pub jobs: usize,
    pub force_deps: bool,
    pub clear: bool,
    pub verbose: bool,
    pub quiet: bool,
    pub color: bool,
    pub features: FeatureToggles,
    /// Extra defines from `nova.toml`
    pub defines: Vec<String>,
}

impl Settings {
    pub fn resolve(flags: &BuildFlags, config: &Config) -> Result<Self> {
        let backend = flags
            .target
            .as_deref()
            .or_else(|| config.target())
            .map(str::parse::<BackendKind>)
            .transpose()?;

        let opt_level = flags
            .opt_level
            .or_else(|| config.opt_level())
            .map(OptLevel::try_from)
            .transpose()?
            .unwrap_or_default();

        let jobs = flags
            .jobs
            .map(|j| j as usize)
            .or_else(|| config.jobs())
            .unwrap_or_else(default_jobs);

        let features = FeatureToggles {
            float: flags.float,
            tracy: flags.enable_tracy,
            profiler: !flags.no_profiler,
            simd: !flags.no_simd,
            m32: flags.m32,
        };

        Ok(Self {
            backend,
            opt_level,
            debug: flags.debug,
            warnings: flags.warnings || config.warnings(),
            jobs,
            force_deps: flags.force_deps,
            clear: flags.clear,
            verbose: flags.verbose,
            quiet: flags.quiet,
            color: !flags.no_color && config.color(),
            features,
            defines: config.defines().to_vec(),
        })
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use clap::Parser;
    use nova_config::{GlobalConfig, ProjectConfig};
    use pretty_assertions::assert_eq;

    fn config() -> Config {
        Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: None,
            no_color_env: false,
        }
    }

    fn flags(args: &[&str]) -> BuildFlags {
        let mut argv = vec!["nova"];
        argv.extend_from_slice(args);
        argv.push("build");
        Cli::parse_from(argv).flags
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(&flags(&[]), &config()).unwrap();
        assert_eq!(settings.backend, None);
        assert_eq!(settings.opt_level, OptLevel::O3);
        assert_eq!(settings.features, FeatureToggles::default());
        assert!(settings.jobs >= 1);
        assert!(settings.color);
        assert!(!settings.debug);
        assert!(settings.defines.is_empty());
    }

    #[test]
    fn test_flags_override_project() {
        let mut config = config();
        {
            let build = config.project.build_mut();
            build.opt_level = Some(1);
            build.jobs = Some(8);
            build.target = Some("msvc".to_string());
        }

        let settings =
            Settings::resolve(&flags(&["-O", "2", "-j", "2", "--target", "gcc"]), &config).unwrap();
        assert_eq!(settings.opt_level, OptLevel::O2);
        assert_eq!(settings.jobs, 2);
        assert_eq!(settings.backend, Some(BackendKind::Gcc));
    }

    #[test]
    fn test_project_values_apply_without_flags() {
        let mut config = config();
        {
            let build = config.project.build_mut();
            build.opt_level = Some(1);
            build.jobs = Some(8);
            build.target = Some("msvc".to_string());
            build.warnings = Some(true);
            build.defines = vec!["NV_EXTRA".to_string()];
        }

        let settings = Settings::resolve(&flags(&[]), &config).unwrap();
        assert_eq!(settings.opt_level, OptLevel::O1);
        assert_eq!(settings.jobs, 8);
        assert_eq!(settings.backend, Some(BackendKind::Msvc));
        assert!(settings.warnings);
        assert_eq!(settings.defines, vec!["NV_EXTRA".to_string()]);
    }

    #[test]
    fn test_feature_toggles() {
        let settings = Settings::resolve(
            &flags(&["-f", "--enable-tracy", "--no-profiler", "--no-simd", "--m32"]),
            &config(),
        )
        .unwrap();
        assert_eq!(
            settings.features,
            FeatureToggles {
                float: true,
                tracy: true,
                profiler: false,
                simd: false,
                m32: true,
            }
        );
    }

    #[test]
    fn test_no_color() {
        let settings = Settings::resolve(&flags(&["--no-color"]), &config()).unwrap();
        assert!(!settings.color);

        let mut config = config();
        config.no_color_env = true;
        let settings = Settings::resolve(&flags(&[]), &config).unwrap();
        assert!(!settings.color);
    }
}
