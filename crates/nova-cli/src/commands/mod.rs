//! Command flows and the state they share

pub mod bench;
pub mod build;
pub mod deps;
pub mod examples;

use crate::config::Settings;
use crate::output::Output;
use crate::BuildFlags;
use anyhow::{bail, Context, Result};
use nova_build::{
    classify_exit, discover, discover_sources, run_artifact, ArtifactKind, BackendKind,
    BuildCache, BuildConfig, BuildFingerprint, BuildOutcome, BuildRequest, Builder,
    CompileOptions, ExitClass, Flow, LinkOptions, PlatformInfo, ToolchainSearch, TRACY_LIBRARIES,
};
use nova_config::{ConfigLoader, ProjectPaths};
use std::path::{Path, PathBuf};

/// Everything a command needs: settings, layout, host and output
pub struct Session {
    pub settings: Settings,
    pub paths: ProjectPaths,
    pub platform: PlatformInfo,
    pub library_name: String,
    pub out: Output,
}

impl Session {
    /// Load configuration, check the working directory and apply `--clear`
    pub fn open(flags: &BuildFlags) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read the working directory")?;
        let config = ConfigLoader::new()
            .load_from_directory(&cwd)
            .context("Failed to load configuration")?;
        let settings = Settings::resolve(flags, &config)?;
        let paths = config.paths(&cwd);

        if !config.is_project() && !paths.src.is_dir() {
            bail!(
                "No nova.toml and no '{}' directory in {}; run nova from the project root",
                paths.src.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
                cwd.display()
            );
        }

        let out = Output::new(settings.color, settings.quiet, settings.verbose);

        if settings.clear {
            BuildCache::clear(&paths.cache)?;
            out.info("Cleared the build cache");
        }

        let platform = PlatformInfo::detect();
        tracing::debug!(root = %paths.root.display(), ?settings, "session opened");

        Ok(Self {
            settings,
            library_name: config.library_name().to_string(),
            paths,
            platform,
            out,
        })
    }

    /// Find a compiler and set up a builder for it
    pub fn builder(&self) -> Result<Builder> {
        let toolchain = discover(self.settings.backend, &ToolchainSearch::from_env())?;
        let backend = toolchain.backend(self.settings.features.m32);

        let version = backend.version().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not query compiler version");
            "(unknown version)".to_string()
        });
        self.out.info(format!(
            "Compiler: {} {}",
            backend.kind().display_name(),
            version
        ));
        self.out.info(format!("Platform: {}", self.platform));

        Ok(Builder::new(backend).with_config(BuildConfig {
            build_dir: self.paths.build.clone(),
            cache_dir: self.paths.cache.clone(),
            jobs: self.settings.jobs,
            windows: self.platform.is_windows(),
            verbose: self.settings.verbose,
        }))
    }

    /// Library sources plus the options every flow shares
    ///
    /// Flow-specific sources go in front of the library sources.
    pub fn request(
        &self,
        flow: Flow,
        backend: BackendKind,
        artifact_kind: ArtifactKind,
        extra_sources: Vec<PathBuf>,
    ) -> Result<BuildRequest> {
        let settings = &self.settings;
        let features = settings.features;

        let mut sources = extra_sources;
        let mut include_paths = vec![self.paths.include.clone()];
        let mut libraries = Vec::new();

        if features.tracy {
            let tracy_dir = self.paths.src.join("tracy");
            sources.push(tracy_dir.join("TracyClient.cpp"));
            include_paths.push(tracy_dir);
            libraries.extend(TRACY_LIBRARIES.iter().map(|l| l.to_string()));
        }
        sources.extend(discover_sources(&self.paths.src)?);

        if !self.platform.is_windows() {
            libraries.push("m".to_string());
        }

        let mut defines = features.defines();
        defines.extend(settings.defines.iter().cloned());

        let compile = CompileOptions {
            include_paths,
            defines,
            opt_level: settings.opt_level,
            debug: settings.debug,
            warnings: settings.warnings,
            native_arch: features.simd,
            m32: features.m32,
            extra_args: Vec::new(),
        };

        let link = LinkOptions {
            libraries,
            opt_level: settings.opt_level,
            debug: settings.debug,
            m32: features.m32,
            ..LinkOptions::default()
        };

        let fingerprint = BuildFingerprint::new(backend, settings.debug)
            .with_opt_level(settings.opt_level)
            .with_features(features)
            .with_flow(flow)
            .with_defines(settings.defines.iter().cloned());

        Ok(BuildRequest {
            sources,
            compile,
            link,
            artifact_name: self.library_name.clone(),
            artifact_kind,
            fingerprint,
        })
    }

    /// Run the build and report it
    pub fn build(&self, builder: &Builder, request: &BuildRequest) -> Result<BuildOutcome> {
        self.out.info("Compilation started");
        let outcome = builder.build(request)?;

        if outcome.stale {
            self.out
                .detail("Build configuration changed since the last run; cache discarded");
        }
        self.out.done(format!(
            "Built {} ({} of {} sources compiled with {} jobs in {:.2}s)",
            outcome.artifact.display(),
            outcome.compiled,
            outcome.total_sources,
            outcome.jobs,
            outcome.timings.total.as_secs_f64()
        ));
        Ok(outcome)
    }

    /// Run a built program from the build directory and mirror its exit code
    pub fn run_program(&self, program: &Path, what: &str) -> Result<i32> {
        self.out.info(format!("Running the {what}"));
        let code = run_artifact(program, &self.paths.build, &[])?;

        match classify_exit(code) {
            ExitClass::Success => self.out.done(format!("The {what} exited with code 0.")),
            ExitClass::Crash(code) => self.out.crash(what, code),
            ExitClass::Failure(code) => self.out.fail(format!("The {what} exited with code {code}")),
        }
        Ok(code as i32)
    }
}

/// Fail early when a flow's entry source is missing
pub fn require_file(path: &Path, what: &str) -> Result<()> {
    if !path.is_file() {
        bail!(
            "{what} {} is not found. Make sure you are in the Nova Physics directory!",
            path.display()
        );
    }
    Ok(())
}
