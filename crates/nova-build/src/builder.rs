//! Build orchestration and pipeline management
//!
//! `query cache -> compile dirty sources -> link or archive -> commit cache`.
//! The cache is committed after every attempt, including failed ones.

use crate::cache::BuildCache;
use crate::error::{BuildError, BuildResult};
use crate::fingerprint::BuildFingerprint;
use crate::options::{CompileOptions, LinkOptions};
use crate::scheduler::{collect_objects, JobScheduler};
use crate::source::{check_object_names, snapshot_all, SourceFile};
use crate::targets::ArtifactKind;
use crate::toolchain::CompilerBackend;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Build configuration
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Artifact output directory, recreated on every build
    pub build_dir: PathBuf,
    /// Cache records and staged objects
    pub cache_dir: PathBuf,
    /// Parallel compiler processes
    pub jobs: usize,
    /// Host is Windows (affects executable naming)
    pub windows: bool,
    /// Print command lines
    pub verbose: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("build"),
            cache_dir: PathBuf::from("cache"),
            jobs: 1,
            windows: cfg!(windows),
            verbose: false,
        }
    }
}

/// One build invocation
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Translation units (absolute paths)
    pub sources: Vec<PathBuf>,
    pub compile: CompileOptions,
    /// `output` is filled in by the builder
    pub link: LinkOptions,
    pub artifact_name: String,
    pub artifact_kind: ArtifactKind,
    pub fingerprint: BuildFingerprint,
}

/// Per-phase wall clock time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildTimings {
    pub compile: Duration,
    pub link: Duration,
    pub total: Duration,
}

/// Result of a successful build
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Sources recompiled in this run
    pub compiled: usize,
    pub total_sources: usize,
    /// The configuration changed and the cache was discarded
    pub stale: bool,
    /// Worker processes launched
    pub jobs: usize,
    /// Objects fed to the link step
    pub objects: Vec<PathBuf>,
    pub artifact: PathBuf,
    pub timings: BuildTimings,
}

/// Main builder for orchestrating builds
pub struct Builder {
    backend: Box<dyn CompilerBackend>,
    config: BuildConfig,
}

impl Builder {
    pub fn new(backend: Box<dyn CompilerBackend>) -> Self {
        Self {
            backend,
            config: BuildConfig::default(),
        }
    }

    /// Set build configuration
    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_build_dir(mut self, build_dir: impl Into<PathBuf>) -> Self {
        self.config.build_dir = build_dir.into();
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = cache_dir.into();
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.config.jobs = jobs;
        self
    }

    /// Enable/disable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn backend(&self) -> &dyn CompilerBackend {
        self.backend.as_ref()
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Path the artifact of `request` will be written to
    pub fn artifact_path(&self, request: &BuildRequest) -> PathBuf {
        self.config.build_dir.join(request.artifact_kind.file_name(
            &request.artifact_name,
            self.backend.kind(),
            self.config.windows,
        ))
    }

    /// Execute the build
    pub fn build(&self, request: &BuildRequest) -> BuildResult<BuildOutcome> {
        let build_start = Instant::now();

        recreate_dir(&self.config.build_dir)?;

        let sources = snapshot_all(&request.sources)?;
        check_object_names(&sources)?;

        let mut cache = BuildCache::load(&self.config.cache_dir)?;
        let query = cache.query(&sources, &request.fingerprint)?;

        if self.config.verbose {
            if query.stale {
                println!("Build configuration changed, rebuilding everything.");
            }
            if query.dirty.is_empty() {
                println!("No source to compile.");
            } else {
                println!(
                    "There are {} changed source files to compile.",
                    query.dirty.len()
                );
            }
        }

        let result = self.compile_and_link(request, &sources, &query.dirty, cache.staging_dir());

        // Committed even when compilation failed.
        let committed = cache.commit(&query.dirty, &request.fingerprint);

        let (jobs, objects, artifact, mut timings) = match (result, committed) {
            (Ok(done), Ok(())) => done,
            (Err(e), Ok(())) => return Err(e),
            (Ok(_), Err(e)) => return Err(e),
            (Err(e), Err(commit_error)) => {
                tracing::warn!(error = %commit_error, "failed to persist build cache");
                return Err(e);
            }
        };
        timings.total = build_start.elapsed();

        if self.config.verbose {
            println!("Build completed in {:.2}s", timings.total.as_secs_f64());
        }

        Ok(BuildOutcome {
            compiled: query.dirty.len(),
            total_sources: sources.len(),
            stale: query.stale,
            jobs,
            objects,
            artifact,
            timings,
        })
    }

    fn compile_and_link(
        &self,
        request: &BuildRequest,
        sources: &[SourceFile],
        dirty: &[SourceFile],
        staging: PathBuf,
    ) -> BuildResult<(usize, Vec<PathBuf>, PathBuf, BuildTimings)> {
        let mut timings = BuildTimings::default();

        let compile_start = Instant::now();
        let (jobs, staged) = if dirty.is_empty() {
            (0, collect_objects(&staging, self.backend.object_extension())?)
        } else {
            let work_dir = self.config.cache_dir.join("work");
            let report = JobScheduler::new(self.config.jobs)
                .with_verbose(self.config.verbose)
                .run(dirty, self.backend.as_ref(), &request.compile, &work_dir, &staging)?;
            (report.jobs, report.objects)
        };
        let objects = objects_for(sources, &staged, self.backend.object_extension());
        timings.compile = compile_start.elapsed();

        let link_start = Instant::now();
        let artifact = self.artifact_path(request);
        self.link(request, &objects, &artifact)?;
        timings.link = link_start.elapsed();

        Ok((jobs, objects, artifact, timings))
    }

    fn link(&self, request: &BuildRequest, objects: &[PathBuf], artifact: &Path) -> BuildResult<()> {
        let options = LinkOptions {
            output: artifact.to_path_buf(),
            ..request.link.clone()
        };
        let command = match request.artifact_kind {
            ArtifactKind::StaticLibrary => self.backend.archive_command(objects, &options),
            ArtifactKind::Executable => self.backend.link_command(objects, &options),
        };

        if self.config.verbose {
            println!("{command}\n");
        }

        let exit_code = command.run(&self.config.build_dir)?;
        if exit_code == 0 {
            return Ok(());
        }

        let command = command.to_string();
        Err(match request.artifact_kind {
            ArtifactKind::StaticLibrary => BuildError::ArchiveFailed { command, exit_code },
            ArtifactKind::Executable => BuildError::LinkFailed { command, exit_code },
        })
    }
}

/// Staged objects that belong to `sources`
///
/// Staging is shared by every flow with the same fingerprint, so it can hold
/// objects of sources that are not part of this build.
fn objects_for(sources: &[SourceFile], staged: &[PathBuf], extension: &str) -> Vec<PathBuf> {
    let wanted: HashSet<String> = sources
        .iter()
        .map(|s| format!("{}.{extension}", s.object_stem()))
        .collect();

    staged
        .iter()
        .filter(|object| {
            object
                .file_name()
                .is_some_and(|name| wanted.contains(name.to_string_lossy().as_ref()))
        })
        .cloned()
        .collect()
}

fn recreate_dir(dir: &Path) -> BuildResult<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| BuildError::io(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| BuildError::io(dir, e))
}
