//! Parallel compilation across worker processes
//!
//! Dirty sources are split into jobs and each job runs as one compiler
//! process. Workers share nothing but the staging directory, and every source
//! maps to its own object name, so they never write the same file.

use crate::error::{BuildError, BuildResult};
use crate::options::CompileOptions;
use crate::source::SourceFile;
use crate::toolchain::{CompilerBackend, CompilerCommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Child;

/// One worker's share of the dirty sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationJob {
    pub sources: Vec<SourceFile>,
}

impl CompilationJob {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|s| s.path.clone()).collect()
    }
}

/// Splits dirty sources into at most `parallelism` non-empty jobs
///
/// Every source must end up in exactly one job.
pub trait PartitionStrategy: Send + Sync {
    fn partition(&self, sources: &[SourceFile], parallelism: usize) -> Vec<CompilationJob>;
}

/// Source `i` goes to job `i % parallelism`; empty jobs are dropped
///
/// Not cost aware: one large file can keep a worker busy while others idle.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin;

impl PartitionStrategy for RoundRobin {
    fn partition(&self, sources: &[SourceFile], parallelism: usize) -> Vec<CompilationJob> {
        let parallelism = parallelism.max(1);
        let mut buckets: Vec<Vec<SourceFile>> = vec![Vec::new(); parallelism];

        for (i, source) in sources.iter().enumerate() {
            buckets[i % parallelism].push(source.clone());
        }

        buckets
            .into_iter()
            .filter(|bucket| !bucket.is_empty())
            .map(|sources| CompilationJob { sources })
            .collect()
    }
}

/// Runs compile jobs as concurrent OS processes
pub struct JobScheduler {
    parallelism: usize,
    strategy: Box<dyn PartitionStrategy>,
    verbose: bool,
}

/// Outcome of a successful scheduling round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Worker processes launched
    pub jobs: usize,
    /// Every object now in staging
    pub objects: Vec<PathBuf>,
}

impl JobScheduler {
    /// Scheduler using [`RoundRobin`] with at least one worker
    pub fn new(parallelism: usize) -> Self {
        Self {
            parallelism: parallelism.max(1),
            strategy: Box::new(RoundRobin),
            verbose: false,
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn PartitionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Print each worker's command line
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn partition(&self, dirty: &[SourceFile]) -> Vec<CompilationJob> {
        self.strategy.partition(dirty, self.parallelism)
    }

    /// Compile `dirty` and return every object in `staging`
    ///
    /// Blocks until all launched workers have exited. The first non-zero exit
    /// fails the whole round.
    pub fn run(
        &self,
        dirty: &[SourceFile],
        backend: &dyn CompilerBackend,
        options: &CompileOptions,
        work_dir: &Path,
        staging: &Path,
    ) -> BuildResult<ScheduleReport> {
        let jobs = self.partition(dirty);
        let worker_dir = backend.worker_dir(work_dir, staging);
        fs::create_dir_all(&worker_dir).map_err(|e| BuildError::io(&worker_dir, e))?;

        tracing::info!(
            sources = dirty.len(),
            jobs = jobs.len(),
            "compiling with {} workers",
            self.parallelism
        );

        let mut running: Vec<(CompilerCommand, Child)> = Vec::with_capacity(jobs.len());
        let mut launch_error = None;

        for job in &jobs {
            let command = backend.compile_command(&job.paths(), options);
            if self.verbose {
                println!("{command}\n");
            }
            match command.spawn(&worker_dir) {
                Ok(child) => running.push((command, child)),
                Err(e) => {
                    launch_error = Some(e);
                    break;
                }
            }
        }

        // Every started worker is reaped before any error is reported.
        let mut first_failure = None;
        for (command, mut child) in running {
            let status = child
                .wait()
                .map_err(|e| BuildError::spawn(command.to_string(), e));
            let exit_code = match status {
                Ok(status) => status.code().unwrap_or(-1),
                Err(e) => {
                    first_failure.get_or_insert(e);
                    continue;
                }
            };
            if exit_code != 0 && first_failure.is_none() {
                first_failure = Some(BuildError::CompileFailed {
                    command: command.to_string(),
                    exit_code,
                });
            }
        }

        if let Some(e) = launch_error.or(first_failure) {
            return Err(e);
        }

        backend.relocate_objects(&worker_dir, staging)?;

        Ok(ScheduleReport {
            jobs: jobs.len(),
            objects: collect_objects(staging, backend.object_extension())?,
        })
    }
}

/// Files in `dir` (non-recursive) with the given extension, sorted
pub fn collect_objects(dir: &Path, extension: &str) -> BuildResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(BuildError::io(dir, e)),
    };

    let mut objects = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BuildError::io(dir, e))?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension) {
            objects.push(path);
        }
    }
    objects.sort();
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn sources(n: usize) -> Vec<SourceFile> {
        (0..n)
            .map(|i| SourceFile {
                path: PathBuf::from(format!("/p/src/s{i}.c")),
                mtime_ns: i as u64,
            })
            .collect()
    }

    #[test]
    fn test_round_robin_assignment() {
        let jobs = RoundRobin.partition(&sources(5), 2);
        assert_eq!(jobs.len(), 2);
        let names: Vec<Vec<String>> = jobs
            .iter()
            .map(|j| j.sources.iter().map(|s| s.object_stem()).collect())
            .collect();
        assert_eq!(names, vec![vec!["s0", "s2", "s4"], vec!["s1", "s3"]]);
    }

    #[test]
    fn test_empty_buckets_skipped() {
        assert_eq!(RoundRobin.partition(&sources(2), 8).len(), 2);
        assert!(RoundRobin.partition(&[], 4).is_empty());
    }

    #[test]
    fn test_zero_parallelism_means_one_worker() {
        let scheduler = JobScheduler::new(0);
        assert_eq!(scheduler.parallelism(), 1);
        assert_eq!(scheduler.partition(&sources(3)).len(), 1);
    }

    proptest! {
        #[test]
        fn prop_partition_complete_and_disjoint(k in 0usize..200, p in 1usize..32) {
            let input = sources(k);
            let jobs = RoundRobin.partition(&input, p);

            prop_assert!(jobs.len() <= p);
            prop_assert!(jobs.iter().all(|j| !j.sources.is_empty()));

            let mut seen = HashSet::new();
            for job in &jobs {
                for source in &job.sources {
                    prop_assert!(seen.insert(source.path.clone()));
                }
            }
            prop_assert_eq!(seen.len(), k);
        }
    }

    #[test]
    fn test_collect_objects_filters_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("b.o"), "").unwrap();
        fs::write(dir.path().join("a.o"), "").unwrap();
        fs::write(dir.path().join("a.obj"), "").unwrap();

        let objects = collect_objects(dir.path(), "o").unwrap();
        assert_eq!(objects, vec![dir.path().join("a.o"), dir.path().join("b.o")]);
    }
}
