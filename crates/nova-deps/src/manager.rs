//! Dependency satisfaction
//!
//! `satisfy` downloads each dependency that has an unsatisfied component
//! once, extracts it into `deps/_<name>`, then copies only the unsatisfied
//! components into place. Any failure aborts the whole call.

use crate::archive::extract_archive;
use crate::descriptor::ComponentKind;
use crate::fetch::Fetcher;
use crate::progress::ProgressSink;
use crate::table::DependencyTable;
use crate::{DepsError, DepsResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// What a `satisfy` call did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SatisfyReport {
    /// Archives downloaded
    pub downloads: usize,
    /// `(dependency, component)` pairs copied into place, in order
    pub extracted: Vec<(String, ComponentKind)>,
    pub elapsed: Duration,
}

impl SatisfyReport {
    pub fn is_noop(&self) -> bool {
        self.downloads == 0 && self.extracted.is_empty()
    }
}

pub struct DependencyManager<F: Fetcher> {
    fetcher: F,
}

impl<F: Fetcher> DependencyManager<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch and place every unsatisfied component
    ///
    /// Does nothing, not even touching the filesystem, when nothing is missing.
    pub fn satisfy(
        &self,
        table: &mut DependencyTable,
        progress: &mut dyn ProgressSink,
    ) -> DepsResult<SatisfyReport> {
        let mut report = SatisfyReport::default();
        if table.missing(None) == 0 {
            return Ok(report);
        }

        let start = Instant::now();
        let root = table.root().to_path_buf();
        for kind in ComponentKind::ALL {
            let dir = root.join(kind.dir_name());
            fs::create_dir_all(&dir).map_err(|e| DepsError::io(&dir, e))?;
        }

        // Leftovers of an interrupted run.
        clean(table)?;

        for index in 0..table.dependencies().len() {
            let dep = &table.dependencies()[index];
            if dep.missing() == 0 {
                continue;
            }

            let name = dep.name.clone();
            let temp_dir = table.temp_dir(&name);

            tracing::info!(dependency = %name, url = %dep.url, "downloading");
            progress.downloading(&name, &dep.url);
            let data = self.fetcher.fetch(&dep.url, progress)?;
            report.downloads += 1;

            if let Some(expected) = &dep.sha256 {
                verify_checksum(&dep.url, expected, &data)?;
            }
            extract_archive(&data, &temp_dir, &dep.url)?;

            let dep = &mut table.dependencies_mut()[index];
            for component in dep.components.iter_mut().filter(|c| !c.satisfied) {
                progress.extracting(&name, &component.archive_path);
                tracing::info!(
                    dependency = %name,
                    component = %component.kind,
                    path = %component.archive_path,
                    "extracting"
                );

                let source = temp_dir.join(&component.archive_path);
                if !source.is_dir() {
                    return Err(DepsError::MissingArchivePath {
                        dependency: name.clone(),
                        path: component.archive_path.clone(),
                    });
                }
                copy_tree(&source, &root.join(&component.target))?;

                component.satisfied = true;
                report.extracted.push((name.clone(), component.kind));
            }
        }

        clean(table)?;
        report.elapsed = start.elapsed();
        Ok(report)
    }
}

/// Remove every per-dependency temporary directory
pub fn clean(table: &DependencyTable) -> DepsResult<()> {
    for dep in table.dependencies() {
        let temp_dir = table.temp_dir(&dep.name);
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir).map_err(|e| DepsError::io(&temp_dir, e))?;
        }
    }
    Ok(())
}

/// Delete the whole deps directory so everything is fetched again
pub fn force_clear(root: &Path) -> DepsResult<()> {
    match fs::remove_dir_all(root) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DepsError::io(root, e)),
    }
}

fn verify_checksum(url: &str, expected: &str, data: &[u8]) -> DepsResult<()> {
    let actual = format!("{:x}", Sha256::digest(data));
    if actual == expected.to_lowercase() {
        Ok(())
    } else {
        Err(DepsError::ChecksumMismatch {
            url: url.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Recursively copy `src` into `dst`, merging with existing content
pub fn copy_tree(src: &Path, dst: &Path) -> DepsResult<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            DepsError::io(path, e.into())
        })?;

        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| DepsError::io(entry.path(), std::io::ErrorKind::InvalidInput.into()))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| DepsError::io(&target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| DepsError::io(parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| DepsError::io(&target, e))?;
        }
    }
    Ok(())
}
