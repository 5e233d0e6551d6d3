//! Source discovery and modification-time snapshots

use crate::error::{BuildError, BuildResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

/// Extensions compiled as translation units
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx"];

/// A source path and its modification time, taken once per invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Nanoseconds since the Unix epoch
    pub mtime_ns: u64,
}

impl SourceFile {
    /// Snapshot the current modification time of `path`
    pub fn snapshot(path: impl Into<PathBuf>) -> BuildResult<Self> {
        let path = path.into();
        let modified = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .map_err(|e| BuildError::io(&path, e))?;

        let mtime_ns = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);

        Ok(Self { path, mtime_ns })
    }

    /// Key under which this file is recorded in the cache
    pub fn cache_key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Object file name (without extension) the compiler will produce
    pub fn object_stem(&self) -> String {
        object_stem(&self.path)
    }
}

pub fn object_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SOURCE_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Top-level C/C++ sources of `dir`, sorted by path
///
/// Subdirectories are not descended into.
pub fn discover_sources(dir: &Path) -> BuildResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(BuildError::SourceDirNotFound(dir.to_path_buf()));
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            BuildError::io(path, e.into())
        })?;

        if entry.file_type().is_file() && is_source(entry.path()) {
            sources.push(entry.path().to_path_buf());
        }
    }

    Ok(sources)
}

/// Snapshot every path
pub fn snapshot_all(paths: &[PathBuf]) -> BuildResult<Vec<SourceFile>> {
    paths.iter().map(SourceFile::snapshot).collect()
}

/// Reject two sources that would write the same object file
pub fn check_object_names(sources: &[SourceFile]) -> BuildResult<()> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    for source in sources {
        let stem = source.object_stem();
        if let Some(first) = seen.insert(stem.clone(), &source.path) {
            return Err(BuildError::ObjectNameCollision {
                first: first.to_path_buf(),
                second: source.path.clone(),
                object: stem,
            });
        }
    }
    Ok(())
}
