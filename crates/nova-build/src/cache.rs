//! Incremental build cache
//!
//! Two JSON records live in the cache directory:
//! - `sources.json`: source path -> last seen modification time (ns)
//! - `config.json`: the [`BuildFingerprint`] of the last attempt
//!
//! Object files are staged in `obj/` next to them. The map is committed after
//! every build attempt, successful or not, so a failed compile of an unchanged
//! file is not retried until the file is touched or the cache is cleared.

use crate::error::{BuildError, BuildResult};
use crate::fingerprint::BuildFingerprint;
use crate::source::SourceFile;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const SOURCES_FILE: &str = "sources.json";
const CONFIG_FILE: &str = "config.json";
const STAGING_DIR: &str = "obj";

/// Result of comparing the current sources against the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheQuery {
    /// Sources that must be recompiled, in input order
    pub dirty: Vec<SourceFile>,
    /// The fingerprint changed (or none existed) and everything was discarded
    pub stale: bool,
}

/// Persistent path -> mtime map plus configuration fingerprint
#[derive(Debug)]
pub struct BuildCache {
    dir: PathBuf,
    sources: BTreeMap<String, u64>,
    fingerprint: Option<BuildFingerprint>,
}

impl BuildCache {
    /// Load the cache stored in `dir`
    ///
    /// Missing records mean an empty cache. Unreadable or malformed records are
    /// errors.
    pub fn load(dir: impl Into<PathBuf>) -> BuildResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(dir.join(STAGING_DIR))
            .map_err(|e| BuildError::cache_io(dir.join(STAGING_DIR), e))?;

        let sources = read_record(&dir.join(SOURCES_FILE))?.unwrap_or_default();
        let fingerprint = read_record(&dir.join(CONFIG_FILE))?;

        Ok(Self {
            dir,
            sources,
            fingerprint,
        })
    }

    /// Remove the whole cache directory
    pub fn clear(dir: &Path) -> BuildResult<()> {
        match fs::remove_dir_all(dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BuildError::cache_io(dir, e)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory holding object files between runs
    pub fn staging_dir(&self) -> PathBuf {
        self.dir.join(STAGING_DIR)
    }

    pub fn fingerprint(&self) -> Option<&BuildFingerprint> {
        self.fingerprint.as_ref()
    }

    /// Recorded modification time for a source
    pub fn recorded_mtime(&self, source: &SourceFile) -> Option<u64> {
        self.sources.get(&source.cache_key()).copied()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Decide which sources need compiling
    ///
    /// A fingerprint mismatch drops every entry and staged object and reports
    /// all sources dirty.
    pub fn query(
        &mut self,
        sources: &[SourceFile],
        fingerprint: &BuildFingerprint,
    ) -> BuildResult<CacheQuery> {
        if self.fingerprint.as_ref() != Some(fingerprint) {
            tracing::debug!(
                previous = ?self.fingerprint,
                current = ?fingerprint,
                "build configuration changed, discarding cache"
            );
            self.invalidate()?;
            return Ok(CacheQuery {
                dirty: sources.to_vec(),
                stale: true,
            });
        }

        let dirty: Vec<SourceFile> = sources
            .iter()
            .filter(|source| self.recorded_mtime(source) != Some(source.mtime_ns))
            .cloned()
            .collect();

        tracing::debug!(
            dirty = dirty.len(),
            total = sources.len(),
            "compared sources against cache"
        );

        Ok(CacheQuery {
            dirty,
            stale: false,
        })
    }

    /// Record the attempted sources and fingerprint, then persist both
    pub fn commit(
        &mut self,
        attempted: &[SourceFile],
        fingerprint: &BuildFingerprint,
    ) -> BuildResult<()> {
        for source in attempted {
            self.sources.insert(source.cache_key(), source.mtime_ns);
        }
        self.fingerprint = Some(fingerprint.clone());

        write_record(&self.dir.join(SOURCES_FILE), &self.sources)?;
        write_record(&self.dir.join(CONFIG_FILE), fingerprint)?;
        Ok(())
    }

    fn invalidate(&mut self) -> BuildResult<()> {
        self.sources.clear();
        self.fingerprint = None;

        let staging = self.staging_dir();
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| BuildError::cache_io(&staging, e))?;
        }
        fs::create_dir_all(&staging).map_err(|e| BuildError::cache_io(&staging, e))?;
        Ok(())
    }
}

fn read_record<T: DeserializeOwned>(path: &Path) -> BuildResult<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(BuildError::cache_io(path, e)),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|error| BuildError::CacheFormat {
            path: path.to_path_buf(),
            error,
        })
}

/// Write to a sibling temp file, then rename over the target
fn write_record<T: Serialize + ?Sized>(path: &Path, value: &T) -> BuildResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|error| BuildError::CacheFormat {
        path: path.to_path_buf(),
        error,
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| BuildError::cache_io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| BuildError::cache_io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::BackendKind;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn source(path: &str, mtime_ns: u64) -> SourceFile {
        SourceFile {
            path: PathBuf::from(path),
            mtime_ns,
        }
    }

    fn gcc(debug: bool) -> BuildFingerprint {
        BuildFingerprint::new(BackendKind::Gcc, debug)
    }

    #[test]
    fn test_empty_cache_reports_everything_dirty() {
        let dir = TempDir::new().unwrap();
        let mut cache = BuildCache::load(dir.path()).unwrap();
        let sources = vec![source("/p/a.c", 1), source("/p/b.c", 2)];

        let query = cache.query(&sources, &gcc(false)).unwrap();
        assert!(query.stale);
        assert_eq!(query.dirty, sources);
    }

    #[test]
    fn test_commit_then_query_is_clean() {
        let dir = TempDir::new().unwrap();
        let sources = vec![source("/p/a.c", 1), source("/p/b.c", 2)];

        let mut cache = BuildCache::load(dir.path()).unwrap();
        let query = cache.query(&sources, &gcc(false)).unwrap();
        cache.commit(&query.dirty, &gcc(false)).unwrap();

        let mut reloaded = BuildCache::load(dir.path()).unwrap();
        let query = reloaded.query(&sources, &gcc(false)).unwrap();
        assert!(!query.stale);
        assert!(query.dirty.is_empty());
    }

    #[test]
    fn test_changed_mtime_and_new_file_are_dirty() {
        let dir = TempDir::new().unwrap();
        let mut cache = BuildCache::load(dir.path()).unwrap();
        cache
            .commit(&[source("/p/a.c", 1), source("/p/b.c", 2)], &gcc(false))
            .unwrap();

        let current = vec![source("/p/a.c", 1), source("/p/b.c", 5), source("/p/c.c", 3)];
        let query = cache.query(&current, &gcc(false)).unwrap();
        assert_eq!(query.dirty, vec![source("/p/b.c", 5), source("/p/c.c", 3)]);
    }

    #[test]
    fn test_fingerprint_change_discards_entries_and_objects() {
        let dir = TempDir::new().unwrap();
        let sources = vec![source("/p/a.c", 1), source("/p/b.c", 2)];

        let mut cache = BuildCache::load(dir.path()).unwrap();
        cache.commit(&sources, &gcc(false)).unwrap();
        fs::write(cache.staging_dir().join("a.o"), "obj").unwrap();

        let mut cache = BuildCache::load(dir.path()).unwrap();
        let query = cache.query(&sources, &gcc(true)).unwrap();

        assert!(query.stale);
        assert_eq!(query.dirty, sources);
        assert!(cache.is_empty());
        assert!(!cache.staging_dir().join("a.o").exists());
        assert!(cache.staging_dir().is_dir());
    }

    #[test]
    fn test_removed_sources_stay_recorded() {
        let dir = TempDir::new().unwrap();
        let mut cache = BuildCache::load(dir.path()).unwrap();
        cache
            .commit(&[source("/p/a.c", 1), source("/p/old.c", 2)], &gcc(false))
            .unwrap();

        let query = cache.query(&[source("/p/a.c", 1)], &gcc(false)).unwrap();
        assert!(query.dirty.is_empty());
        cache.commit(&query.dirty, &gcc(false)).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SOURCES_FILE), "{not json").unwrap();

        assert!(matches!(
            BuildCache::load(dir.path()),
            Err(BuildError::CacheFormat { .. })
        ));
    }

    #[test]
    fn test_records_are_plain_json() {
        let dir = TempDir::new().unwrap();
        let mut cache = BuildCache::load(dir.path()).unwrap();
        cache.commit(&[source("/p/a.c", 42)], &gcc(false)).unwrap();

        let raw = fs::read_to_string(dir.path().join(SOURCES_FILE)).unwrap();
        let map: BTreeMap<String, u64> = serde_json::from_str(&raw).unwrap();
        assert_eq!(map.get("/p/a.c"), Some(&42));
        assert!(!dir.path().join("sources.json.tmp").exists());
    }

    #[test]
    fn test_clear_missing_dir_is_ok() {
        let dir = TempDir::new().unwrap();
        BuildCache::clear(&dir.path().join("cache")).unwrap();
    }
}
