//! Nova Physics dependency management
//!
//! Fixed table of prebuilt third-party devel packages (SDL2, SDL2_ttf),
//! presence checks, download, archive extraction and per-component copying
//! into the local `deps/` tree.

pub mod archive;
pub mod descriptor;
pub mod fetch;
pub mod manager;
pub mod progress;
pub mod table;

pub use archive::{extract_archive, ArchiveFormat};
pub use descriptor::{Component, ComponentKind, Condition, DependencyDescriptor};
pub use fetch::{Fetcher, HttpFetcher};
pub use manager::{DependencyManager, SatisfyReport};
pub use progress::{DownloadProgress, NoProgress, ProgressSink};
pub use table::DependencyTable;

use std::path::PathBuf;

/// Dependency management errors
#[derive(Debug, thiserror::Error)]
pub enum DepsError {
    #[error("{url} responded with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to download {url}: {error}")]
    Network { url: String, error: reqwest::Error },

    #[error("Archive from {url} is neither gzip-tar nor zip")]
    UnsupportedArchive { url: String },

    #[error("Failed to extract archive from {url}: {reason}")]
    CorruptArchive { url: String, reason: String },

    #[error("Archive of {dependency} has no '{path}'")]
    MissingArchivePath { dependency: String, path: String },

    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Unknown dependency: {0}")]
    UnknownDependency(String),

    #[error("I/O error at {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl DepsError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }
}

pub type DepsResult<T> = std::result::Result<T, DepsError>;
