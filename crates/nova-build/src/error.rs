/// Build system error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No usable compiler found: {0}")]
    ToolingNotFound(String),

    #[error("Compilation failed with exit code {exit_code}: {command}")]
    CompileFailed { command: String, exit_code: i32 },

    #[error("Linking failed with exit code {exit_code}: {command}")]
    LinkFailed { command: String, exit_code: i32 },

    #[error("Archiving failed with exit code {exit_code}: {command}")]
    ArchiveFailed { command: String, exit_code: i32 },

    #[error("Failed to launch '{command}': {error}")]
    Spawn {
        command: String,
        error: std::io::Error,
    },

    #[error("Build cache I/O error at {path}: {error}")]
    CacheIo {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Build cache at {path} is unreadable: {error}")]
    CacheFormat {
        path: PathBuf,
        error: serde_json::Error,
    },

    #[error("Source directory not found: {0}")]
    SourceDirNotFound(PathBuf),

    #[error("Sources {first} and {second} would both compile to object '{object}'")]
    ObjectNameCollision {
        first: PathBuf,
        second: PathBuf,
        object: String,
    },

    #[error("Invalid build option: {0}")]
    InvalidOption(String),

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl BuildError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a cache I/O error with path context
    pub fn cache_io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::CacheIo {
            path: path.into(),
            error,
        }
    }

    /// Create a process launch error
    pub fn spawn(command: impl Into<String>, error: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            error,
        }
    }

    /// Exit code reported by a failed compiler, linker or archiver
    pub fn tool_exit_code(&self) -> Option<i32> {
        match self {
            Self::CompileFailed { exit_code, .. }
            | Self::LinkFailed { exit_code, .. }
            | Self::ArchiveFailed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}
