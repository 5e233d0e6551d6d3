/// Build artifact kinds and naming
use crate::toolchain::BackendKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the link step produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Archive of every object (`build`)
    StaticLibrary,
    /// Linked program (`examples`, `bench`, `tests`)
    Executable,
}

impl ArtifactKind {
    /// File name of the artifact called `name`
    pub fn file_name(&self, name: &str, backend: BackendKind, windows: bool) -> String {
        match (self, backend) {
            (Self::StaticLibrary, BackendKind::Gcc) => format!("lib{name}.a"),
            (Self::StaticLibrary, BackendKind::Msvc) => format!("{name}.lib"),
            (Self::Executable, _) if windows => format!("{name}.exe"),
            (Self::Executable, _) => name.to_string(),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaticLibrary => write!(f, "static library"),
            Self::Executable => write!(f, "executable"),
        }
    }
}
