//! Compiler discovery and backends
//!
//! Discovery is a pure function of a [`ToolchainSearch`]: it returns a
//! [`ToolchainInfo`] that callers thread through instead of reading any
//! process-wide state.

mod backend;
mod command;
mod gcc;
mod msvc;

pub use backend::CompilerBackend;
pub use command::{CompilerCommand, EnvScript};
pub use gcc::GccBackend;
pub use msvc::MsvcBackend;

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Compiler family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Gcc,
    Msvc,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gcc => "gcc",
            Self::Msvc => "msvc",
        }
    }

    /// Human readable compiler name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gcc => "GCC",
            Self::Msvc => "MSVC",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        match s.to_lowercase().as_str() {
            "gcc" => Ok(Self::Gcc),
            "msvc" => Ok(Self::Msvc),
            other => Err(BuildError::InvalidOption(format!(
                "unknown compiler '{other}' (expected gcc or msvc)"
            ))),
        }
    }
}

/// A usable compiler found on this machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolchainInfo {
    Gcc {
        /// Resolved `gcc` executable
        compiler: PathBuf,
    },
    Msvc {
        /// Developer environment bootstrap script (`VsDevCmd.bat`)
        dev_prompt: PathBuf,
    },
}

impl ToolchainInfo {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Gcc { .. } => BackendKind::Gcc,
            Self::Msvc { .. } => BackendKind::Msvc,
        }
    }

    /// Instantiate the matching backend
    pub fn backend(&self, m32: bool) -> Box<dyn CompilerBackend> {
        match self {
            Self::Gcc { compiler } => Box::new(GccBackend::new(compiler.clone())),
            Self::Msvc { dev_prompt } => Box::new(MsvcBackend::new(dev_prompt.clone(), m32)),
        }
    }
}

/// Where discovery looks
#[derive(Debug, Clone, Default)]
pub struct ToolchainSearch {
    /// Value of `PATH`
    pub path_var: Option<OsString>,
    /// Candidate `VsDevCmd.bat` locations, tried in order
    pub msvc_prompts: Vec<PathBuf>,
}

const MSVC_YEARS: &[&str] = &["2022", "2019", "2017", "2015"];
const MSVC_EDITIONS: &[&str] = &["Community", "Professional", "Enterprise", "BuildTools"];
const PROGRAM_FILES: &[&str] = &["C:/Program Files/", "C:/Program Files (x86)/"];

impl ToolchainSearch {
    /// Search the process `PATH` and the well-known Visual Studio locations
    pub fn from_env() -> Self {
        Self {
            path_var: std::env::var_os("PATH"),
            msvc_prompts: default_msvc_prompts(),
        }
    }
}

/// Well-known `VsDevCmd.bat` locations, newest Visual Studio first
pub fn default_msvc_prompts() -> Vec<PathBuf> {
    let mut prompts = Vec::new();
    for year in MSVC_YEARS {
        for edition in MSVC_EDITIONS {
            for base in PROGRAM_FILES {
                prompts.push(PathBuf::from(format!(
                    "{base}Microsoft Visual Studio/{year}/{edition}/Common7/Tools/VsDevCmd.bat"
                )));
            }
        }
    }
    prompts
}

/// Find a compiler
///
/// With no preference GCC wins when it is on `PATH`, otherwise MSVC is used
/// if a developer prompt exists.
pub fn discover(
    preferred: Option<BackendKind>,
    search: &ToolchainSearch,
) -> BuildResult<ToolchainInfo> {
    let find_gcc = || {
        find_in_path("gcc", search.path_var.as_ref())
            .map(|compiler| ToolchainInfo::Gcc { compiler })
    };
    let find_msvc = || {
        search
            .msvc_prompts
            .iter()
            .find(|p| p.is_file())
            .map(|p| ToolchainInfo::Msvc {
                dev_prompt: p.clone(),
            })
    };

    let found = match preferred {
        Some(BackendKind::Gcc) => find_gcc(),
        Some(BackendKind::Msvc) => find_msvc(),
        None => find_gcc().or_else(find_msvc),
    };

    if let Some(info) = &found {
        tracing::debug!(?info, "discovered toolchain");
    }

    found.ok_or_else(|| {
        let searched = match preferred {
            Some(BackendKind::Gcc) => "GCC (gcc not found on PATH)".to_string(),
            Some(BackendKind::Msvc) => format!(
                "MSVC (no developer prompt in {} known locations)",
                search.msvc_prompts.len()
            ),
            None => format!(
                "neither GCC (gcc on PATH) nor MSVC (developer prompt in {} known locations) is installed",
                search.msvc_prompts.len()
            ),
        };
        BuildError::ToolingNotFound(searched)
    })
}

/// Resolve an executable name against a `PATH` value
pub fn find_in_path(name: &str, path_var: Option<&OsString>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(path_var).find_map(|dir| executable_in(&dir, name))
}

fn executable_in(dir: &Path, name: &str) -> Option<PathBuf> {
    let candidate = dir.join(name);
    if candidate.is_file() {
        return Some(candidate);
    }
    if cfg!(windows) {
        let exe = dir.join(format!("{name}.exe"));
        if exe.is_file() {
            return Some(exe);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("GCC".parse::<BackendKind>().unwrap(), BackendKind::Gcc);
        assert_eq!("msvc".parse::<BackendKind>().unwrap(), BackendKind::Msvc);
        assert!("clang".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_default_prompts_cover_every_install() {
        let prompts = default_msvc_prompts();
        assert_eq!(prompts.len(), 4 * 4 * 2);
        assert_eq!(
            prompts[0],
            PathBuf::from(
                "C:/Program Files/Microsoft Visual Studio/2022/Community/Common7/Tools/VsDevCmd.bat"
            )
        );
    }

    #[test]
    fn test_gcc_preferred_when_on_path() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("gcc"), "").unwrap();
        let prompt = dir.path().join("VsDevCmd.bat");
        fs::write(&prompt, "").unwrap();

        let search = ToolchainSearch {
            path_var: Some(dir.path().as_os_str().to_os_string()),
            msvc_prompts: vec![prompt],
        };

        let info = discover(None, &search).unwrap();
        assert_eq!(info.kind(), BackendKind::Gcc);
    }

    #[test]
    fn test_msvc_used_when_gcc_missing() {
        let dir = TempDir::new().unwrap();
        let prompt = dir.path().join("VsDevCmd.bat");
        fs::write(&prompt, "").unwrap();

        let search = ToolchainSearch {
            path_var: Some(dir.path().join("empty").into_os_string()),
            msvc_prompts: vec![dir.path().join("missing.bat"), prompt.clone()],
        };

        assert_eq!(
            discover(None, &search).unwrap(),
            ToolchainInfo::Msvc { dev_prompt: prompt }
        );
    }

    #[test]
    fn test_nothing_found_names_both_compilers() {
        let search = ToolchainSearch::default();
        match discover(None, &search) {
            Err(BuildError::ToolingNotFound(msg)) => {
                assert!(msg.contains("GCC"));
                assert!(msg.contains("MSVC"));
            }
            other => panic!("expected ToolingNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_preference_is_strict() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("gcc"), "").unwrap();
        let search = ToolchainSearch {
            path_var: Some(dir.path().as_os_str().to_os_string()),
            msvc_prompts: Vec::new(),
        };

        assert!(discover(Some(BackendKind::Msvc), &search).is_err());
        assert!(discover(Some(BackendKind::Gcc), &search).is_ok());
    }
}
