//! Abstract compile and link requests
//!
//! Backends render these into their own flag syntax.

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Optimization level (1-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum OptLevel {
    O1,
    O2,
    /// Default
    O3,
}

impl OptLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::O1 => 1,
            Self::O2 => 2,
            Self::O3 => 3,
        }
    }
}

impl Default for OptLevel {
    fn default() -> Self {
        Self::O3
    }
}

impl TryFrom<u8> for OptLevel {
    type Error = BuildError;

    fn try_from(level: u8) -> BuildResult<Self> {
        match level {
            1 => Ok(Self::O1),
            2 => Ok(Self::O2),
            3 => Ok(Self::O3),
            other => Err(BuildError::InvalidOption(format!(
                "optimization level must be 1, 2 or 3 (got {other})"
            ))),
        }
    }
}

impl From<OptLevel> for u8 {
    fn from(level: OptLevel) -> u8 {
        level.as_u8()
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O{}", self.as_u8())
    }
}

/// Optional engine features selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureToggles {
    /// Single precision floats (`NV_FLOAT`)
    pub float: bool,
    /// Tracy profiler client
    pub tracy: bool,
    /// Built-in profiler (`NV_PROFILE`)
    pub profiler: bool,
    /// SIMD code paths and native codegen
    pub simd: bool,
    /// 32-bit output
    pub m32: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            float: false,
            tracy: false,
            profiler: true,
            simd: true,
            m32: false,
        }
    }
}

/// Link libraries the Tracy client needs
pub const TRACY_LIBRARIES: &[&str] = &["stdc++", "ws2_32", "wsock32", "dbghelp"];

impl FeatureToggles {
    /// Preprocessor defines implied by the toggles
    pub fn defines(&self) -> Vec<String> {
        let mut defines = Vec::new();
        if self.float {
            defines.push("NV_FLOAT".to_string());
        }
        if self.profiler {
            defines.push("NV_PROFILE".to_string());
        }
        if self.simd {
            defines.push("NV_USE_SIMD".to_string());
        }
        if self.tracy {
            defines.push("TRACY_ENABLE".to_string());
        }
        defines
    }
}

/// Abstract compile request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub include_paths: Vec<PathBuf>,
    /// `NAME` or `NAME=VALUE`
    pub defines: Vec<String>,
    pub opt_level: OptLevel,
    /// Debug info instead of optimization
    pub debug: bool,
    pub warnings: bool,
    /// Codegen for the host CPU
    pub native_arch: bool,
    pub m32: bool,
    /// Passed through verbatim
    pub extra_args: Vec<String>,
}

/// Abstract link request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOptions {
    pub output: PathBuf,
    pub library_paths: Vec<PathBuf>,
    /// Library names without prefix or suffix, e.g. `SDL2`
    pub libraries: Vec<String>,
    pub opt_level: OptLevel,
    pub debug: bool,
    pub m32: bool,
    pub extra_args: Vec<String>,
}
