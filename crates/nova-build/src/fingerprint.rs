//! Build configuration fingerprint
//!
//! Persisted next to the source cache. A mismatch with the previous run's
//! fingerprint invalidates every cached entry and object file.

use crate::options::{FeatureToggles, OptLevel};
use crate::toolchain::BackendKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the current invocation links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    /// Static library
    Build,
    Examples,
    Bench,
    Tests,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Build => "build",
            Self::Examples => "examples",
            Self::Bench => "bench",
            Self::Tests => "tests",
        };
        f.write_str(name)
    }
}

/// Build-affecting flags, compared structurally across runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildFingerprint {
    pub backend: BackendKind,
    pub debug: bool,
    #[serde(default)]
    pub opt_level: OptLevel,
    #[serde(default)]
    pub features: FeatureToggles,
    #[serde(default = "default_flow")]
    pub flow: Flow,
    /// User preprocessor defines, sorted
    #[serde(default)]
    pub defines: Vec<String>,
}

fn default_flow() -> Flow {
    Flow::Build
}

impl BuildFingerprint {
    pub fn new(backend: BackendKind, debug: bool) -> Self {
        Self {
            backend,
            debug,
            opt_level: OptLevel::default(),
            features: FeatureToggles::default(),
            flow: Flow::Build,
            defines: Vec::new(),
        }
    }

    pub fn with_opt_level(mut self, opt_level: OptLevel) -> Self {
        self.opt_level = opt_level;
        self
    }

    pub fn with_features(mut self, features: FeatureToggles) -> Self {
        self.features = features;
        self
    }

    pub fn with_flow(mut self, flow: Flow) -> Self {
        self.flow = flow;
        self
    }

    pub fn with_defines(mut self, defines: impl IntoIterator<Item = String>) -> Self {
        let mut defines: Vec<String> = defines.into_iter().collect();
        defines.sort();
        defines.dedup();
        self.defines = defines;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_debug_flag_changes_fingerprint() {
        let release = BuildFingerprint::new(BackendKind::Gcc, false);
        let debug = BuildFingerprint::new(BackendKind::Gcc, true);
        assert_ne!(release, debug);
    }

    #[test]
    fn test_defines_change_fingerprint() {
        let plain = BuildFingerprint::new(BackendKind::Gcc, false);
        let defined = plain.clone().with_defines(["NV_USE_FLOAT".to_string()]);
        assert_ne!(plain, defined);
    }

    #[test]
    fn test_define_order_does_not_matter() {
        let a = BuildFingerprint::new(BackendKind::Gcc, false)
            .with_defines(["B=2".to_string(), "A".to_string()]);
        let b = BuildFingerprint::new(BackendKind::Gcc, false)
            .with_defines(["A".to_string(), "B=2".to_string(), "A".to_string()]);
        assert_eq!(a, b);
        assert_eq!(a.defines, vec!["A", "B=2"]);
    }

    #[test]
    fn test_fingerprint_json_shape() {
        let fingerprint = BuildFingerprint::new(BackendKind::Msvc, false).with_flow(Flow::Tests);
        let value = serde_json::to_value(&fingerprint).unwrap();
        assert_eq!(value["backend"], "msvc");
        assert_eq!(value["debug"], false);
        assert_eq!(value["opt_level"], 3);
        assert_eq!(value["flow"], "tests");
        assert_eq!(value["features"]["simd"], true);
    }

    #[test]
    fn test_minimal_record_fills_defaults() {
        let parsed: BuildFingerprint =
            serde_json::from_str(r#"{"backend":"gcc","debug":false}"#).unwrap();
        assert_eq!(parsed, BuildFingerprint::new(BackendKind::Gcc, false));
    }
}
