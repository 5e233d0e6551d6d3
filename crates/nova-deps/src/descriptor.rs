//! Dependency descriptors

use std::fmt;
use std::path::PathBuf;

/// One deliverable of a devel package
///
/// Declaration order is the extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    Include,
    LibX64,
    LibX86,
    BinX64,
    BinX86,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 5] = [
        Self::Include,
        Self::LibX64,
        Self::LibX86,
        Self::BinX64,
        Self::BinX86,
    ];

    /// Directory under `deps/` holding this kind of component
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::LibX64 => "lib-x64",
            Self::LibX86 => "lib-x86",
            Self::BinX64 => "bin-x64",
            Self::BinX86 => "bin-x86",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Host condition under which a component is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    /// Import libraries and DLLs are only needed on Windows
    WindowsOnly,
}

impl Condition {
    pub fn holds(&self, windows: bool) -> bool {
        match self {
            Self::Always => true,
            Self::WindowsOnly => windows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub kind: ComponentKind,
    /// Destination, relative to the deps root
    pub target: PathBuf,
    /// Subtree inside the extracted archive, `/` separated
    pub archive_path: String,
    pub condition: Condition,
    /// Recomputed every run, never persisted
    pub satisfied: bool,
}

impl Component {
    pub fn new(
        kind: ComponentKind,
        target: impl Into<PathBuf>,
        archive_path: impl Into<String>,
        condition: Condition,
    ) -> Self {
        Self {
            kind,
            target: target.into(),
            archive_path: archive_path.into(),
            condition,
            satisfied: false,
        }
    }
}

/// A downloadable devel package and the components taken from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDescriptor {
    pub name: String,
    pub version: String,
    pub url: String,
    /// Expected SHA-256 of the archive, lowercase hex
    pub sha256: Option<String>,
    pub components: Vec<Component>,
}

impl DependencyDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            url: url.into(),
            sha256: None,
            components: Vec::new(),
        }
    }

    /// Add a component, keeping extraction order
    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self.components.sort_by_key(|c| c.kind);
        self
    }

    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into().to_lowercase());
        self
    }

    pub fn component(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.iter().find(|c| c.kind == kind)
    }

    /// Number of unsatisfied components
    pub fn missing(&self) -> usize {
        self.components.iter().filter(|c| !c.satisfied).count()
    }
}
