//! The dependency table and presence checks

use crate::descriptor::{Component, ComponentKind, Condition, DependencyDescriptor};
use crate::{DepsError, DepsResult};
use std::path::{Path, PathBuf};

pub const SDL2_VERSION: &str = "2.28.5";
pub const SDL2_TTF_VERSION: &str = "2.20.2";

/// Dependencies rooted at a local `deps/` directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTable {
    root: PathBuf,
    dependencies: Vec<DependencyDescriptor>,
}

impl DependencyTable {
    /// Table from explicit descriptors
    ///
    /// Components whose condition does not hold on this host start satisfied.
    pub fn new(root: impl Into<PathBuf>, windows: bool, dependencies: Vec<DependencyDescriptor>) -> Self {
        let mut dependencies = dependencies;
        for dep in &mut dependencies {
            for component in &mut dep.components {
                if !component.condition.holds(windows) {
                    component.satisfied = true;
                }
            }
        }

        Self {
            root: root.into(),
            dependencies,
        }
    }

    /// SDL2 and SDL2_ttf, as mingw and Visual C++ devel packages
    pub fn builtin(root: impl Into<PathBuf>, windows: bool) -> Self {
        Self::new(root, windows, builtin_dependencies())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dependencies(&self) -> &[DependencyDescriptor] {
        &self.dependencies
    }

    pub(crate) fn dependencies_mut(&mut self) -> &mut [DependencyDescriptor] {
        &mut self.dependencies
    }

    pub fn get(&self, name: &str) -> Option<&DependencyDescriptor> {
        self.dependencies.iter().find(|d| d.name == name)
    }

    /// Absolute destination of a component
    pub fn target_path(&self, component: &Component) -> PathBuf {
        self.root.join(&component.target)
    }

    /// Per-dependency temporary extraction directory
    pub fn temp_dir(&self, dependency: &str) -> PathBuf {
        self.root.join(format!("_{dependency}"))
    }

    /// Mark components whose target already exists as satisfied
    ///
    /// Never marks anything unsatisfied.
    pub fn check(&mut self) {
        let root = self.root.clone();
        for dep in &mut self.dependencies {
            for component in &mut dep.components {
                if !component.satisfied && root.join(&component.target).exists() {
                    component.satisfied = true;
                }
            }
        }
    }

    /// Count unsatisfied components, across the table or for one dependency
    pub fn missing(&self, name: Option<&str>) -> usize {
        self.dependencies
            .iter()
            .filter(|d| name.map_or(true, |n| d.name == n))
            .map(DependencyDescriptor::missing)
            .sum()
    }

    /// Like [`missing`](Self::missing) but rejects unknown names
    pub fn missing_for(&self, name: &str) -> DepsResult<usize> {
        self.get(name)
            .map(DependencyDescriptor::missing)
            .ok_or_else(|| DepsError::UnknownDependency(name.to_string()))
    }
}

fn component(kind: ComponentKind, target: String, archive_path: String) -> Component {
    let condition = match kind {
        ComponentKind::Include => Condition::Always,
        _ => Condition::WindowsOnly,
    };
    Component::new(kind, target, archive_path, condition)
}

/// Package laid out like the mingw devel tarballs
fn mingw_package(name: &str, version: &str, url: String) -> DependencyDescriptor {
    let base = format!("{name}-{version}");
    DependencyDescriptor::new(name, version, url)
        .with_component(component(
            ComponentKind::Include,
            "include/SDL2".to_string(),
            format!("{base}/x86_64-w64-mingw32/include/SDL2"),
        ))
        .with_component(component(
            ComponentKind::LibX64,
            format!("lib-x64/{name}"),
            format!("{base}/x86_64-w64-mingw32/lib"),
        ))
        .with_component(component(
            ComponentKind::LibX86,
            format!("lib-x86/{name}"),
            format!("{base}/i686-w64-mingw32/lib"),
        ))
        .with_component(component(
            ComponentKind::BinX64,
            format!("bin-x64/{name}"),
            format!("{base}/x86_64-w64-mingw32/bin"),
        ))
        .with_component(component(
            ComponentKind::BinX86,
            format!("bin-x86/{name}"),
            format!("{base}/i686-w64-mingw32/bin"),
        ))
}

/// Package laid out like the Visual C++ devel zips; headers only on Windows
fn msvc_package(name: &str, version: &str, url: String) -> DependencyDescriptor {
    let base = format!("{name}-{version}");
    let dep_name = format!("{name}-MSVC");
    let include = Component::new(
        ComponentKind::Include,
        "include/SDL2-MSVC",
        format!("{base}/include"),
        Condition::WindowsOnly,
    );

    DependencyDescriptor::new(dep_name.clone(), version, url)
        .with_component(include)
        .with_component(component(
            ComponentKind::LibX64,
            format!("lib-x64/{dep_name}"),
            format!("{base}/lib/x64"),
        ))
        .with_component(component(
            ComponentKind::LibX86,
            format!("lib-x86/{dep_name}"),
            format!("{base}/lib/x86"),
        ))
        .with_component(component(
            ComponentKind::BinX64,
            format!("bin-x64/{dep_name}"),
            format!("{base}/lib/x64"),
        ))
        .with_component(component(
            ComponentKind::BinX86,
            format!("bin-x86/{dep_name}"),
            format!("{base}/lib/x86"),
        ))
}

fn builtin_dependencies() -> Vec<DependencyDescriptor> {
    let sdl = format!("https://github.com/libsdl-org/SDL/releases/download/release-{SDL2_VERSION}");
    let ttf = format!(
        "https://github.com/libsdl-org/SDL_ttf/releases/download/release-{SDL2_TTF_VERSION}"
    );

    vec![
        mingw_package(
            "SDL2",
            SDL2_VERSION,
            format!("{sdl}/SDL2-devel-{SDL2_VERSION}-mingw.tar.gz"),
        ),
        msvc_package(
            "SDL2",
            SDL2_VERSION,
            format!("{sdl}/SDL2-devel-{SDL2_VERSION}-VC.zip"),
        ),
        mingw_package(
            "SDL2_ttf",
            SDL2_TTF_VERSION,
            format!("{ttf}/SDL2_ttf-devel-{SDL2_TTF_VERSION}-mingw.tar.gz"),
        ),
        msvc_package(
            "SDL2_ttf",
            SDL2_TTF_VERSION,
            format!("{ttf}/SDL2_ttf-devel-{SDL2_TTF_VERSION}-VC.zip"),
        ),
    ]
}
