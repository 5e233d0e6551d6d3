//! `nova examples`: build the demos against SDL2 and run them

use super::{deps, require_file, Session};
use anyhow::{Context, Result};
use nova_build::{ArtifactKind, BackendKind, BuildRequest, Flow};
use std::fs;
use std::path::{Path, PathBuf};

const SDL_LIBRARIES: &[&str] = &["SDL2main", "SDL2", "SDL2_ttf"];
const SDL_PACKAGES: &[&str] = &["SDL2", "SDL2_ttf"];

pub fn run(session: &Session) -> Result<i32> {
    let source = session.paths.examples.join("example.c");
    require_file(&source, "Example entry point")?;

    deps::ensure(session)?;

    let builder = session.builder()?;
    let backend = builder.backend().kind();
    let mut request = session.request(
        Flow::Examples,
        backend,
        ArtifactKind::Executable,
        vec![source],
    )?;
    link_sdl(session, backend, &mut request);

    let outcome = session.build(&builder, &request)?;

    if session.platform.is_windows() {
        let bin_dir = session.paths.deps.join(bin_dir_name(session));
        for package in SDL_PACKAGES {
            let from = bin_dir.join(package_dir(package, backend));
            copy_dlls(&from, &session.paths.build)?;
        }
    }

    session.run_program(&outcome.artifact, "example demos")
}

/// SDL2 headers, libraries and MSVC specifics
fn link_sdl(session: &Session, backend: BackendKind, request: &mut BuildRequest) {
    let deps = &session.paths.deps;
    request.compile.include_paths.push(deps.join("include"));

    let lib_dir = deps.join(lib_dir_name(session));
    request.link.library_paths.extend(
        SDL_PACKAGES
            .iter()
            .map(|package| lib_dir.join(package_dir(package, backend))),
    );

    let mut libraries: Vec<String> = Vec::new();
    if session.platform.is_windows() && backend == BackendKind::Gcc {
        libraries.push("mingw32".to_string());
    }
    libraries.extend(SDL_LIBRARIES.iter().map(|l| l.to_string()));
    libraries.append(&mut request.link.libraries);
    request.link.libraries = libraries;

    if backend == BackendKind::Msvc {
        request
            .compile
            .defines
            .extend(["SDL_MAIN_HANDLED".to_string(), "_CRT_SECURE_NO_WARNINGS".to_string()]);
        request.link.extra_args.push("/SUBSYSTEM:CONSOLE".to_string());
    }
}

/// MSVC builds use the `-MSVC` flavour of each package
fn package_dir(package: &str, backend: BackendKind) -> String {
    match backend {
        BackendKind::Gcc => package.to_string(),
        BackendKind::Msvc => format!("{package}-MSVC"),
    }
}

fn lib_dir_name(session: &Session) -> &'static str {
    if session.settings.features.m32 {
        "lib-x86"
    } else {
        session.platform.lib_dir_name()
    }
}

fn bin_dir_name(session: &Session) -> &'static str {
    if session.settings.features.m32 {
        "bin-x86"
    } else {
        session.platform.bin_dir_name()
    }
}

/// Copy every `*.dll` directly inside `from` into `to`
fn copy_dlls(from: &Path, to: &Path) -> Result<Vec<PathBuf>> {
    let mut copied = Vec::new();
    let entries =
        fs::read_dir(from).with_context(|| format!("Failed to read {}", from.display()))?;

    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read {}", from.display()))?
            .path();
        let is_dll = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("dll"));
        if !is_dll || !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name() {
            let target = to.join(name);
            fs::copy(&path, &target)
                .with_context(|| format!("Failed to copy {}", path.display()))?;
            copied.push(target);
        }
    }

    copied.sort();
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_package_dir() {
        assert_eq!(package_dir("SDL2", BackendKind::Gcc), "SDL2");
        assert_eq!(package_dir("SDL2_ttf", BackendKind::Msvc), "SDL2_ttf-MSVC");
    }

    #[test]
    fn test_copy_dlls_only_copies_dlls() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("bin-x64/SDL2");
        let to = dir.path().join("build");
        fs::create_dir_all(&from).unwrap();
        fs::create_dir_all(&to).unwrap();
        fs::write(from.join("SDL2.dll"), "dll").unwrap();
        fs::write(from.join("README-SDL.txt"), "txt").unwrap();
        fs::write(from.join("libfreetype-6.DLL"), "dll").unwrap();

        let copied = copy_dlls(&from, &to).unwrap();

        assert_eq!(copied, vec![to.join("SDL2.dll"), to.join("libfreetype-6.DLL")]);
        assert!(!to.join("README-SDL.txt").exists());
    }

    #[test]
    fn test_copy_dlls_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        assert!(copy_dlls(&dir.path().join("nope"), dir.path()).is_err());
    }
}
