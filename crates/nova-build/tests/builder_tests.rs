//! End-to-end builder tests against a shell-script compiler
#![cfg(unix)]

use nova_build::{
    ArtifactKind, BackendKind, BuildError, BuildFingerprint, BuildRequest, BuildResult, Builder,
    CompileOptions, CompilerBackend, CompilerCommand, Flow, LinkOptions,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Backend whose "compiler" touches one `.o` per source and logs each source
struct FakeBackend {
    log: PathBuf,
    fail_link: bool,
}

const COMPILE_SCRIPT: &str = r#"log="$1"; shift
for f in "$@"; do
  echo "$f" >> "$log"
  grep -q BROKEN "$f" && exit 2
  b=$(basename "$f")
  : > "${b%.*}.o"
done"#;

/// Writes the sorted object names it was given into the artifact
const LINK_SCRIPT: &str = r#"out="$0"
for o in "$@"; do basename "$o"; done | sort > "$out""#;

impl CompilerBackend for FakeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gcc
    }

    fn object_extension(&self) -> &'static str {
        "o"
    }

    fn compile_command(&self, sources: &[PathBuf], _options: &CompileOptions) -> CompilerCommand {
        CompilerCommand::new("sh")
            .args(["-c", COMPILE_SCRIPT, "fakecc"])
            .arg(self.log.to_string_lossy().into_owned())
            .args(sources.iter().map(|s| s.to_string_lossy().into_owned()))
    }

    fn link_command(&self, objects: &[PathBuf], options: &LinkOptions) -> CompilerCommand {
        let script = if self.fail_link { "exit 1" } else { LINK_SCRIPT };
        CompilerCommand::new("sh")
            .args(["-c", script])
            .arg(options.output.to_string_lossy().into_owned())
            .args(objects.iter().map(|o| o.to_string_lossy().into_owned()))
    }

    fn archive_command(&self, objects: &[PathBuf], options: &LinkOptions) -> CompilerCommand {
        CompilerCommand::new("sh")
            .args(["-c", LINK_SCRIPT])
            .arg(options.output.to_string_lossy().into_owned())
            .args(objects.iter().map(|o| o.to_string_lossy().into_owned()))
    }

    fn version(&self) -> BuildResult<String> {
        Ok("0.0.0".to_string())
    }

    fn worker_dir(&self, _work_dir: &Path, staging: &Path) -> PathBuf {
        staging.to_path_buf()
    }

    fn relocate_objects(&self, _work_dir: &Path, _staging: &Path) -> BuildResult<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

struct Project {
    dir: TempDir,
}

impl Project {
    fn new(files: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        for name in files {
            fs::write(dir.path().join("src").join(name), "int x;\n").unwrap();
        }
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn source(&self, name: &str) -> PathBuf {
        self.root().join("src").join(name)
    }

    fn log(&self) -> PathBuf {
        self.root().join("compile.log")
    }

    fn compiled(&self) -> Vec<String> {
        let log = fs::read_to_string(self.log()).unwrap_or_default();
        let _ = fs::remove_file(self.log());
        let mut names: Vec<String> = log
            .lines()
            .map(|l| Path::new(l).file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn builder(&self, fail_link: bool) -> Builder {
        Builder::new(Box::new(FakeBackend {
            log: self.log(),
            fail_link,
        }))
        .with_build_dir(self.root().join("build"))
        .with_cache_dir(self.root().join("cache"))
        .with_jobs(2)
    }

    fn linked(&self, artifact: &Path) -> Vec<String> {
        fs::read_to_string(artifact)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn request(&self, kind: ArtifactKind, debug: bool) -> BuildRequest {
        let sources = nova_build::discover_sources(&self.root().join("src")).unwrap();
        BuildRequest {
            sources,
            compile: CompileOptions::default(),
            link: LinkOptions::default(),
            artifact_name: "nova".to_string(),
            artifact_kind: kind,
            fingerprint: BuildFingerprint::new(BackendKind::Gcc, debug),
        }
    }
}

fn bump_mtime(path: &Path) {
    let later = SystemTime::now() + Duration::from_secs(120);
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(later)
        .unwrap();
}

#[test]
fn test_first_build_compiles_everything_and_archives() {
    let project = Project::new(&["body.c", "space.c", "world.c"]);
    let request = project.request(ArtifactKind::StaticLibrary, false);

    let outcome = project.builder(false).build(&request).unwrap();

    assert_eq!(outcome.compiled, 3);
    assert_eq!(outcome.total_sources, 3);
    assert!(outcome.stale);
    assert_eq!(outcome.jobs, 2);
    assert_eq!(outcome.objects.len(), 3);
    assert_eq!(outcome.artifact, project.root().join("build").join("libnova.a"));
    assert!(outcome.artifact.exists());
    assert_eq!(project.compiled(), vec!["body.c", "space.c", "world.c"]);
}

#[test]
fn test_second_build_is_a_no_op() {
    let project = Project::new(&["body.c", "space.c", "world.c"]);
    let request = project.request(ArtifactKind::StaticLibrary, false);
    let builder = project.builder(false);

    builder.build(&request).unwrap();
    project.compiled();

    let outcome = builder.build(&request).unwrap();
    assert_eq!(outcome.compiled, 0);
    assert!(!outcome.stale);
    assert_eq!(outcome.jobs, 0);
    assert_eq!(outcome.objects.len(), 3);
    assert!(outcome.artifact.exists());
    assert!(project.compiled().is_empty());
}

#[test]
fn test_config_drift_rebuilds_everything() {
    let project = Project::new(&["body.c", "space.c"]);
    let builder = project.builder(false);

    builder
        .build(&project.request(ArtifactKind::StaticLibrary, false))
        .unwrap();
    project.compiled();

    let outcome = builder
        .build(&project.request(ArtifactKind::StaticLibrary, true))
        .unwrap();
    assert!(outcome.stale);
    assert_eq!(outcome.compiled, 2);
    assert_eq!(project.compiled(), vec!["body.c", "space.c"]);
}

#[test]
fn test_flow_change_rebuilds_everything() {
    let project = Project::new(&["body.c"]);
    let builder = project.builder(false);

    let mut request = project.request(ArtifactKind::StaticLibrary, false);
    builder.build(&request).unwrap();

    request.artifact_kind = ArtifactKind::Executable;
    request.fingerprint = request.fingerprint.clone().with_flow(Flow::Examples);
    let outcome = builder.build(&request).unwrap();

    assert!(outcome.stale);
    assert_eq!(outcome.compiled, 1);
    assert_eq!(outcome.artifact, project.root().join("build").join("nova"));
}

#[test]
fn test_touching_one_file_recompiles_only_that_file() {
    let project = Project::new(&["body.c", "space.c", "world.c"]);
    let request = project.request(ArtifactKind::StaticLibrary, false);
    let builder = project.builder(false);

    builder.build(&request).unwrap();
    project.compiled();

    bump_mtime(&project.source("space.c"));

    let outcome = builder.build(&request).unwrap();
    assert_eq!(outcome.compiled, 1);
    assert_eq!(outcome.objects.len(), 3);
    assert_eq!(project.compiled(), vec!["space.c"]);
}

#[test]
fn test_compile_failure_is_fatal_but_cache_is_committed() {
    let project = Project::new(&["body.c", "space.c"]);
    fs::write(project.source("space.c"), "BROKEN\n").unwrap();
    let request = project.request(ArtifactKind::StaticLibrary, false);
    let builder = project.builder(false);

    let err = builder.build(&request).unwrap_err();
    match &err {
        BuildError::CompileFailed { exit_code, command } => {
            assert_eq!(*exit_code, 2);
            assert!(command.contains("space.c"));
        }
        other => panic!("expected CompileFailed, got {other:?}"),
    }
    assert!(!project.root().join("build").join("libnova.a").exists());

    // The attempt was recorded, so an unchanged retry compiles nothing.
    project.compiled();
    let outcome = builder.build(&request).unwrap();
    assert_eq!(outcome.compiled, 0);
}

#[test]
fn test_link_failure_reports_command_and_code() {
    let project = Project::new(&["body.c"]);
    let request = project.request(ArtifactKind::Executable, false);

    let err = project.builder(true).build(&request).unwrap_err();
    assert!(matches!(err, BuildError::LinkFailed { exit_code: 1, .. }));
    assert_eq!(err.tool_exit_code(), Some(1));
}

#[test]
fn test_build_dir_is_recreated() {
    let project = Project::new(&["body.c"]);
    let stale = project.root().join("build").join("old.txt");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "x").unwrap();

    project
        .builder(false)
        .build(&project.request(ArtifactKind::StaticLibrary, false))
        .unwrap();
    assert!(!stale.exists());
}

#[test]
fn test_colliding_object_names_rejected() {
    let project = Project::new(&["math.c"]);
    let extra = project.root().join("extra");
    fs::create_dir_all(&extra).unwrap();
    fs::write(extra.join("math.cpp"), "").unwrap();

    let mut request = project.request(ArtifactKind::Executable, false);
    request.sources.push(extra.join("math.cpp"));

    assert!(matches!(
        project.builder(false).build(&request),
        Err(BuildError::ObjectNameCollision { .. })
    ));
}

#[test]
fn test_switching_benchmarks_links_only_the_current_one() {
    let project = Project::new(&["body.c", "space.c"]);
    let benchmarks = project.root().join("benchmarks");
    fs::create_dir_all(&benchmarks).unwrap();
    fs::write(benchmarks.join("boxes.c"), "int main;\n").unwrap();
    fs::write(benchmarks.join("pyramid.c"), "int main;\n").unwrap();
    let builder = project.builder(false);

    let bench = |name: &str| {
        let mut request = project.request(ArtifactKind::Executable, false);
        request.sources.insert(0, benchmarks.join(name));
        request.fingerprint = request.fingerprint.clone().with_flow(Flow::Bench);
        request
    };

    builder.build(&bench("boxes.c")).unwrap();
    project.compiled();

    let outcome = builder.build(&bench("pyramid.c")).unwrap();
    assert!(!outcome.stale);
    assert_eq!(project.compiled(), vec!["pyramid.c"]);
    assert_eq!(project.linked(&outcome.artifact), vec!["body.o", "pyramid.o", "space.o"]);
    assert_eq!(outcome.objects.len(), 3);

    // Going back needs no compilation and still leaves pyramid out.
    let outcome = builder.build(&bench("boxes.c")).unwrap();
    assert_eq!(outcome.compiled, 0);
    assert_eq!(project.linked(&outcome.artifact), vec!["body.o", "boxes.o", "space.o"]);
}

#[test]
fn test_removed_source_is_not_linked() {
    let project = Project::new(&["body.c", "space.c"]);
    let builder = project.builder(false);

    builder
        .build(&project.request(ArtifactKind::StaticLibrary, false))
        .unwrap();
    fs::remove_file(project.source("space.c")).unwrap();

    let outcome = builder
        .build(&project.request(ArtifactKind::StaticLibrary, false))
        .unwrap();
    assert_eq!(project.linked(&outcome.artifact), vec!["body.o"]);
}

#[test]
fn test_define_change_rebuilds_everything() {
    let project = Project::new(&["body.c", "space.c"]);
    let builder = project.builder(false);

    builder
        .build(&project.request(ArtifactKind::StaticLibrary, false))
        .unwrap();
    project.compiled();

    let mut request = project.request(ArtifactKind::StaticLibrary, false);
    request.compile.defines.push("NV_USE_FLOAT".to_string());
    request.fingerprint = request
        .fingerprint
        .clone()
        .with_defines(["NV_USE_FLOAT".to_string()]);
    let outcome = builder.build(&request).unwrap();

    assert!(outcome.stale);
    assert_eq!(outcome.compiled, 2);
    assert_eq!(project.compiled(), vec!["body.c", "space.c"]);

    let outcome = builder.build(&request).unwrap();
    assert!(!outcome.stale);
    assert_eq!(outcome.compiled, 0);
}
