//! `nova bench <name>`: build and run one benchmark program

use super::{require_file, Session};
use anyhow::Result;
use nova_build::{ArtifactKind, Flow};
use std::path::PathBuf;

pub fn run(session: &Session, name: &str) -> Result<i32> {
    let source = benchmark_path(&session.paths.benchmarks, name);
    require_file(&source, "Benchmark file")?;

    let builder = session.builder()?;
    let request = session.request(
        Flow::Bench,
        builder.backend().kind(),
        ArtifactKind::Executable,
        vec![source],
    )?;
    let outcome = session.build(&builder, &request)?;
    session.run_program(&outcome.artifact, "benchmark")
}

/// `boxes` and `boxes.c` both name `benchmarks/boxes.c`
fn benchmark_path(dir: &std::path::Path, name: &str) -> PathBuf {
    if name.ends_with(".c") {
        dir.join(name)
    } else {
        dir.join(format!("{name}.c"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_benchmark_path() {
        let dir = Path::new("benchmarks");
        assert_eq!(benchmark_path(dir, "boxes"), dir.join("boxes.c"));
        assert_eq!(benchmark_path(dir, "boxes.c"), dir.join("boxes.c"));
    }
}
