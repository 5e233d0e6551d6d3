//! GCC backend

use super::{BackendKind, CompilerBackend, CompilerCommand};
use crate::error::{BuildError, BuildResult};
use crate::options::{CompileOptions, LinkOptions, OptLevel};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct GccBackend {
    compiler: PathBuf,
}

impl GccBackend {
    pub fn new(compiler: impl Into<PathBuf>) -> Self {
        Self {
            compiler: compiler.into(),
        }
    }

    fn program(&self) -> String {
        self.compiler.to_string_lossy().into_owned()
    }
}

fn opt_flag(level: OptLevel) -> &'static str {
    match level {
        OptLevel::O1 => "-O1",
        OptLevel::O2 => "-O2",
        OptLevel::O3 => "-O3",
    }
}

impl CompilerBackend for GccBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gcc
    }

    fn object_extension(&self) -> &'static str {
        "o"
    }

    fn compile_command(&self, sources: &[PathBuf], options: &CompileOptions) -> CompilerCommand {
        let mut command = CompilerCommand::new(self.program())
            .arg("-c")
            .args(sources.iter().map(|s| s.to_string_lossy().into_owned()))
            .args(
                options
                    .include_paths
                    .iter()
                    .map(|p| format!("-I{}", p.display())),
            );

        command = if options.debug {
            command.arg("-g")
        } else {
            command.arg(opt_flag(options.opt_level))
        };
        if options.warnings {
            command = command.arg("-Wall");
        }
        if options.native_arch {
            command = command.arg("-march=native");
        }
        if options.m32 {
            command = command.arg("-m32");
        }

        command
            .args(options.extra_args.iter().cloned())
            .args(options.defines.iter().map(|d| format!("-D{d}")))
    }

    fn link_command(&self, objects: &[PathBuf], options: &LinkOptions) -> CompilerCommand {
        let mut command = CompilerCommand::new(self.program())
            .arg("-o")
            .arg(options.output.to_string_lossy().into_owned())
            .args(objects.iter().map(|o| o.to_string_lossy().into_owned()))
            .args(
                options
                    .library_paths
                    .iter()
                    .map(|p| format!("-L{}", p.display())),
            )
            .args(options.libraries.iter().map(|l| format!("-l{l}")));

        if options.m32 {
            command = command.arg("-m32");
        }
        command.args(options.extra_args.iter().cloned())
    }

    fn archive_command(&self, objects: &[PathBuf], options: &LinkOptions) -> CompilerCommand {
        CompilerCommand::new("ar")
            .arg("rcs")
            .arg(options.output.to_string_lossy().into_owned())
            .args(objects.iter().map(|o| o.to_string_lossy().into_owned()))
    }

    fn version(&self) -> BuildResult<String> {
        let command = CompilerCommand::new(self.program()).args(["-dumpfullversion", "-dumpversion"]);
        let cwd = std::env::temp_dir();
        command.output(&cwd).ok_or_else(|| {
            BuildError::ToolingNotFound(format!("could not query version of {}", command.program))
        })
    }

    fn worker_dir(&self, _work_dir: &Path, staging: &Path) -> PathBuf {
        staging.to_path_buf()
    }

    fn relocate_objects(&self, _work_dir: &Path, _staging: &Path) -> BuildResult<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}
