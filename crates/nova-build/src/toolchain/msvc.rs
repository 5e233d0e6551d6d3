//! MSVC backend
//!
//! `cl.exe`, `link.exe` and `lib.exe` only work inside a developer
//! environment, so every command is chained after `VsDevCmd.bat`. `cl.exe`
//! writes objects into its working directory; they are moved to staging by
//! [`CompilerBackend::relocate_objects`].

use super::{BackendKind, CompilerBackend, CompilerCommand, EnvScript};
use crate::error::{BuildError, BuildResult};
use crate::options::{CompileOptions, LinkOptions, OptLevel};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MsvcBackend {
    dev_prompt: PathBuf,
    m32: bool,
}

impl MsvcBackend {
    pub fn new(dev_prompt: impl Into<PathBuf>, m32: bool) -> Self {
        Self {
            dev_prompt: dev_prompt.into(),
            m32,
        }
    }

    fn env_script(&self) -> EnvScript {
        let arch = if self.m32 { "-arch=x86" } else { "-arch=x64" };
        EnvScript {
            path: self.dev_prompt.clone(),
            args: vec![arch.to_string(), "-no_logo".to_string()],
        }
    }

    fn tool(&self, program: &str) -> CompilerCommand {
        CompilerCommand::new(program).with_env_script(self.env_script())
    }
}

fn opt_flags(level: OptLevel) -> &'static [&'static str] {
    match level {
        OptLevel::O1 => &["/O1"],
        OptLevel::O2 => &["/O2"],
        // Whole program optimization; the linker needs /LTCG to match.
        OptLevel::O3 => &["/Ox", "/GL"],
    }
}

/// Year of the Visual Studio install the prompt belongs to
pub fn version_from_prompt(dev_prompt: &Path) -> Option<&'static str> {
    let text = dev_prompt.to_string_lossy();
    ["2022", "2019", "2017", "2015"]
        .into_iter()
        .find(|year| text.contains(year))
}

fn lib_name(library: &str) -> String {
    if library.to_lowercase().ends_with(".lib") {
        library.to_string()
    } else {
        format!("{library}.lib")
    }
}

impl CompilerBackend for MsvcBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Msvc
    }

    fn object_extension(&self) -> &'static str {
        "obj"
    }

    fn compile_command(&self, sources: &[PathBuf], options: &CompileOptions) -> CompilerCommand {
        let mut command = self
            .tool("cl.exe")
            .args(["/nologo", "/c"])
            .args(sources.iter().map(|s| s.to_string_lossy().into_owned()))
            .args(
                options
                    .include_paths
                    .iter()
                    .map(|p| format!("/I{}", p.display())),
            );

        command = if options.debug {
            command.arg("/Zi")
        } else {
            command.args(opt_flags(options.opt_level).iter().copied())
        };
        if options.warnings {
            command = command.arg("/W3");
        }
        if options.native_arch {
            command = command.arg("/arch:AVX");
        }

        command
            .args(options.extra_args.iter().cloned())
            .args(options.defines.iter().map(|d| format!("/D{d}")))
    }

    fn link_command(&self, objects: &[PathBuf], options: &LinkOptions) -> CompilerCommand {
        let mut command = self
            .tool("link.exe")
            .arg("/NOLOGO")
            .arg(format!("/OUT:{}", options.output.display()))
            .args(objects.iter().map(|o| o.to_string_lossy().into_owned()))
            .args(
                options
                    .library_paths
                    .iter()
                    .map(|p| format!("/LIBPATH:{}", p.display())),
            )
            .args(options.libraries.iter().map(|l| lib_name(l)));

        if options.debug {
            command = command.arg("/DEBUG");
        } else if options.opt_level == OptLevel::O3 {
            command = command.arg("/LTCG");
        }
        command.args(options.extra_args.iter().cloned())
    }

    fn archive_command(&self, objects: &[PathBuf], options: &LinkOptions) -> CompilerCommand {
        let mut command = self
            .tool("lib.exe")
            .arg("/NOLOGO")
            .arg(format!("/OUT:{}", options.output.display()))
            .args(objects.iter().map(|o| o.to_string_lossy().into_owned()));

        // Objects built with /GL can only be archived with /LTCG.
        if !options.debug && options.opt_level == OptLevel::O3 {
            command = command.arg("/LTCG");
        }
        command
    }

    fn version(&self) -> BuildResult<String> {
        version_from_prompt(&self.dev_prompt)
            .map(str::to_string)
            .ok_or_else(|| {
                BuildError::ToolingNotFound(format!(
                    "cannot tell Visual Studio version from {}",
                    self.dev_prompt.display()
                ))
            })
    }

    fn worker_dir(&self, work_dir: &Path, _staging: &Path) -> PathBuf {
        work_dir.to_path_buf()
    }

    fn relocate_objects(&self, work_dir: &Path, staging: &Path) -> BuildResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(work_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BuildError::io(work_dir, e)),
        };

        let mut moved = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| BuildError::io(work_dir, e))?.path();
            let is_object = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(self.object_extension());
            if !is_object {
                continue;
            }

            let Some(name) = path.file_name() else {
                continue;
            };
            let target = staging.join(name);
            fs::rename(&path, &target).map_err(|e| BuildError::io(&path, e))?;
            moved.push(target);
        }

        moved.sort();
        tracing::debug!(count = moved.len(), "relocated MSVC objects");
        Ok(moved)
    }
}
