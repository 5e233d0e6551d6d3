use super::{BackendKind, CompilerCommand};
use crate::error::BuildResult;
use crate::options::{CompileOptions, LinkOptions};
use std::path::{Path, PathBuf};

/// Uniform interface over compiler families
///
/// Implementations only render command lines. Running them and judging exit
/// codes is left to the scheduler and the builder.
pub trait CompilerBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Extension of produced object files, without the dot
    fn object_extension(&self) -> &'static str;

    /// Compile `sources` to objects in the working directory, without linking
    fn compile_command(&self, sources: &[PathBuf], options: &CompileOptions) -> CompilerCommand;

    /// Link objects into an executable
    fn link_command(&self, objects: &[PathBuf], options: &LinkOptions) -> CompilerCommand;

    /// Bundle objects into the static library at `options.output`
    ///
    /// Only the output and the optimization settings of `options` apply.
    fn archive_command(&self, objects: &[PathBuf], options: &LinkOptions) -> CompilerCommand;

    /// Compiler version string
    fn version(&self) -> BuildResult<String>;

    /// Directory compile workers run in
    ///
    /// Objects land in this directory.
    fn worker_dir(&self, work_dir: &Path, staging: &Path) -> PathBuf;

    /// Move freshly produced objects from the worker directory into staging
    ///
    /// Returns the moved objects.
    fn relocate_objects(&self, work_dir: &Path, staging: &Path) -> BuildResult<Vec<PathBuf>>;
}
