//! Running built artifacts and classifying how they exited

use crate::error::{BuildError, BuildResult};
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Exit codes that usually mean the program crashed
///
/// `3221225477` is Windows' access violation (0xC0000005), 11/-11 SIGSEGV,
/// 134 abort and 139 a segfault reported through a shell.
pub const CRASH_CODES: &[i64] = &[3221225477, 11, -11, 134, 139];

/// How a program run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    Success,
    /// Exited with a known crash code
    Crash(i64),
    Failure(i64),
}

pub fn classify_exit(code: i64) -> ExitClass {
    if code == 0 {
        ExitClass::Success
    } else if CRASH_CODES.contains(&code) {
        ExitClass::Crash(code)
    } else {
        ExitClass::Failure(code)
    }
}

/// Normalize an exit status to a single code
///
/// Signals become `-signal`; Windows status codes are read unsigned.
pub fn exit_code_of(status: ExitStatus) -> i64 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -(signal as i64);
        }
    }

    match status.code() {
        Some(code) if cfg!(windows) => code as u32 as i64,
        Some(code) => code as i64,
        None => -1,
    }
}

/// Run `program` from `cwd` with inherited stdio and return its exit code
pub fn run_artifact(program: &Path, cwd: &Path, args: &[String]) -> BuildResult<i64> {
    tracing::debug!(program = %program.display(), cwd = %cwd.display(), "running artifact");

    let status = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .status()
        .map_err(|e| BuildError::spawn(program.display().to_string(), e))?;

    Ok(exit_code_of(status))
}
