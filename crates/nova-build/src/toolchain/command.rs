//! Rendered compiler command lines

use crate::error::{BuildError, BuildResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

/// Script that must run in the same shell before the tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvScript {
    pub path: PathBuf,
    pub args: Vec<String>,
}

/// A concrete tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerCommand {
    pub program: String,
    pub args: Vec<String>,
    /// When set, the command is chained after this script through `cmd /C`
    pub env_script: Option<EnvScript>,
}

impl CompilerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env_script: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env_script(mut self, script: EnvScript) -> Self {
        self.env_script = Some(script);
        self
    }

    /// Tool invocation without the environment prelude
    fn tool_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Full shell line, including the environment script if any
    pub fn shell_line(&self) -> String {
        match &self.env_script {
            None => self.tool_line(),
            Some(script) => {
                let mut prelude = quote_arg(&script.path.to_string_lossy());
                for arg in &script.args {
                    prelude.push(' ');
                    prelude.push_str(&quote_arg(arg));
                }
                format!("{prelude} >nul && {}", self.tool_line())
            }
        }
    }

    /// Build a [`Command`] running in `cwd`
    pub fn to_command(&self, cwd: &Path) -> Command {
        let mut command = match &self.env_script {
            None => {
                let mut command = Command::new(&self.program);
                command.args(&self.args);
                command
            }
            Some(_) => shell_command(&self.shell_line()),
        };
        command.current_dir(cwd);
        command
    }

    /// Start the command without waiting
    pub fn spawn(&self, cwd: &Path) -> BuildResult<Child> {
        tracing::debug!(cwd = %cwd.display(), command = %self, "spawning");
        self.to_command(cwd)
            .spawn()
            .map_err(|e| BuildError::spawn(self.to_string(), e))
    }

    /// Run to completion and return the exit code
    ///
    /// A process killed by a signal reports -1.
    pub fn run(&self, cwd: &Path) -> BuildResult<i32> {
        let status = self
            .spawn(cwd)?
            .wait()
            .map_err(|e| BuildError::spawn(self.to_string(), e))?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Run and capture trimmed stdout, `None` on failure
    pub fn output(&self, cwd: &Path) -> Option<String> {
        let output = self.to_command(cwd).output().ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

impl fmt::Display for CompilerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.shell_line())
    }
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    use std::os::windows::process::CommandExt;

    let mut command = Command::new("cmd");
    // cmd.exe parses its own command line; Rust's quoting would break it.
    command.raw_arg(format!("/C \"{line}\""));
    command
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(line);
    command
}

fn quote_arg(arg: &str) -> String {
    if arg.is_empty() || arg.contains(char::is_whitespace) {
        format!("\"{arg}\"")
    } else {
        arg.to_string()
    }
}
