//! External tool invocation
//!
//! Commands are built as discrete argument tokens and handed straight to the
//! OS process API; nothing is ever re-parsed by a shell. [`ProcessRunner`] is
//! the seam the pipelines depend on so they can be exercised without the
//! real toolchain installed.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },
}

/// An external command as an ordered list of tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends `--name=value` as a single token
    pub fn option(self, name: &str, value: impl AsRef<Path>) -> Self {
        let mut token = OsString::from(format!("--{}=", name));
        token.push(value.as_ref().as_os_str());
        self.arg(token)
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Arguments as lossy UTF-8, for assertions and logs
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(&self, source: io::Error) -> ProcessError {
        ProcessError::Spawn {
            program: self.program.to_string_lossy().into_owned(),
            source,
        }
    }
}

impl fmt::Display for ToolCommand {
    /// Shell-like rendering for logs only; tokens containing spaces are quoted
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let program = self.program.to_string_lossy();
        write!(f, "{}", quote(&program))?;
        for arg in &self.args {
            write!(f, " {}", quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

fn quote(token: &str) -> String {
    if token.is_empty() || token.contains(char::is_whitespace) {
        format!("\"{}\"", token)
    } else {
        token.to_string()
    }
}

/// Exit status of a finished tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStatus {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

impl ToolStatus {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Code to hand on as this process's own exit code
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(1)
    }
}

impl From<ExitStatus> for ToolStatus {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Result of a tool whose stdout was captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub status: ToolStatus,
    pub stdout: String,
}

/// Runs external tools to completion
///
/// Every call blocks until the child exits; there is no timeout.
pub trait ProcessRunner {
    /// Runs the command with stdout captured; stderr stays attached to the terminal
    fn capture(&self, command: &ToolCommand) -> Result<CapturedOutput, ProcessError>;

    /// Runs the command with inherited stdio
    fn run(&self, command: &ToolCommand) -> Result<ToolStatus, ProcessError>;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
    fn capture(&self, command: &ToolCommand) -> Result<CapturedOutput, ProcessError> {
        (**self).capture(command)
    }

    fn run(&self, command: &ToolCommand) -> Result<ToolStatus, ProcessError> {
        (**self).run(command)
    }
}

/// [`ProcessRunner`] backed by `std::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn capture(&self, command: &ToolCommand) -> Result<CapturedOutput, ProcessError> {
        debug!(command = %command, "Running (captured)");
        let output = command
            .to_command()
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| command.spawn_error(e))?;

        Ok(CapturedOutput {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn run(&self, command: &ToolCommand) -> Result<ToolStatus, ProcessError> {
        debug!(command = %command, "Running");
        let status = command
            .to_command()
            .stdin(Stdio::null())
            .status()
            .map_err(|e| command.spawn_error(e))?;
        Ok(status.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_tokens_separate() {
        let cmd = ToolCommand::new("java")
            .arg("-jar")
            .arg("closure compiler.jar")
            .args(["a.js", "b c.js"]);

        assert_eq!(cmd.program(), "java");
        assert_eq!(
            cmd.args_lossy(),
            vec!["-jar", "closure compiler.jar", "a.js", "b c.js"]
        );
    }

    #[test]
    fn test_option_token() {
        let cmd = ToolCommand::new("python").option("root", "closure-library/lib/");
        assert_eq!(cmd.args_lossy(), vec!["--root=closure-library/lib/"]);
    }

    #[test]
    fn test_display_quotes_spaces() {
        let cmd = ToolCommand::new("closurets").args(["a.js", "my dir/b.js"]);
        assert_eq!(cmd.to_string(), "closurets a.js \"my dir/b.js\"");
    }

    #[test]
    fn test_status_exit_code() {
        assert!(ToolStatus::from_code(0).success());
        assert_eq!(ToolStatus::from_code(2).exit_code(), 2);
        assert_eq!(ToolStatus { code: None }.exit_code(), 1);
        assert!(!ToolStatus { code: None }.success());
    }

    #[test]
    fn test_spawn_failure() {
        let cmd = ToolCommand::new("hermesjs-definitely-not-installed");
        match SystemRunner.run(&cmd) {
            Err(ProcessError::Spawn { program, .. }) => {
                assert_eq!(program, "hermesjs-definitely-not-installed")
            }
            other => panic!("Expected Spawn error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_stdout_and_status() {
        let cmd = ToolCommand::new("sh").args(["-c", "echo one; echo two; exit 3"]);
        let output = SystemRunner.capture(&cmd).unwrap();

        assert_eq!(output.status.code, Some(3));
        assert_eq!(output.stdout, "one\ntwo\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_current_dir_is_applied() {
        let dir = tempfile::TempDir::new().unwrap();
        let cmd = ToolCommand::new("pwd").current_dir(dir.path());
        let output = SystemRunner.capture(&cmd).unwrap();

        let reported = std::path::PathBuf::from(output.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }
}
