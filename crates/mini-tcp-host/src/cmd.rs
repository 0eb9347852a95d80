//! cmd.rs

use std::{
    ffi::{OsStr, OsString},
    fmt,
    process::{Command, ExitStatus, Output},
};
use thiserror::Error;

/// Repersents an Error that can occur when running a host tool
#[derive(Debug, Error)]
pub enum ShellCommandError {
    /// Input/Output error when launching the command (e.g., the tool is not installed)
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Exited with a non-zero status
    #[error("command failed with {0}; stdout: {1}; stderr: {2}")]
    Failed(ExitStatus, String, String),
}

/// A thin wrapper around a host tool invocation (`ip`, `setcap`, `ifconfig`) that captures its
/// output and remembers its full command line so it can be shown without being run
pub struct ShellCommand {
    program: OsString,
    args: Vec<OsString>,
}

/// Builds a `ShellCommand` from a program and a list of arguments
#[macro_export]
macro_rules! cmd {
    ($cmd:expr) => {
        $crate::cmd::ShellCommand::new($cmd)
    };

    ($cmd:expr, $($arg:expr),+ $(,)?) => {{
        let mut cmd = $crate::cmd::ShellCommand::new($cmd);
        $(cmd.arg($arg);)+
        cmd
    }};
}

impl ShellCommand {
    /// Returns a new shell command that will execute `program`
    ///
    /// # Arguments
    /// * `program` - Tool to execute (looked up in `PATH`)
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        ShellCommand {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
        }
    }

    /// Adds an argument to this shell command
    ///
    /// # Arguments
    /// * `arg` - Argument to add to the shell command
    pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Name of the program this command runs
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Arguments passed to the program, in order
    pub fn args(&self) -> impl Iterator<Item = &OsStr> {
        self.args.iter().map(OsString::as_os_str)
    }

    /// Helper function to parse the output from a shell command
    ///
    /// # Errors
    /// * `ShellCommandError::Failed` - If the return code is non-zero
    fn parse_output(output: Output) -> Result<String, ShellCommandError> {
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !stdout.is_empty() {
            tracing::debug!("command stdout:\n{}", stdout);
        }

        if !stderr.is_empty() {
            tracing::debug!("command stderr:\n{}", stderr);
        }

        match output.status.success() {
            true => Ok(stdout),
            false => Err(ShellCommandError::Failed(output.status, stdout, stderr)),
        }
    }

    /// Executes the command and blocks until it exits, capturing stdout/stderr for logging
    ///
    /// # Errors
    /// * `ShellCommandError::Io` - If launching/forking the command fails
    /// * `ShellCommandError::Failed` - If the return code is non-zero
    pub fn execute(self) -> Result<String, ShellCommandError> {
        tracing::debug!("command: {}", self);
        let output = Command::new(&self.program).args(&self.args).output()?;
        Self::parse_output(output)
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
