//! External command execution.
//!
//! Archive extraction and management-CLI calls both shell out. Routing every
//! subprocess through [`CommandExecutor`] keeps the pipeline testable without
//! `unzip` or an application server on the test host.

use crate::error::{InstallerError, Result};
use std::process::{Command, Output};

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use provision_installer::executor::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("unzip", &["-v"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), provision_installer::error::InstallerError>(())
    /// ```
    fn run<'a>(&self, cmd: &str, args: &[&'a str]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run<'a>(&self, cmd: &str, args: &[&'a str]) -> Result<Output> {
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(InstallerError::from)
    }
}

/// Runs a command and fails unless it exits successfully.
///
/// # Errors
///
/// Returns spawn errors unchanged and [`InstallerError::CommandFailed`] for a
/// non-zero exit status.
pub fn run_checked(executor: &dyn CommandExecutor, cmd: &str, args: &[&str]) -> Result<Output> {
    let output = executor.run(cmd, args)?;
    if output.status.success() {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(InstallerError::CommandFailed {
        command: command_line(cmd, args),
        status: output.status.to_string(),
        stderr: stderr.trim().to_owned(),
    })
}

/// Renders a command and its arguments as a single line for messages.
#[must_use]
pub fn command_line(cmd: &str, args: &[&str]) -> String {
    std::iter::once(cmd)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
