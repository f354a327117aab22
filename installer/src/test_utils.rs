//! Shared test utilities for the installer crate.

use crate::error::{InstallerError, Result};
use crate::executor::CommandExecutor;
use crate::management::ManagementCli;
use provision_common::{AttributeBackend, Identity, IdentityDatabase, Mode};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use zip::write::SimpleFileOptions;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates a successful command `Output` with empty stdout and stderr.
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "unzip").
    pub cmd: String,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run<'a>(&self, cmd: &str, args: &[&'a str]) -> Result<Output> {
        let mut expected = self.expected.borrow_mut();
        let Some(call) = expected.pop_front() else {
            return Err(InstallerError::StubMismatch {
                message: format!("unexpected invocation of {cmd} {args:?}"),
            });
        };

        if call.cmd != cmd || call.args != args {
            return Err(InstallerError::StubMismatch {
                message: format!(
                    "expected {} {:?}, got {cmd} {args:?}",
                    call.cmd, call.args
                ),
            });
        }

        call.result
    }
}

/// A `CommandExecutor` that services `unzip -q <archive> -d <dest>` in
/// process with the `zip` crate and records every invocation.
///
/// Lets end-to-end pipeline tests run on hosts without an `unzip` binary.
#[derive(Debug, Default)]
pub struct InProcessUnzip {
    calls: RefCell<Vec<String>>,
}

impl InProcessUnzip {
    /// Creates an executor with an empty call log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Command lines received so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandExecutor for InProcessUnzip {
    fn run<'a>(&self, cmd: &str, args: &[&'a str]) -> Result<Output> {
        self.calls
            .borrow_mut()
            .push(crate::executor::command_line(cmd, args));

        let ["-q", archive, "-d", dest] = args else {
            return Err(InstallerError::StubMismatch {
                message: format!("unsupported invocation {cmd} {args:?}"),
            });
        };
        if cmd != "unzip" {
            return Err(InstallerError::StubMismatch {
                message: format!("unsupported command {cmd}"),
            });
        }

        let file = File::open(archive)?;
        let outcome = zip::ZipArchive::new(file).and_then(|mut zip| zip.extract(dest));
        Ok(match outcome {
            Ok(()) => success_output(),
            Err(err) => failure_output(&err.to_string()),
        })
    }
}

/// A `ManagementCli` that records the commands it receives.
///
/// Commands ending with `fail_on` are recorded and then rejected.
#[derive(Debug, Default)]
pub struct RecordingCli {
    commands: RefCell<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingCli {
    /// Creates a CLI that accepts every command.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a CLI that rejects commands ending with `needle`.
    pub fn failing_on(needle: &str) -> Self {
        Self {
            commands: RefCell::default(),
            fail_on: Some(needle.to_owned()),
        }
    }

    /// Commands received so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }
}

impl ManagementCli for RecordingCli {
    fn run(&self, command: &str) -> Result<()> {
        self.commands.borrow_mut().push(command.to_owned());
        match &self.fail_on {
            Some(needle) if command.ends_with(needle.as_str()) => {
                Err(InstallerError::CommandFailed {
                    command: command.to_owned(),
                    status: exit_status(1).to_string(),
                    stderr: "Conflicts detected".to_owned(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// An `IdentityDatabase` backed by fixed name tables.
#[derive(Debug, Default)]
pub struct StaticIdentities {
    users: BTreeMap<String, u32>,
    groups: BTreeMap<String, u32>,
}

impl StaticIdentities {
    /// Creates a database knowing one user and one group.
    pub fn with(user: &str, uid: u32, group: &str, gid: u32) -> Self {
        Self {
            users: BTreeMap::from([(user.to_owned(), uid)]),
            groups: BTreeMap::from([(group.to_owned(), gid)]),
        }
    }
}

impl IdentityDatabase for StaticIdentities {
    fn user_id(&self, name: &str) -> io::Result<Option<u32>> {
        Ok(self.users.get(name).copied())
    }

    fn group_id(&self, name: &str) -> io::Result<Option<u32>> {
        Ok(self.groups.get(name).copied())
    }
}

/// One attribute change seen by [`RecordingAttributes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeCall {
    /// `set_owner` was called.
    Owner(PathBuf, Identity),
    /// `set_mode` was called.
    Mode(PathBuf, Mode),
}

/// An `AttributeBackend` that records changes instead of applying them.
#[derive(Debug, Default)]
pub struct RecordingAttributes {
    calls: RefCell<Vec<AttributeCall>>,
}

impl RecordingAttributes {
    /// Creates a backend with an empty call log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes seen so far, in order.
    pub fn calls(&self) -> Vec<AttributeCall> {
        self.calls.borrow().clone()
    }
}

impl AttributeBackend for RecordingAttributes {
    fn set_owner(&self, path: &Path, identity: Identity) -> io::Result<()> {
        self.calls
            .borrow_mut()
            .push(AttributeCall::Owner(path.to_path_buf(), identity));
        Ok(())
    }

    fn set_mode(&self, path: &Path, mode: Mode) -> io::Result<()> {
        self.calls
            .borrow_mut()
            .push(AttributeCall::Mode(path.to_path_buf(), mode));
        Ok(())
    }
}

/// Writes a zip archive at `path`.
///
/// Entries whose name ends in `/` become directories; the rest become files
/// with the paired contents.
///
/// # Errors
///
/// Returns any error raised while creating or writing the archive.
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, contents) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).map_err(io::Error::other)?;
        } else {
            writer.start_file(*name, options).map_err(io::Error::other)?;
            writer.write_all(contents.as_bytes())?;
        }
    }

    writer.finish().map_err(io::Error::other)?;
    Ok(())
}
