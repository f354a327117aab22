//! Application-server management CLI.

use crate::error::Result;
use crate::executor::{CommandExecutor, run_checked};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;

/// Relative location of the management script inside an installation.
pub const CLI_SCRIPT: &str = "bin/jboss-cli.sh";

/// A session with the server's management interface.
#[cfg_attr(test, mockall::automock)]
pub trait ManagementCli {
    /// Runs one management command.
    ///
    /// # Errors
    ///
    /// Returns an error when the command cannot be issued or is rejected.
    fn run(&self, command: &str) -> Result<()>;
}

/// Drives `bin/jboss-cli.sh` in an installed distribution.
///
/// Every command is a separate offline invocation of the script, so the
/// session holds no state beyond the script location.
pub struct JbossCli<'a> {
    executor: &'a dyn CommandExecutor,
    script: Utf8PathBuf,
}

impl<'a> JbossCli<'a> {
    /// Creates a session for the installation rooted at `jboss_home`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, jboss_home: &Utf8Path) -> Self {
        Self {
            executor,
            script: jboss_home.join(CLI_SCRIPT),
        }
    }

    /// Path of the script this session invokes.
    #[must_use]
    pub fn script(&self) -> &Utf8Path {
        &self.script
    }
}

impl ManagementCli for JbossCli<'_> {
    fn run(&self, command: &str) -> Result<()> {
        debug!("{}: {command}", self.script);
        let argument = format!("--command={command}");
        run_checked(self.executor, self.script.as_str(), &[argument.as_str()])?;
        Ok(())
    }
}

/// Builds the management command that applies the patch at `path`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use provision_installer::management::patch_apply_command;
///
/// assert_eq!(
///     patch_apply_command(Utf8Path::new("/tmp/scripts/sources/p1")),
///     "patch apply /tmp/scripts/sources/p1"
/// );
/// ```
#[must_use]
pub fn patch_apply_command(path: &Utf8Path) -> String {
    format!("patch apply {path}")
}
