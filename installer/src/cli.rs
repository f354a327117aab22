//! CLI argument definitions for the distribution installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::artifacts::{Artifacts, validate_name};
use crate::config::{InstallConfig, SOURCES_ENV, TARGET_ENV};
use crate::error::Result;
use crate::manifest::ArtifactManifest;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Install an application-server distribution.
#[derive(Parser, Debug)]
#[command(name = "provision-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install an application-server distribution.\n\n",
    "The installer unpacks the distribution archive found in the sources ",
    "directory, moves its top-level directory to JBOSS_HOME, applies any ",
    "patches through the management CLI, and finally sets ownership and ",
    "permissions on the whole installation.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install with defaults (archive eap.zip from /tmp/scripts/sources):\n",
    "    $ JBOSS_HOME=/opt/eap provision-installer\n\n",
    "  Apply two patches in order:\n",
    "    $ provision-installer --target-dir /opt/eap --patch p1.zip --patch p2.zip\n\n",
    "  Read the archive and patch list from a manifest:\n",
    "    $ provision-installer --manifest artifacts.toml\n\n",
    "  Preview without touching the filesystem:\n",
    "    $ provision-installer --dry-run\n\n",
    "  Change ownership of a tree:\n",
    "    $ provision-installer chown -R jboss jboss /opt/eap/standalone",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Install arguments (used when no subcommand is given).
    #[command(flatten)]
    pub install: InstallArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Install the distribution (default when no subcommand given).
    Install(InstallArgs),

    /// Change the owner and group of a path.
    Chown(ChownArgs),

    /// Change the permission bits of a path.
    Chmod(ChmodArgs),
}

/// Arguments for the install command.
#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Installation target directory.
    #[arg(short, long, value_name = "DIR", env = TARGET_ENV)]
    pub target_dir: Option<Utf8PathBuf>,

    /// Directory holding the archive and patches [default: /tmp/scripts/sources].
    #[arg(short, long, value_name = "DIR", env = SOURCES_ENV)]
    pub sources_dir: Option<Utf8PathBuf>,

    /// TOML manifest naming the archive, patches and artifact file names.
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<Utf8PathBuf>,

    /// Logical name of the distribution archive [default: eap.zip].
    #[arg(long, value_name = "NAME")]
    pub archive: Option<String>,

    /// Patch to apply, by logical name (can be repeated; applied in order).
    #[arg(short, long, value_name = "NAME")]
    pub patch: Vec<String>,

    /// Owner of the installed files [default: jboss].
    #[arg(long, value_name = "USER")]
    pub owner: Option<String>,

    /// Group of the installed files [default: jboss].
    #[arg(long, value_name = "GROUP")]
    pub group: Option<String>,

    /// Permission mode of the installed files [default: 0755].
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Directory to extract the archive in [default: system temporary directory].
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<Utf8PathBuf>,

    /// Show configuration and exit without installing.
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress progress output (errors still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the chown command.
#[derive(Args, Debug, Clone)]
pub struct ChownArgs {
    /// Apply to every entry below the path as well.
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// New owner, by name or numeric id.
    pub owner: String,

    /// New group, by name or numeric id.
    pub group: String,

    /// Path to change.
    pub path: Utf8PathBuf,
}

/// Arguments for the chmod command.
#[derive(Args, Debug, Clone)]
pub struct ChmodArgs {
    /// Apply to every entry below the path as well.
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// New mode, e.g. `0755`, `0o750` or `493`.
    pub mode: String,

    /// Path to change.
    pub path: Utf8PathBuf,
}

impl InstallArgs {
    /// Builds the installer configuration from these arguments and an
    /// optional manifest.
    ///
    /// Command-line values win over the manifest, which wins over the
    /// defaults. Patches given on the command line replace the manifest's
    /// list rather than extending it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::InstallerError::Configuration`] when no target
    /// is given or a name is not a plain file name, and
    /// [`crate::error::InstallerError::Resolution`] for an unparsable mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use provision_installer::cli::InstallArgs;
    ///
    /// let args = InstallArgs {
    ///     target_dir: Some("/opt/eap".into()),
    ///     patch: vec!["p1".to_owned()],
    ///     ..InstallArgs::default()
    /// };
    /// let (config, artifacts) = args.resolve(None)?;
    /// assert_eq!(config.patches, vec!["p1".to_owned()]);
    /// assert_eq!(artifacts.path("p1"), "/tmp/scripts/sources/p1");
    /// # Ok::<(), provision_installer::error::InstallerError>(())
    /// ```
    pub fn resolve(
        &self,
        manifest: Option<&ArtifactManifest>,
    ) -> Result<(InstallConfig, Artifacts)> {
        let mut config = InstallConfig::from_lookup(|key| match key {
            TARGET_ENV => self.target_dir.as_ref().map(ToString::to_string),
            SOURCES_ENV => self.sources_dir.as_ref().map(ToString::to_string),
            _ => None,
        })?;

        if let Some(manifest) = manifest {
            if let Some(archive) = &manifest.archive {
                archive.clone_into(&mut config.archive);
            }
            config.patches.clone_from(&manifest.patches);
        }
        if let Some(archive) = &self.archive {
            archive.clone_into(&mut config.archive);
        }
        if !self.patch.is_empty() {
            config.patches.clone_from(&self.patch);
        }
        if let Some(owner) = &self.owner {
            owner.clone_into(&mut config.owner);
        }
        if let Some(group) = &self.group {
            group.clone_into(&mut config.group);
        }
        if let Some(mode) = &self.mode {
            mode.clone_into(&mut config.mode);
        }
        config.scratch_dir.clone_from(&self.scratch_dir);

        std::iter::once(&config.archive)
            .chain(&config.patches)
            .try_for_each(|name| validate_name(name))?;
        config.validate()?;

        let mut artifacts = Artifacts::new(config.sources_dir.clone());
        if let Some(manifest) = manifest {
            artifacts = artifacts.with_mappings(&manifest.artifacts)?;
        }
        Ok((config, artifacts))
    }
}

impl Cli {
    /// Returns the effective install arguments.
    ///
    /// If an `Install` subcommand was provided, returns those arguments.
    /// Otherwise returns the flattened install arguments.
    #[must_use]
    pub fn install_args(&self) -> &InstallArgs {
        match &self.command {
            Some(Command::Install(args)) => args,
            Some(Command::Chown(_) | Command::Chmod(_)) | None => &self.install,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
