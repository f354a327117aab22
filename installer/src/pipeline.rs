//! Installation pipeline orchestration.
//!
//! An installation runs three stages in a fixed order:
//!
//! 1. **Unpack** extracts the distribution archive into a scratch directory
//!    and moves its single top-level directory to the installation target.
//! 2. **Patch** applies each configured patch through the management CLI,
//!    stopping at the first failure. With no patches it does nothing.
//! 3. **Secure** recursively applies the configured owner, group and mode to
//!    the installation target.
//!
//! [`InstallPipeline`] tracks which stage has completed and refuses to run a
//! stage out of order. Resources a stage acquires (the scratch directory,
//! the CLI session) are released when that stage returns, whether it
//! succeeded or not.

use crate::archive::{self, UnzipExtractor};
use crate::artifacts::Artifacts;
use crate::config::InstallConfig;
use crate::error::{InstallerError, Result};
use crate::executor::CommandExecutor;
use crate::management::{ManagementCli, patch_apply_command};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use provision_common::{
    AttributeBackend, AttributeMutator, FsError, Identity, IdentityDatabase, Mode, fsops,
    resolve_identity,
};
use std::fmt;
use std::io;
use std::path::PathBuf;
use tempfile::TempDir;

/// Name prefix of the temporary extraction directory.
pub const SCRATCH_PREFIX: &str = "provision-unpack-";

/// Progress of an installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    /// No stage has completed.
    Uninitialized,
    /// The distribution has been moved to the target.
    Unpacked,
    /// All configured patches have been applied.
    Patched,
    /// Ownership and permissions have been applied.
    Secured,
}

impl PipelineState {
    /// Lower-case name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Unpacked => "unpacked",
            Self::Patched => "patched",
            Self::Secured => "secured",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource owned by a single stage for its duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopedResource {
    /// Temporary extraction directory.
    ScratchDirectory,
    /// Management CLI session.
    CliSession,
}

impl fmt::Display for ScopedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ScratchDirectory => "scratch directory",
            Self::CliSession => "management CLI session",
        })
    }
}

/// One step of the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Extract and place the distribution.
    Unpack,
    /// Apply patches.
    Patch,
    /// Apply ownership and permissions.
    Secure,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Self; 3] = [Self::Unpack, Self::Patch, Self::Secure];

    /// Lower-case name used in messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unpack => "unpack",
            Self::Patch => "patch",
            Self::Secure => "secure",
        }
    }

    /// State the pipeline must be in before this stage runs.
    #[must_use]
    pub const fn entry_state(self) -> PipelineState {
        match self {
            Self::Unpack => PipelineState::Uninitialized,
            Self::Patch => PipelineState::Unpacked,
            Self::Secure => PipelineState::Patched,
        }
    }

    /// State the pipeline is in after this stage succeeds.
    #[must_use]
    pub const fn exit_state(self) -> PipelineState {
        match self {
            Self::Unpack => PipelineState::Unpacked,
            Self::Patch => PipelineState::Patched,
            Self::Secure => PipelineState::Secured,
        }
    }

    /// Resource this stage holds while it runs, if any.
    #[must_use]
    pub const fn scoped_resource(self) -> Option<ScopedResource> {
        match self {
            Self::Unpack => Some(ScopedResource::ScratchDirectory),
            Self::Patch => Some(ScopedResource::CliSession),
            Self::Secure => None,
        }
    }
}

/// Holds a stage's [`ScopedResource`] and logs its release when dropped,
/// whichever way the stage exits.
struct StageScope {
    stage: Stage,
    resource: Option<ScopedResource>,
}

impl StageScope {
    fn acquire(stage: Stage) -> Self {
        let resource = stage.scoped_resource();
        if let Some(resource) = resource {
            debug!("acquired {resource} for {} stage", stage.name());
        }
        Self { stage, resource }
    }
}

impl Drop for StageScope {
    fn drop(&mut self) {
        if let Some(resource) = self.resource {
            debug!("released {resource} for {} stage", self.stage.name());
        }
    }
}

/// Host collaborators used by the pipeline.
#[derive(Clone, Copy)]
pub struct PipelineContext<'a> {
    /// Runs `unzip`.
    pub executor: &'a dyn CommandExecutor,
    /// Applies patches.
    pub cli: &'a dyn ManagementCli,
    /// Resolves the owner and group.
    pub identities: &'a dyn IdentityDatabase,
    /// Changes ownership and permission bits.
    pub attributes: &'a dyn AttributeBackend,
}

/// What an installation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Installation target.
    pub target_dir: Utf8PathBuf,
    /// Top-level directory name found in the archive.
    pub distribution_root: Option<String>,
    /// Patches applied, in order.
    pub patches_applied: Vec<String>,
    /// Entries whose ownership and mode were set.
    pub secured_entries: usize,
    /// Last state reached.
    pub state: PipelineState,
}

/// Runs the unpack, patch and secure stages against one target.
pub struct InstallPipeline<'a> {
    config: InstallConfig,
    artifacts: Artifacts,
    context: PipelineContext<'a>,
    identity: Identity,
    mode: Mode,
    report: InstallReport,
}

impl<'a> InstallPipeline<'a> {
    /// Validates `config` and resolves the ownership settings.
    ///
    /// Nothing on disk is touched, so a bad owner, group or mode fails
    /// before the distribution is unpacked.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Configuration`] for an invalid target and
    /// [`InstallerError::Resolution`] when the owner, group or mode cannot be
    /// resolved.
    pub fn new(
        config: InstallConfig,
        artifacts: Artifacts,
        context: PipelineContext<'a>,
    ) -> Result<Self> {
        config.validate()?;
        let identity = resolve_identity(context.identities, &config.owner, &config.group)
            .map_err(|err| InstallerError::from_fs("setup", err))?;
        let mode = config
            .mode
            .parse::<Mode>()
            .map_err(|err| InstallerError::from_fs("setup", err))?;

        let report = InstallReport {
            target_dir: config.target_dir.clone(),
            distribution_root: None,
            patches_applied: Vec::new(),
            secured_entries: 0,
            state: PipelineState::Uninitialized,
        };
        Ok(Self {
            config,
            artifacts,
            context,
            identity,
            mode,
            report,
        })
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.report.state
    }

    /// Progress so far.
    #[must_use]
    pub fn report(&self) -> &InstallReport {
        &self.report
    }

    /// Runs every remaining stage in order and returns the final report.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure; later stages do not run.
    pub fn run(mut self) -> Result<InstallReport> {
        for stage in Stage::ALL {
            if self.state() < stage.exit_state() {
                self.run_stage(stage)?;
            }
        }
        Ok(self.report)
    }

    /// Runs one stage.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::StageOrder`] when the pipeline is not in the
    /// stage's entry state, or the stage's own failure.
    pub fn run_stage(&mut self, stage: Stage) -> Result<()> {
        match stage {
            Stage::Unpack => self.unpack(),
            Stage::Patch => self.apply_patches(),
            Stage::Secure => self.secure(),
        }
    }

    /// Extracts the archive and moves its root directory to the target.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Extraction`] when the archive is missing,
    /// unreadable, empty or has several top-level entries, and
    /// [`InstallerError::Filesystem`] when the scratch directory cannot be
    /// created or the target cannot be replaced. The scratch directory is
    /// removed on every path out of this stage.
    pub fn unpack(&mut self) -> Result<()> {
        self.enter(Stage::Unpack)?;

        let archive_path = self.artifacts.path(&self.config.archive);
        let extraction_error = |reason: String| InstallerError::Extraction {
            archive: archive_path.clone(),
            reason,
        };
        if !archive_path.is_file() {
            return Err(extraction_error("archive not found".to_owned()));
        }

        info!("Unpacking {archive_path}...");
        let root = archive::distribution_root(archive_path.as_std_path())
            .map_err(|err| extraction_error(err.to_string()))?;

        let scope = StageScope::acquire(Stage::Unpack);
        let scratch = self.create_scratch_dir()?;
        let scratch_dir = Utf8Path::from_path(scratch.path()).ok_or_else(|| {
            extraction_error(format!(
                "scratch directory {} is not valid UTF-8",
                scratch.path().display()
            ))
        })?;

        UnzipExtractor::new(self.context.executor)
            .extract(&archive_path, scratch_dir)
            .map_err(|err| extraction_error(err.to_string()))?;

        let extracted = scratch_dir.join(&root);
        if !extracted.is_dir() {
            return Err(extraction_error(format!(
                "top-level entry {root} is not a directory"
            )));
        }

        prepare_target(&self.config.target_dir)?;
        fsops::move_path(extracted.as_std_path(), self.config.target_dir.as_std_path())
            .map_err(|err| InstallerError::from_fs(Stage::Unpack.name(), err))?;

        if let Err(err) = scratch.close() {
            warn!("failed to remove scratch directory: {err}");
        }
        drop(scope);
        info!("Unpacked {root} to {}", self.config.target_dir);

        self.report.distribution_root = Some(root);
        self.complete(Stage::Unpack);
        Ok(())
    }

    /// Applies each configured patch in order.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Patch`] naming the first patch that is
    /// missing or rejected; later patches are not attempted.
    pub fn apply_patches(&mut self) -> Result<()> {
        self.enter(Stage::Patch)?;

        if self.config.patches.is_empty() {
            info!("No patches to apply, skipping");
            self.complete(Stage::Patch);
            return Ok(());
        }

        let scope = StageScope::acquire(Stage::Patch);
        let outcome = self.apply_each_patch();
        drop(scope);
        outcome?;

        self.complete(Stage::Patch);
        Ok(())
    }

    /// Creates the extraction directory under the configured scratch parent,
    /// or the system temporary directory.
    fn create_scratch_dir(&self) -> Result<TempDir> {
        let parent = self
            .config
            .scratch_dir
            .as_ref()
            .map_or_else(std::env::temp_dir, |dir| dir.as_std_path().to_path_buf());
        tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&parent)
            .map_err(|source| scratch_error(parent, source))
    }

    fn apply_each_patch(&mut self) -> Result<()> {
        for patch in &self.config.patches {
            let path = self.artifacts.path(patch);
            if !path.is_file() {
                return Err(InstallerError::Patch {
                    patch: patch.clone(),
                    reason: format!("artifact not found at {path}"),
                });
            }

            info!("Applying {patch} patch");
            self.context
                .cli
                .run(&patch_apply_command(&path))
                .map_err(|err| InstallerError::Patch {
                    patch: patch.clone(),
                    reason: err.to_string(),
                })?;
            info!("Patch {patch} applied");
            self.report.patches_applied.push(patch.clone());
        }
        Ok(())
    }

    /// Recursively applies the resolved owner, group and mode to the target.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Filesystem`] naming the first entry whose
    /// attributes could not be changed.
    pub fn secure(&mut self) -> Result<()> {
        self.enter(Stage::Secure)?;

        let target = self.config.target_dir.as_std_path();
        let mutator = AttributeMutator::new(self.context.identities, self.context.attributes);
        info!(
            "Changing ownership of {} to {}:{}",
            self.config.target_dir, self.config.owner, self.config.group
        );
        let owned = mutator
            .apply_owner(self.identity, target, true)
            .map_err(|err| InstallerError::from_fs(Stage::Secure.name(), err))?;
        info!("Changing mode of {} to {}", self.config.target_dir, self.mode);
        mutator
            .apply_mode(self.mode, target, true)
            .map_err(|err| InstallerError::from_fs(Stage::Secure.name(), err))?;

        self.report.secured_entries = owned.entries;
        self.complete(Stage::Secure);
        Ok(())
    }

    fn enter(&self, stage: Stage) -> Result<()> {
        if self.state() == stage.entry_state() {
            debug!("entering {} stage", stage.name());
            return Ok(());
        }
        Err(InstallerError::StageOrder {
            stage: stage.name(),
            state: self.state().as_str(),
        })
    }

    fn complete(&mut self, stage: Stage) {
        self.report.state = stage.exit_state();
        debug!("{} stage complete; pipeline is {}", stage.name(), self.report.state);
    }
}

fn scratch_error(parent: PathBuf, source: io::Error) -> InstallerError {
    InstallerError::from_fs(
        Stage::Unpack.name(),
        FsError::Filesystem {
            operation: "create scratch directory",
            path: parent,
            source,
        },
    )
}

/// Makes room for the distribution at `target`.
///
/// A missing target is fine; an empty directory is removed so the move can
/// replace it; anything else is refused.
fn prepare_target(target: &Utf8Path) -> Result<()> {
    let stage = Stage::Unpack.name();
    let fs_error = |operation: &'static str, source: io::Error| {
        InstallerError::from_fs(
            stage,
            FsError::Filesystem {
                operation,
                path: target.as_std_path().to_path_buf(),
                source,
            },
        )
    };

    let mut entries = match std::fs::read_dir(target) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(fs_error("inspect target", err)),
    };
    if entries.next().is_some() {
        return Err(fs_error(
            "prepare target",
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                "installation target already exists and is not empty",
            ),
        ));
    }
    std::fs::remove_dir(target).map_err(|err| fs_error("replace empty target", err))
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
