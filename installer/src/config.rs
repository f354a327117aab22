//! Installer configuration.
//!
//! The installation target is an explicit value in [`InstallConfig`] rather
//! than an environment lookup buried in a stage. [`InstallConfig::from_env`]
//! reads it once, up front, and refuses to continue without it.

use crate::error::{InstallerError, Result};
use camino::Utf8PathBuf;
use provision_common::Mode;

/// Environment variable naming the installation target.
pub const TARGET_ENV: &str = "JBOSS_HOME";

/// Environment variable overriding the source-artifact directory.
pub const SOURCES_ENV: &str = "PROVISION_SOURCES_DIR";

/// Directory holding pre-fetched artifacts when nothing overrides it.
pub const DEFAULT_SOURCES_DIR: &str = "/tmp/scripts/sources";

/// Logical artifact name of the distribution archive.
pub const DEFAULT_ARCHIVE: &str = "eap.zip";

/// Owner and group applied to the installed distribution.
pub const DEFAULT_OWNER: &str = "jboss";

/// Permission mode applied to the installed distribution.
pub const DEFAULT_MODE: &str = "0755";

/// Everything the pipeline needs to know before it touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    /// Installation root the distribution is moved into.
    pub target_dir: Utf8PathBuf,
    /// Directory containing the artifacts referenced by name.
    pub sources_dir: Utf8PathBuf,
    /// Logical name of the distribution archive.
    pub archive: String,
    /// Logical names of patches, applied in order.
    pub patches: Vec<String>,
    /// Owner applied by the secure stage (name or numeric id).
    pub owner: String,
    /// Group applied by the secure stage (name or numeric id).
    pub group: String,
    /// Mode applied by the secure stage.
    pub mode: String,
    /// Parent of the temporary extraction directory; the system temporary
    /// directory when unset.
    pub scratch_dir: Option<Utf8PathBuf>,
}

impl InstallConfig {
    /// Create a configuration for `target_dir` with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use provision_installer::config::{DEFAULT_SOURCES_DIR, InstallConfig};
    ///
    /// let config = InstallConfig::new("/opt/eap".into());
    /// assert_eq!(config.sources_dir, DEFAULT_SOURCES_DIR);
    /// assert!(config.patches.is_empty());
    /// ```
    #[must_use]
    pub fn new(target_dir: Utf8PathBuf) -> Self {
        Self {
            target_dir,
            sources_dir: Utf8PathBuf::from(DEFAULT_SOURCES_DIR),
            archive: DEFAULT_ARCHIVE.to_owned(),
            patches: Vec::new(),
            owner: DEFAULT_OWNER.to_owned(),
            group: DEFAULT_OWNER.to_owned(),
            mode: DEFAULT_MODE.to_owned(),
            scratch_dir: None,
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Configuration`] when `JBOSS_HOME` is unset,
    /// empty, or not an absolute path.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`InstallConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let target = non_empty(TARGET_ENV).ok_or_else(|| InstallerError::Configuration {
            reason: format!(
                "{TARGET_ENV} is not set; cannot determine where to install the application server"
            ),
        })?;

        let mut config = Self::new(Utf8PathBuf::from(target));
        if let Some(sources) = non_empty(SOURCES_ENV) {
            config.sources_dir = Utf8PathBuf::from(sources);
        }
        config.validate()?;
        Ok(config)
    }

    /// Replace the patch list.
    #[must_use]
    pub fn with_patches<I, S>(mut self, patches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patches = patches.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the source-artifact directory.
    #[must_use]
    pub fn with_sources_dir(mut self, sources_dir: Utf8PathBuf) -> Self {
        self.sources_dir = sources_dir;
        self
    }

    /// Extract the archive below `scratch_dir` instead of the system
    /// temporary directory.
    #[must_use]
    pub fn with_scratch_dir(mut self, scratch_dir: Utf8PathBuf) -> Self {
        self.scratch_dir = Some(scratch_dir);
        self
    }

    /// Replace the owner, group and mode applied by the secure stage.
    #[must_use]
    pub fn with_ownership(mut self, owner: &str, group: &str, mode: &str) -> Self {
        owner.clone_into(&mut self.owner);
        group.clone_into(&mut self.group);
        mode.clone_into(&mut self.mode);
        self
    }

    /// Check the values that can be verified without touching the host.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Configuration`] for a relative target
    /// directory and [`InstallerError::Resolution`] for an unparsable mode.
    pub fn validate(&self) -> Result<()> {
        if !self.target_dir.is_absolute() {
            return Err(InstallerError::Configuration {
                reason: format!(
                    "installation target {} must be an absolute path",
                    self.target_dir
                ),
            });
        }
        self.mode
            .parse::<Mode>()
            .map_err(|source| InstallerError::from_fs("setup", source))?;
        Ok(())
    }
}
