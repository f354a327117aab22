//! Logical artifact names and where they live on disk.
//!
//! Stages refer to inputs by logical name (`eap.zip`, a patch name). The
//! [`Artifacts`] table turns a name into a path under the sources directory,
//! optionally through a manifest mapping.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;

/// Maps logical artifact names to files in a sources directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    sources_dir: Utf8PathBuf,
    files: BTreeMap<String, String>,
}

impl Artifacts {
    /// Create a table where every name maps to the file of the same name.
    #[must_use]
    pub fn new(sources_dir: Utf8PathBuf) -> Self {
        Self {
            sources_dir,
            files: BTreeMap::new(),
        }
    }

    /// Add mappings from logical names to file names.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Configuration`] when a name or file name is
    /// not a plain file name.
    pub fn with_mappings<'m>(
        mut self,
        mappings: impl IntoIterator<Item = (&'m String, &'m String)>,
    ) -> Result<Self> {
        for (name, file) in mappings {
            validate_name(name)?;
            validate_name(file)?;
            self.files.insert(name.clone(), file.clone());
        }
        Ok(self)
    }

    /// Directory the artifacts are read from.
    #[must_use]
    pub fn sources_dir(&self) -> &Utf8Path {
        &self.sources_dir
    }

    /// Path for the artifact called `name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use provision_installer::artifacts::Artifacts;
    ///
    /// let artifacts = Artifacts::new("/tmp/scripts/sources".into());
    /// assert_eq!(artifacts.path("eap.zip"), "/tmp/scripts/sources/eap.zip");
    /// ```
    #[must_use]
    pub fn path(&self, name: &str) -> Utf8PathBuf {
        let file = self.files.get(name).map_or(name, String::as_str);
        self.sources_dir.join(file)
    }
}

/// Rejects names that would resolve outside the sources directory.
///
/// # Errors
///
/// Returns [`InstallerError::Configuration`] for empty names, `.` or `..`,
/// and names containing a path separator.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']);
    if invalid {
        return Err(InstallerError::Configuration {
            reason: format!("artifact name {name:?} must be a plain file name"),
        });
    }
    Ok(())
}
