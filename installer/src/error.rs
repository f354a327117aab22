//! Error types for the distribution installer.
//!
//! Each variant names the pipeline stage or input that failed, along with the
//! offending path, so a failed provisioning run can be diagnosed from its
//! message alone.

use camino::Utf8PathBuf;
use provision_common::FsError;
use thiserror::Error;

/// Errors that can occur while provisioning a distribution.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Configuration {
        /// Description of the missing or invalid value.
        reason: String,
    },

    /// An owner, group or mode could not be resolved.
    #[error("{stage}: {source}")]
    Resolution {
        /// Stage or command that needed the value.
        stage: &'static str,
        /// The underlying resolution failure.
        source: FsError,
    },

    /// The distribution archive could not be inspected or unpacked.
    #[error("unpack failed for {archive}: {reason}")]
    Extraction {
        /// Path of the archive being unpacked.
        archive: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// A patch could not be located or applied.
    #[error("patch {patch} failed: {reason}")]
    Patch {
        /// Logical artifact name of the patch.
        patch: String,
        /// Description of the failure.
        reason: String,
    },

    /// A filesystem operation failed.
    #[error("{stage}: {source}")]
    Filesystem {
        /// Stage or command that performed the operation.
        stage: &'static str,
        /// The underlying filesystem failure, including the path.
        source: FsError,
    },

    /// A stage was run before the stage it depends on.
    #[error("cannot run {stage} stage while pipeline is {state}")]
    StageOrder {
        /// The stage that was requested.
        stage: &'static str,
        /// The state the pipeline was in.
        state: &'static str,
    },

    /// The artifact manifest could not be read or parsed.
    #[error("invalid artifact manifest at {path}: {reason}")]
    Manifest {
        /// Path to the manifest file.
        path: Utf8PathBuf,
        /// Description of the read or parse error.
        reason: String,
    },

    /// An external command exited unsuccessfully.
    #[error("command `{command}` exited with {status}: {stderr}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Exit status description.
        status: String,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl InstallerError {
    /// Classifies a primitive failure, attributing it to `stage`.
    ///
    /// Identity and mode problems become [`InstallerError::Resolution`];
    /// everything else becomes [`InstallerError::Filesystem`].
    #[must_use]
    pub fn from_fs(stage: &'static str, source: FsError) -> Self {
        match source {
            FsError::Resolution { .. } | FsError::Lookup { .. } | FsError::InvalidMode { .. } => {
                Self::Resolution { stage, source }
            }
            _ => Self::Filesystem { stage, source },
        }
    }
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use provision_common::IdKind;
    use std::path::PathBuf;

    #[test]
    fn configuration_error_includes_reason() {
        let err = InstallerError::Configuration {
            reason: "JBOSS_HOME is not set".to_owned(),
        };
        assert!(err.to_string().contains("JBOSS_HOME"));
    }

    #[test]
    fn from_fs_classifies_identity_failures_as_resolution() {
        let err = InstallerError::from_fs(
            "secure",
            FsError::Resolution {
                kind: IdKind::User,
                value: "jboss".to_owned(),
            },
        );
        assert!(matches!(err, InstallerError::Resolution { stage: "secure", .. }));
        let msg = err.to_string();
        assert!(msg.contains("secure"));
        assert!(msg.contains("jboss"));
    }

    #[test]
    fn from_fs_classifies_path_failures_as_filesystem() {
        let err = InstallerError::from_fs(
            "unpack",
            FsError::NotFound {
                path: PathBuf::from("/tmp/scripts/sources/eap.zip"),
            },
        );
        assert!(matches!(err, InstallerError::Filesystem { stage: "unpack", .. }));
        assert!(err.to_string().contains("/tmp/scripts/sources/eap.zip"));
        // Verify the source error is preserved via the Error trait
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn stage_order_error_names_stage_and_state() {
        let err = InstallerError::StageOrder {
            stage: "secure",
            state: "uninitialized",
        };
        let msg = err.to_string();
        assert!(msg.contains("secure"));
        assert!(msg.contains("uninitialized"));
    }

    #[test]
    fn patch_error_includes_patch_name() {
        let err = InstallerError::Patch {
            patch: "p1".to_owned(),
            reason: "conflicts detected".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("p1"));
        assert!(msg.contains("conflicts detected"));
    }
}
