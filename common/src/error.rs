//! Error types for identity resolution and filesystem mutation.
//!
//! Every variant names the offending input or path so a failure can be
//! diagnosed from the message alone.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which half of an ownership pair is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    /// A user (owner) reference.
    User,
    /// A group reference.
    Group,
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Group => f.write_str("group"),
        }
    }
}

/// Errors raised by the primitives in this crate.
#[derive(Debug, Error)]
pub enum FsError {
    /// Neither symbolic lookup nor numeric parsing produced an id.
    #[error("cannot resolve {kind} \"{value}\": no such {kind} and not a usable numeric id")]
    Resolution {
        /// User or group.
        kind: IdKind,
        /// The reference exactly as supplied.
        value: String,
    },

    /// The identity database itself could not be queried.
    #[error("{kind} database lookup for \"{value}\" failed: {source}")]
    Lookup {
        /// User or group.
        kind: IdKind,
        /// The reference being looked up.
        value: String,
        /// Underlying error reported by the system.
        source: io::Error,
    },

    /// A permission mode string could not be parsed.
    #[error("invalid mode \"{value}\": {reason}")]
    InvalidMode {
        /// The mode string as supplied.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A path required by an operation does not exist.
    #[error("path not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// A content-level filesystem operation failed.
    #[error("{operation} failed for {}: {source}", path.display())]
    Filesystem {
        /// Short name of the operation (`copy`, `move`, ...).
        operation: &'static str,
        /// The path the operation was acting on.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Changing ownership or permissions failed.
    #[error("{operation} failed for {}: {source}", path.display())]
    Attribute {
        /// `chown` or `chmod`.
        operation: &'static str,
        /// The entry whose attributes could not be changed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Enumerating a subtree failed part-way.
    #[error("failed to walk {}: {source}", root.display())]
    Walk {
        /// Root of the walk.
        root: PathBuf,
        /// Underlying traversal error.
        source: walkdir::Error,
    },
}

impl FsError {
    /// Wraps an I/O error, mapping `NotFound` onto [`FsError::NotFound`].
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            return Self::NotFound { path };
        }
        Self::Filesystem {
            operation,
            path,
            source,
        }
    }
}

/// Result type alias using [`FsError`].
pub type Result<T> = std::result::Result<T, FsError>;
