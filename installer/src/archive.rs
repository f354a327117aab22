//! Distribution archive inspection and extraction.
//!
//! The archive is listed in process to find its single top-level directory
//! and to reject entries that would escape the extraction directory. The
//! extraction itself is delegated to the `unzip` tool through a
//! [`CommandExecutor`].

use crate::executor::{CommandExecutor, run_checked};
use camino::Utf8Path;
use std::collections::BTreeSet;
use std::path::{Component, Path};

/// Errors arising from archive inspection or extraction.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// I/O error while opening the archive.
    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive could not be read as a zip file.
    #[error("unreadable archive: {0}")]
    Unreadable(#[from] zip::result::ZipError),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no entries.
    #[error("archive contains no entries")]
    Empty,

    /// The archive has more than one top-level entry.
    #[error("expected a single top-level directory, found {}", .roots.join(", "))]
    Ambiguous {
        /// The distinct top-level names, sorted.
        roots: Vec<String>,
    },

    /// The `unzip` tool failed.
    #[error("{0}")]
    Tool(String),
}

/// Result of looking for the distribution root among archive entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSelection {
    /// Every entry lives under this one top-level name.
    Single(String),
    /// No entries were given.
    Empty,
    /// Entries live under several top-level names, sorted.
    Ambiguous(Vec<String>),
}

/// Picks the single top-level name shared by `entry_names`.
///
/// Leading `./` and `/` are ignored when computing the first component.
///
/// # Examples
///
/// ```
/// use provision_installer::archive::{RootSelection, select_distribution_root};
///
/// let selection = select_distribution_root(["jboss-eap-7.4/", "jboss-eap-7.4/bin/standalone.sh"]);
/// assert_eq!(selection, RootSelection::Single("jboss-eap-7.4".to_owned()));
/// ```
pub fn select_distribution_root<'a>(
    entry_names: impl IntoIterator<Item = &'a str>,
) -> RootSelection {
    let roots: BTreeSet<&str> = entry_names
        .into_iter()
        .filter_map(|name| name.split('/').find(|part| !part.is_empty() && *part != "."))
        .collect();

    let mut roots = roots.into_iter();
    match (roots.next(), roots.next()) {
        (None, _) => RootSelection::Empty,
        (Some(root), None) => RootSelection::Single(root.to_owned()),
        (Some(first), Some(second)) => RootSelection::Ambiguous(
            [first, second]
                .into_iter()
                .chain(roots)
                .map(str::to_owned)
                .collect(),
        ),
    }
}

/// Lists the entry names of the zip archive at `archive`.
///
/// # Errors
///
/// Returns [`ArchiveError::PathTraversal`] for absolute or `..` entries, or
/// an I/O or zip error when the archive cannot be read.
pub fn list_entries(archive: &Path) -> Result<Vec<String>, ArchiveError> {
    let file = std::fs::File::open(archive)?;
    let zip = zip::ZipArchive::new(file)?;
    let names: Vec<String> = zip.file_names().map(str::to_owned).collect();
    for name in &names {
        validate_entry_path(Path::new(name))?;
    }
    Ok(names)
}

/// Returns the top-level directory name of the archive at `archive`.
///
/// # Errors
///
/// Returns [`ArchiveError::Empty`] or [`ArchiveError::Ambiguous`] unless
/// exactly one top-level name exists, plus any error from [`list_entries`].
pub fn distribution_root(archive: &Path) -> Result<String, ArchiveError> {
    let entries = list_entries(archive)?;
    match select_distribution_root(entries.iter().map(String::as_str)) {
        RootSelection::Single(root) => Ok(root),
        RootSelection::Empty => Err(ArchiveError::Empty),
        RootSelection::Ambiguous(roots) => Err(ArchiveError::Ambiguous { roots }),
    }
}

/// Extracts archives by running `unzip -q <archive> -d <dest>`.
pub struct UnzipExtractor<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> UnzipExtractor<'a> {
    /// Creates an extractor that runs `unzip` through `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }

    /// Extracts `archive` into the existing directory `dest_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Tool`] when `unzip` cannot be run or exits
    /// unsuccessfully.
    pub fn extract(&self, archive: &Utf8Path, dest_dir: &Utf8Path) -> Result<(), ArchiveError> {
        run_checked(
            self.executor,
            "unzip",
            &["-q", archive.as_str(), "-d", dest_dir.as_str()],
        )
        .map(drop)
        .map_err(|err| ArchiveError::Tool(err.to_string()))
    }
}

/// Validate that an archive entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ArchiveError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir));
    if escapes {
        return Err(ArchiveError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}
