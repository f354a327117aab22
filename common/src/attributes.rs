//! Ownership and permission changes, optionally applied to a whole subtree.
//!
//! A recursive change visits every descendant exactly once, contents before
//! their directory, and the base path last. A directory therefore stays
//! searchable until everything below it has been changed, even when the new
//! mode drops the search bit. A recursive call issues
//! `1 + directories + files` attribute changes, one per entry, with no
//! batching.
//!
//! A base path that is itself a symbolic link is resolved once and the
//! change applies to the link target. Links found below the base are never
//! followed.
//!
//! Changes are not transactional: if an entry fails, entries visited before it
//! keep their new attributes. Every change is individually idempotent, so a
//! failed run can simply be repeated.

use crate::error::{FsError, Result};
use crate::identity::{Identity, IdentityDatabase, resolve_identity};
use crate::mode::Mode;
use log::{debug, trace};
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::borrow::Cow;
use std::path::Path;
use walkdir::WalkDir;

/// Applies attribute changes to a single filesystem entry.
#[cfg_attr(test, mockall::automock)]
pub trait AttributeBackend {
    /// Sets the owner and group of `path` without following a final symlink.
    ///
    /// # Errors
    ///
    /// Returns the I/O error reported by the system.
    fn set_owner(&self, path: &Path, identity: Identity) -> io::Result<()>;

    /// Sets the permission bits of `path`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error reported by the system.
    fn set_mode(&self, path: &Path, mode: Mode) -> io::Result<()>;
}

/// Backend that changes attributes on the host filesystem.
///
/// Symbolic links reaching the backend are never followed: ownership is
/// applied to the link itself, and mode changes on a link are skipped since
/// following it could modify an entry outside the subtree.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAttributes;

impl AttributeBackend for SystemAttributes {
    fn set_owner(&self, path: &Path, identity: Identity) -> io::Result<()> {
        std::os::unix::fs::lchown(path, Some(identity.uid), Some(identity.gid))
    }

    fn set_mode(&self, path: &Path, mode: Mode) -> io::Result<()> {
        if fs::symlink_metadata(path)?.file_type().is_symlink() {
            trace!("skipping mode change on symlink {}", path.display());
            return Ok(());
        }
        fs::set_permissions(path, fs::Permissions::from_mode(mode.bits()))
    }
}

/// Number of entries touched by a single `chown` or `chmod` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeReport {
    /// Attribute changes issued, base path included.
    pub entries: usize,
}

/// Resolves identities and modes, then applies them through a backend.
pub struct AttributeMutator<'a> {
    identities: &'a dyn IdentityDatabase,
    backend: &'a dyn AttributeBackend,
}

impl<'a> AttributeMutator<'a> {
    /// Create a mutator from an identity database and an attribute backend.
    #[must_use]
    pub fn new(identities: &'a dyn IdentityDatabase, backend: &'a dyn AttributeBackend) -> Self {
        Self {
            identities,
            backend,
        }
    }

    /// Changes the ownership of `path` to `owner`:`group`.
    ///
    /// `owner` and `group` may be names or integer literals; names win when
    /// both interpretations are possible. Nothing is changed if either fails
    /// to resolve.
    ///
    /// # Errors
    ///
    /// Returns a resolution error, or [`FsError::Attribute`] naming the first
    /// entry that could not be changed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use provision_common::attributes::{AttributeMutator, SystemAttributes};
    /// use provision_common::identity::SystemIdentityDatabase;
    /// use std::borrow::Cow;
    /// use std::path::Path;
    ///
    /// let mutator = AttributeMutator::new(&SystemIdentityDatabase, &SystemAttributes);
    /// let report = mutator.chown("jboss", "jboss", Path::new("/opt/eap"), true)?;
    /// println!("changed {} entries", report.entries);
    /// # Ok::<(), provision_common::FsError>(())
    /// ```
    pub fn chown(
        &self,
        owner: &str,
        group: &str,
        path: &Path,
        recursive: bool,
    ) -> Result<AttributeReport> {
        let identity = resolve_identity(self.identities, owner, group)?;
        self.apply_owner(identity, path, recursive)
    }

    /// Changes the permission bits of `path` to the parsed `mode`.
    ///
    /// Nothing is changed if `mode` does not parse.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::InvalidMode`], or [`FsError::Attribute`] naming the
    /// first entry that could not be changed.
    pub fn chmod(&self, mode: &str, path: &Path, recursive: bool) -> Result<AttributeReport> {
        let mode: Mode = mode.parse()?;
        self.apply_mode(mode, path, recursive)
    }

    /// Applies an already resolved identity.
    ///
    /// # Errors
    ///
    /// See [`AttributeMutator::chown`].
    pub fn apply_owner(
        &self,
        identity: Identity,
        path: &Path,
        recursive: bool,
    ) -> Result<AttributeReport> {
        debug!(
            "chown {}:{} {} (recursive: {recursive})",
            identity.uid,
            identity.gid,
            path.display()
        );
        visit(path, recursive, |entry| {
            self.backend
                .set_owner(entry, identity)
                .map_err(|source| attribute_error("chown", entry, source))
        })
    }

    /// Applies an already parsed mode.
    ///
    /// # Errors
    ///
    /// See [`AttributeMutator::chmod`].
    pub fn apply_mode(&self, mode: Mode, path: &Path, recursive: bool) -> Result<AttributeReport> {
        debug!("chmod {mode} {} (recursive: {recursive})", path.display());
        visit(path, recursive, |entry| {
            self.backend
                .set_mode(entry, mode)
                .map_err(|source| attribute_error("chmod", entry, source))
        })
    }
}

fn attribute_error(operation: &'static str, path: &Path, source: io::Error) -> FsError {
    FsError::Attribute {
        operation,
        path: path.to_path_buf(),
        source,
    }
}

/// Calls `apply` on every descendant of `base` when `recursive` is set and
/// `base` is a directory, then on `base` itself.
fn visit(
    base: &Path,
    recursive: bool,
    mut apply: impl FnMut(&Path) -> Result<()>,
) -> Result<AttributeReport> {
    let root = resolve_base(base)?;
    let mut entries = 1;

    if recursive && root.is_dir() {
        let walk = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(false)
            .contents_first(true);
        for entry in walk {
            let entry = entry.map_err(|source| FsError::Walk {
                root: root.to_path_buf(),
                source,
            })?;
            apply(entry.path())?;
            entries += 1;
        }
    }

    apply(&root)?;
    Ok(AttributeReport { entries })
}

/// Returns the target of `base` when it is a symbolic link, else `base`.
///
/// A missing base is passed through so the backend reports it against the
/// path the caller named.
fn resolve_base(base: &Path) -> Result<Cow<'_, Path>> {
    match fs::symlink_metadata(base) {
        Ok(meta) if meta.file_type().is_symlink() => fs::canonicalize(base)
            .map(Cow::Owned)
            .map_err(|source| FsError::io("resolve", base, source)),
        _ => Ok(Cow::Borrowed(base)),
    }
}

#[cfg(test)]
#[path = "attributes_tests.rs"]
mod tests;
