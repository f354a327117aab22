//! User and group resolution.
//!
//! A reference such as `"jboss"` or `"185"` is resolved in two explicit
//! steps: a symbolic lookup in the identity database, then a numeric parse.
//! The outcome records which step produced the id.

use crate::error::{FsError, IdKind, Result};
use crate::mode::parse_int_literal;
use nix::unistd::{Group, User};
use std::io;

/// Lookup of symbolic user and group names.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityDatabase {
    /// Returns the uid for `name`, or `None` when no such user exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be queried.
    fn user_id(&self, name: &str) -> io::Result<Option<u32>>;

    /// Returns the gid for `name`, or `None` when no such group exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be queried.
    fn group_id(&self, name: &str) -> io::Result<Option<u32>>;
}

/// Identity database backed by the host's passwd and group databases.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentityDatabase;

impl IdentityDatabase for SystemIdentityDatabase {
    fn user_id(&self, name: &str) -> io::Result<Option<u32>> {
        let user = User::from_name(name).map_err(io::Error::from)?;
        Ok(user.map(|u| u.uid.as_raw()))
    }

    fn group_id(&self, name: &str) -> io::Result<Option<u32>> {
        let group = Group::from_name(name).map_err(io::Error::from)?;
        Ok(group.map(|g| g.gid.as_raw()))
    }
}

/// Which resolution step produced an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    /// Found by name in the identity database.
    Symbolic,
    /// Parsed as an integer literal.
    Numeric,
}

/// A resolved numeric id together with how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedId {
    /// The numeric uid or gid.
    pub id: u32,
    /// Which step produced it.
    pub source: IdSource,
}

/// A numeric ownership pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Owner uid.
    pub uid: u32,
    /// Group gid.
    pub gid: u32,
}

/// Resolves a user reference to a uid.
///
/// # Errors
///
/// Returns [`FsError::Resolution`] when the reference is neither a known user
/// nor an integer literal, or is the literal `4294967295` that the system
/// treats as "no change", and [`FsError::Lookup`] when the database fails.
pub fn resolve_user(db: &dyn IdentityDatabase, reference: &str) -> Result<ResolvedId> {
    resolve(IdKind::User, reference, |name| db.user_id(name))
}

/// Resolves a group reference to a gid.
///
/// # Errors
///
/// Returns [`FsError::Resolution`] when the reference is neither a known group
/// nor an integer literal, and [`FsError::Lookup`] when the database fails.
pub fn resolve_group(db: &dyn IdentityDatabase, reference: &str) -> Result<ResolvedId> {
    resolve(IdKind::Group, reference, |name| db.group_id(name))
}

/// Resolves both halves of an ownership pair.
///
/// # Errors
///
/// Propagates the first resolution failure, user first.
pub fn resolve_identity(db: &dyn IdentityDatabase, owner: &str, group: &str) -> Result<Identity> {
    let uid = resolve_user(db, owner)?.id;
    let gid = resolve_group(db, group)?.id;
    Ok(Identity { uid, gid })
}

/// `(uid_t)-1`, which `chown(2)` reads as "leave this id unchanged".
const UNCHANGED_ID: u32 = u32::MAX;

fn resolve(
    kind: IdKind,
    reference: &str,
    lookup: impl FnOnce(&str) -> io::Result<Option<u32>>,
) -> Result<ResolvedId> {
    let symbolic = lookup(reference).map_err(|source| FsError::Lookup {
        kind,
        value: reference.to_owned(),
        source,
    })?;
    if let Some(id) = symbolic {
        return Ok(ResolvedId {
            id,
            source: IdSource::Symbolic,
        });
    }
    match parse_int_literal(reference).filter(|id| *id != UNCHANGED_ID) {
        Some(id) => Ok(ResolvedId {
            id,
            source: IdSource::Numeric,
        }),
        None => Err(FsError::Resolution {
            kind,
            value: reference.to_owned(),
        }),
    }
}
