//! Host-level building blocks for provisioning an application-server
//! distribution.
//!
//! # Modules
//!
//! - [`identity`] - Two-step resolution of user and group references
//! - [`mode`] - Permission modes and integer literal parsing
//! - [`fsops`] - Copy, link, move and remove with parent creation
//! - [`attributes`] - Recursive ownership and permission changes
//! - [`error`] - Error types carrying the offending path or value

pub mod attributes;
pub mod error;
pub mod fsops;
pub mod identity;
pub mod mode;

pub use attributes::{AttributeBackend, AttributeMutator, AttributeReport, SystemAttributes};
pub use error::{FsError, IdKind, Result};
pub use identity::{
    IdSource, Identity, IdentityDatabase, ResolvedId, SystemIdentityDatabase, resolve_group,
    resolve_identity, resolve_user,
};
pub use mode::Mode;
