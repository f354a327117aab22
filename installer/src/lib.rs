//! Distribution installer library.
//!
//! This crate unpacks an application-server distribution archive into an
//! installation target, applies patches through the server's management
//! CLI, and secures the result with recursive ownership and permission
//! changes. It is used by the `provision-installer` CLI binary and can be
//! driven programmatically with substitute collaborators for testing.
//!
//! # Modules
//!
//! - [`archive`] - Archive listing, root selection and `unzip` extraction
//! - [`artifacts`] - Logical artifact names and their paths
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Installer configuration and environment lookup
//! - [`error`] - Error types naming the failing stage and path
//! - [`executor`] - External command execution
//! - [`management`] - Management CLI sessions
//! - [`manifest`] - TOML artifact manifest
//! - [`output`] - Progress, summary and dry-run formatting
//! - [`pipeline`] - Unpack, patch and secure stage orchestration

pub mod archive;
pub mod artifacts;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod management;
pub mod manifest;
pub mod output;
pub mod pipeline;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
