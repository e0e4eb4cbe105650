//! # passprop-core
//!
//! Core domain types for the passprop credential propagation engine.
//!
//! When a principal's password changes in the hosting directory, the engine
//! mirrors the new credential into a Kerberos-style realm and a
//! Windows-compatible hashed-credential attribute, and hands the directory a
//! list of attribute modifications to apply atomically. This crate holds
//! everything both branches share:
//!
//! - [`directory`] - entry data model and the collaborator traits the
//!   hosting server implements
//! - [`nthash`] - the legacy NT hash generator
//! - [`modlist`] - attribute modification records and the per-request list
//! - [`principal`] - realm principal naming conventions
//! - [`config`] - module configuration, validation, and snapshots
//! - [`outcome`] / [`error`] - the propagation outcome vocabulary and error
//!   taxonomy
//!
//! The realm branch itself (process isolation, administrative client) lives
//! in `passprop-realm`; the interceptor wiring lives in `passprop-overlay`.

pub mod config;
pub mod directory;
pub mod error;
pub mod modlist;
pub mod nthash;
pub mod outcome;
pub mod principal;

/// Prelude module for convenient imports.
///
/// ```
/// use passprop_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{
        BranchMode, ConfigError, ConfigRegistry, ConfigResult, ConfigSnapshot, ModuleConfig,
        RealmAttributes, SambaAttributes, WorkerSettings,
    };
    pub use crate::directory::{
        AttributeDescriptor, AttributeValue, DirectoryEntry, DirectoryError, DirectoryResult,
        DirectoryStore, MemoryDirectory, MemorySchema, ObjectClassRef, SchemaResolver,
    };
    pub use crate::error::{PropagationError, PropagationResult};
    pub use crate::modlist::{AttributeModification, ModOp, ModificationList};
    pub use crate::nthash::{nt_hash, MAX_PASSWORD_CHARS};
    pub use crate::outcome::PropagationOutcome;
    pub use crate::principal::{admin_principal, user_principal, AdminAuth};
}

// Re-export async_trait for collaborator implementors.
pub use async_trait::async_trait;
