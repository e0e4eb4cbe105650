//! # passprop-overlay
//!
//! Password-change interceptor for the passprop propagation engine.
//!
//! Wires the two propagation branches behind a single entry point the
//! hosting directory server calls for each password-change event: the
//! process-isolated realm branch (`passprop-realm`) runs first, then the
//! Samba-compatible hash branch, and the combined side effects come back as
//! an ordered modification list for the server to apply atomically.
//!
//! ```no_run
//! use std::sync::Arc;
//! use passprop_core::prelude::*;
//! use passprop_overlay::{PasswordChangeRequest, PasswordPropagator};
//! use passprop_realm::{RealmSettings, RealmSupervisor};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = ConfigRegistry::new(MemorySchema::new());
//! registry.set_option("realm-name", &["EXAMPLE.ORG"])?;
//! let snapshot = registry.snapshot()?;
//!
//! let realm = RealmSupervisor::new(RealmSettings::from_snapshot(&snapshot).unwrap());
//! let directory = MemoryDirectory::new();
//! let propagator = PasswordPropagator::new(snapshot, directory, realm);
//!
//! let mut mods = ModificationList::new();
//! propagator
//!     .propagate(&PasswordChangeRequest::new("uid=jdoe,ou=people", "hunter2"), &mut mods)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod interceptor;

pub use interceptor::{PasswordChangeRequest, PasswordPropagator};
