//! # passprop-realm
//!
//! The process-isolated realm branch of the passprop engine.
//!
//! The Kerberos administrative client carries realm-wide mutable state that
//! is unsafe to share inside a long-lived multi-threaded server, so every
//! propagation attempt runs in a dedicated worker process:
//!
//! - [`supervisor`] - spawns the worker, enforces the hard timeout, and
//!   maps its exit status to an outcome
//! - [`worker`] - the logic that runs inside the child: resolve identity,
//!   open an administrative session, create-or-update the principal
//! - [`client`] - the administrative session contract
//! - [`kadmin`] - the shipped client, driving the MIT `kadmin` CLI
//! - [`wire`] - the stdin request / exit-status protocol between the two
//!
//! The crate also builds the `passprop-realm-worker` binary that the
//! supervisor spawns.

pub mod client;
pub mod error;
pub mod kadmin;
pub mod supervisor;
pub mod wire;
pub mod worker;

pub use client::{CreateOutcome, RealmAdmin, RealmAdminFactory};
pub use error::{RealmError, RealmResult};
pub use kadmin::{KadminClient, KadminFactory};
pub use supervisor::{RealmBranch, RealmSettings, RealmSupervisor, WORKER_BIN};
pub use wire::WorkerRequest;
