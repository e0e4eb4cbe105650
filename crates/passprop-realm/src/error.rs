//! Realm branch error types.

use thiserror::Error;

/// Errors raised inside the realm branch.
///
/// The worker folds these into a [`PropagationOutcome`] before exiting, so
/// nothing here ever crosses the process boundary as-is.
///
/// [`PropagationOutcome`]: passprop_core::outcome::PropagationOutcome
#[derive(Debug, Error)]
pub enum RealmError {
    /// The worker process could not be spawned.
    #[error("failed to spawn realm worker: {message}")]
    SpawnFailed {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The worker request could not be encoded or decoded.
    #[error("worker request wire error: {0}")]
    Wire(#[from] serde_json::Error),

    /// The administrative session could not be established.
    #[error("administrative session init failed: {message}")]
    SessionInit { message: String },

    /// The administrative service rejected a command.
    #[error("administrative command rejected: {message}")]
    AdminCommand { message: String },

    /// A value cannot be carried in the administrative query syntax.
    #[error("unrepresentable administrative query argument: {message}")]
    QueryArgument { message: String },

    /// The bounded wait on the worker or a client call expired.
    #[error("realm operation did not complete within {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// Result type for realm branch operations.
pub type RealmResult<T> = Result<T, RealmError>;
