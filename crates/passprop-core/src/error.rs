//! Engine-wide error taxonomy.
//!
//! Every external-call failure is translated into one of these kinds and
//! returned to the caller unchanged. A failed realm branch must surface as
//! the realm branch's own kind, never silently downgraded, so operators can
//! tell "the realm service said no" from "the realm service never answered".

use thiserror::Error;

use crate::outcome::PropagationOutcome;

/// Error returned by a password-change propagation.
#[derive(Debug, Error)]
pub enum PropagationError {
    /// The target entry does not exist under the overlay's own access path.
    #[error("entry not found: {entry_id}")]
    EntryNotFound { entry_id: String },

    /// The caller may not write the credential attribute of the entry.
    #[error("insufficient access to modify credential of {entry_id}")]
    AccessDenied { entry_id: String },

    /// The configured required object class is absent from the entry.
    ///
    /// Gating failure; reported as a parameter error with zero side effects.
    #[error("entry {entry_id} lacks required object class '{object_class}'")]
    RequiredClassMissing {
        entry_id: String,
        object_class: String,
    },

    /// The entry carries no identity attribute for the realm principal.
    #[error("identity attribute not found on entry {entry_id}")]
    IdentityNotFound { entry_id: String },

    /// The realm administrative service could not be reached.
    #[error("realm administrative connection failed for {entry_id}")]
    ConnectError { entry_id: String },

    /// The realm administrative service rejected the operation.
    #[error("realm administrative service rejected the change for {entry_id}")]
    AdminRejected { entry_id: String },

    /// Spawn, allocation, or timeout failure on our side.
    #[error("local resource failure: {message}")]
    LocalError { message: String },
}

impl PropagationError {
    /// Build the error matching a non-success realm branch outcome.
    #[must_use]
    pub fn from_outcome(outcome: PropagationOutcome, entry_id: &str) -> Self {
        let entry_id = entry_id.to_string();
        match outcome {
            PropagationOutcome::Success => PropagationError::LocalError {
                message: format!("success outcome treated as error for {entry_id}"),
            },
            PropagationOutcome::AccessDenied => PropagationError::AccessDenied { entry_id },
            PropagationOutcome::IdentityNotFound => {
                PropagationError::IdentityNotFound { entry_id }
            }
            PropagationOutcome::ConnectError => PropagationError::ConnectError { entry_id },
            PropagationOutcome::AdminRejected => PropagationError::AdminRejected { entry_id },
            PropagationOutcome::LocalError => PropagationError::LocalError {
                message: format!("realm worker failed locally for {entry_id}"),
            },
        }
    }

    /// The exit-code outcome this error corresponds to.
    ///
    /// The outcome vocabulary is the worker's exit protocol, so only
    /// conditions the worker can report have their own outcome. Gating
    /// failures raised before the worker runs (`EntryNotFound`,
    /// `RequiredClassMissing`) fold to [`PropagationOutcome::LocalError`];
    /// callers that need the distinction match on the error variant.
    #[must_use]
    pub fn outcome(&self) -> PropagationOutcome {
        match self {
            PropagationError::EntryNotFound { .. }
            | PropagationError::RequiredClassMissing { .. }
            | PropagationError::LocalError { .. } => PropagationOutcome::LocalError,
            PropagationError::AccessDenied { .. } => PropagationOutcome::AccessDenied,
            PropagationError::IdentityNotFound { .. } => PropagationOutcome::IdentityNotFound,
            PropagationError::ConnectError { .. } => PropagationOutcome::ConnectError,
            PropagationError::AdminRejected { .. } => PropagationOutcome::AdminRejected,
        }
    }
}

/// Result type for propagation operations.
pub type PropagationResult<T> = Result<T, PropagationError>;
