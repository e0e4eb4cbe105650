//! Propagation outcomes and their cross-process encoding.
//!
//! The realm branch runs in a separate process and reports back exactly one
//! outcome, carried as the worker's exit status. The encoding below is the
//! only contract between supervisor and worker, so it is deliberately small
//! and stable.

use serde::{Deserialize, Serialize};

/// Final outcome of one propagation branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationOutcome {
    /// The external store accepted the new credential.
    Success,
    /// The caller may not modify the credential attribute.
    AccessDenied,
    /// The entry carries no identity attribute to name the principal after.
    IdentityNotFound,
    /// The administrative service could not be reached or refused the session.
    ConnectError,
    /// The administrative service answered but rejected the operation.
    AdminRejected,
    /// Fork, allocation, or timeout failure on our side.
    LocalError,
}

impl PropagationOutcome {
    /// Exit code used when the outcome crosses the worker process boundary.
    ///
    /// Codes start at 10 so they cannot collide with the generic 1/2 exit
    /// statuses a shell or the runtime itself may produce.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            PropagationOutcome::Success => 0,
            PropagationOutcome::AccessDenied => 10,
            PropagationOutcome::IdentityNotFound => 11,
            PropagationOutcome::ConnectError => 12,
            PropagationOutcome::AdminRejected => 13,
            PropagationOutcome::LocalError => 14,
        }
    }

    /// Decode a worker exit code.
    ///
    /// Anything outside the known vocabulary means the worker died in an
    /// unforeseen way and is treated as a local error.
    #[must_use]
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            0 => PropagationOutcome::Success,
            10 => PropagationOutcome::AccessDenied,
            11 => PropagationOutcome::IdentityNotFound,
            12 => PropagationOutcome::ConnectError,
            13 => PropagationOutcome::AdminRejected,
            _ => PropagationOutcome::LocalError,
        }
    }

    /// Whether this outcome lets the interceptor continue with further work.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, PropagationOutcome::Success)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PropagationOutcome::Success => "success",
            PropagationOutcome::AccessDenied => "access_denied",
            PropagationOutcome::IdentityNotFound => "identity_not_found",
            PropagationOutcome::ConnectError => "connect_error",
            PropagationOutcome::AdminRejected => "admin_rejected",
            PropagationOutcome::LocalError => "local_error",
        }
    }
}

impl std::fmt::Display for PropagationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
