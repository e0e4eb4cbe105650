//! Realm administrative client contract.
//!
//! The administrative wire protocol itself is out of scope; implementations
//! wrap whatever the deployment provides (the shipped one drives the MIT
//! `kadmin` CLI, see [`crate::kadmin`]). Clients run exclusively inside the
//! isolated worker process.

use async_trait::async_trait;

use crate::error::RealmResult;
use crate::wire::WorkerRequest;

/// Result of a create-principal attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The principal was created with the new credential.
    Created,
    /// The principal already exists; the caller falls back to a password
    /// change.
    AlreadyExists,
}

/// An authenticated administrative session with the realm service.
#[async_trait]
pub trait RealmAdmin: Send {
    /// Create the principal with the new credential and
    /// pre-authentication required.
    async fn create_principal(
        &mut self,
        principal: &str,
        password: &str,
    ) -> RealmResult<CreateOutcome>;

    /// Change the password of an existing principal.
    async fn change_password(&mut self, principal: &str, password: &str) -> RealmResult<()>;

    /// Release administrative-session resources. Invoked on every worker
    /// path; a failure here is logged, never escalated over the primary
    /// result.
    async fn close(&mut self) -> RealmResult<()>;
}

/// Opens administrative sessions for worker runs.
#[async_trait]
pub trait RealmAdminFactory: Send + Sync {
    type Client: RealmAdmin;

    /// Initialize the client context and administrative session for this
    /// request.
    async fn connect(&self, request: &WorkerRequest) -> RealmResult<Self::Client>;
}
