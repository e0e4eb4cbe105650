//! Realm worker logic. Runs only inside the isolated child process.
//!
//! The worker owns consistency with the realm store: it makes exactly one
//! create-or-change attempt, releases its session on every path, and exits
//! carrying the outcome code. It never returns control to shared parent
//! state.

use std::time::Duration;

use tracing::{error, info, instrument, warn};

use passprop_core::outcome::PropagationOutcome;
use passprop_core::principal::user_principal;

use crate::client::{CreateOutcome, RealmAdmin, RealmAdminFactory};
use crate::error::RealmError;
use crate::wire::WorkerRequest;

/// Run one propagation attempt under the request's own deadline.
///
/// The deadline is a second line of defense under the supervisor's bound: a
/// hang inside the administrative client resolves here instead of waiting
/// for the parent to kill us.
pub async fn run_with_deadline<F: RealmAdminFactory>(
    request: &WorkerRequest,
    factory: &F,
) -> PropagationOutcome {
    let deadline = Duration::from_secs(request.deadline_secs.max(1));
    match tokio::time::timeout(deadline, run(request, factory)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(
                deadline_secs = request.deadline_secs,
                "administrative client hung past the worker deadline"
            );
            PropagationOutcome::LocalError
        }
    }
}

/// One unbounded propagation attempt. No retries.
#[instrument(skip_all, fields(realm = %request.realm))]
pub async fn run<F: RealmAdminFactory>(request: &WorkerRequest, factory: &F) -> PropagationOutcome {
    let Some(identity) = request.identity.as_deref() else {
        warn!("entry carries no identity attribute");
        return PropagationOutcome::IdentityNotFound;
    };

    let mut session = match factory.connect(request).await {
        Ok(session) => session,
        Err(err) => {
            error!(%err, identity, "administrative session init failed");
            return PropagationOutcome::ConnectError;
        }
    };

    let principal = user_principal(identity, &request.realm);
    let outcome = apply(&mut session, &principal, &request.password).await;

    // Session teardown happens on every path and never outranks the
    // primary result.
    if let Err(err) = session.close().await {
        warn!(%err, "administrative session teardown failed");
    }

    outcome
}

async fn apply<C: RealmAdmin>(
    session: &mut C,
    principal: &str,
    password: &str,
) -> PropagationOutcome {
    match session.create_principal(principal, password).await {
        Ok(CreateOutcome::Created) => {
            info!(principal, "created realm principal");
            PropagationOutcome::Success
        }
        Ok(CreateOutcome::AlreadyExists) => {
            match session.change_password(principal, password).await {
                Ok(()) => {
                    info!(principal, "changed realm principal password");
                    PropagationOutcome::Success
                }
                Err(err) => {
                    error!(%err, principal, "password change rejected");
                    outcome_for(&err)
                }
            }
        }
        Err(err) => {
            error!(%err, principal, "principal creation failed");
            outcome_for(&err)
        }
    }
}

fn outcome_for(err: &RealmError) -> PropagationOutcome {
    match err {
        RealmError::SessionInit { .. } => PropagationOutcome::ConnectError,
        RealmError::AdminCommand { .. } => PropagationOutcome::AdminRejected,
        RealmError::Timeout { .. }
        | RealmError::SpawnFailed { .. }
        | RealmError::QueryArgument { .. }
        | RealmError::Wire(_) => PropagationOutcome::LocalError,
    }
}
