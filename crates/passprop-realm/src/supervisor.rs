//! Credential propagation supervisor.
//!
//! The administrative client holds realm-wide mutable state that must never
//! be shared across concurrent invocations inside one long-lived server
//! process, so the realm branch runs in a worker process of its own. The
//! parent passes the request over stdin, blocks on the worker bounded by a
//! hard timeout, and interprets nothing but the exit status.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, instrument, warn};

use passprop_core::config::{ConfigSnapshot, WorkerSettings};
use passprop_core::outcome::PropagationOutcome;

use crate::wire::WorkerRequest;

/// Name of the worker executable, expected next to the hosting binary when
/// no explicit command is configured.
pub const WORKER_BIN: &str = "passprop-realm-worker";

/// The realm side of a password change, as seen by the interceptor.
#[async_trait]
pub trait RealmBranch: Send + Sync {
    /// Run the realm branch once for this request. At most one attempt; no
    /// retries.
    async fn propagate(&self, identity: Option<&str>, password: &str) -> PropagationOutcome;
}

/// Resolved settings the supervisor needs for one backend instance.
#[derive(Debug, Clone)]
pub struct RealmSettings {
    pub realm: String,
    pub admin_principal: String,
    pub auth: passprop_core::principal::AdminAuth,
    pub worker: WorkerSettings,
}

impl RealmSettings {
    /// Extract realm settings from a validated configuration snapshot.
    ///
    /// Returns `None` when the realm branch is disabled.
    #[must_use]
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Option<Self> {
        if !snapshot.mode.realm {
            return None;
        }
        Some(Self {
            realm: snapshot.config.realm_name.clone()?,
            admin_principal: snapshot.config.admin_principal.clone()?,
            auth: snapshot.config.admin_auth.clone(),
            worker: snapshot.config.worker.clone(),
        })
    }
}

/// Supervises one isolated worker run per password-change request.
pub struct RealmSupervisor {
    settings: RealmSettings,
}

impl RealmSupervisor {
    #[must_use]
    pub fn new(settings: RealmSettings) -> Self {
        Self { settings }
    }

    fn worker_command(&self) -> PathBuf {
        if let Some(command) = &self.settings.worker.command {
            return command.clone();
        }
        // Default: the worker installed next to the hosting executable.
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(WORKER_BIN)))
            .unwrap_or_else(|| PathBuf::from(WORKER_BIN))
    }

    fn build_request(&self, identity: Option<&str>, password: &str) -> WorkerRequest {
        let timeout = self.settings.worker.timeout_secs;
        WorkerRequest {
            identity: identity.map(str::to_string),
            password: password.to_string(),
            realm: self.settings.realm.clone(),
            admin_principal: self.settings.admin_principal.clone(),
            auth: self.settings.auth.clone(),
            // Shorter than the supervisor bound so a hang resolves inside
            // the worker first.
            deadline_secs: timeout.saturating_sub(1).max(1),
        }
    }

    async fn spawn_and_wait(&self, request: &WorkerRequest) -> PropagationOutcome {
        let command = self.worker_command();
        let timeout_secs = self.settings.worker.timeout_secs;

        let mut child = match Command::new(&command)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                // Resource exhaustion, process-table limits, platform
                // without subprocess support: all fatal for this request.
                error!(command = %command.display(), %err, "failed to spawn realm worker");
                return PropagationOutcome::LocalError;
            }
        };
        debug!(pid = child.id(), "spawned realm worker");

        let payload = match serde_json::to_vec(request) {
            Ok(payload) => payload,
            Err(err) => {
                error!(%err, "failed to encode worker request");
                let _ = child.start_kill();
                let _ = child.wait().await;
                return PropagationOutcome::LocalError;
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            // A worker that died before reading gives a broken pipe here;
            // the exit status below tells the real story.
            if let Err(err) = stdin.write_all(&payload).await {
                debug!(%err, "worker stdin write failed");
            }
        }

        match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await {
            Ok(Ok(status)) => map_exit_status(status),
            Ok(Err(err)) => {
                error!(%err, "failed waiting on realm worker");
                PropagationOutcome::LocalError
            }
            Err(_) => {
                warn!(timeout_secs, "realm worker did not complete in time, killing it");
                let _ = child.start_kill();
                let _ = child.wait().await;
                PropagationOutcome::LocalError
            }
        }
    }
}

/// Map the worker's exit status to an outcome.
///
/// "Exited with code N" and "terminated by signal N" are different events;
/// only a normal exit carries an outcome code, any signal death is a local
/// error.
fn map_exit_status(status: std::process::ExitStatus) -> PropagationOutcome {
    match status.code() {
        Some(code) => {
            let outcome = PropagationOutcome::from_exit_code(code);
            debug!(code, %outcome, "realm worker exited");
            outcome
        }
        None => {
            #[cfg(unix)]
            {
                use std::os::unix::process::ExitStatusExt;
                warn!(signal = status.signal(), "realm worker killed by signal");
            }
            #[cfg(not(unix))]
            warn!("realm worker terminated abnormally");
            PropagationOutcome::LocalError
        }
    }
}

#[async_trait]
impl RealmBranch for RealmSupervisor {
    #[instrument(skip_all, fields(realm = %self.settings.realm))]
    async fn propagate(&self, identity: Option<&str>, password: &str) -> PropagationOutcome {
        let request = self.build_request(identity, password);
        self.spawn_and_wait(&request).await
    }
}
