//! `kadmin` CLI-backed realm administrative client.
//!
//! Drives the MIT Kerberos administration tool instead of linking the
//! kadm5 library; each command is its own short-lived process, which fits
//! the one-request-per-worker isolation model. The authentication
//! convention comes from [`AdminAuth`]: keytab-authenticated service
//! principal, password-authenticated fixed administrator, or the co-located
//! `kadmin.local`.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use passprop_core::principal::AdminAuth;

use crate::client::{CreateOutcome, RealmAdmin, RealmAdminFactory};
use crate::error::{RealmError, RealmResult};
use crate::wire::WorkerRequest;

/// Administrative session driving the `kadmin` / `kadmin.local` CLI.
pub struct KadminClient {
    realm: String,
    admin_principal: String,
    auth: AdminAuth,
}

impl KadminClient {
    #[must_use]
    pub fn new(realm: impl Into<String>, admin_principal: impl Into<String>, auth: AdminAuth) -> Self {
        Self {
            realm: realm.into(),
            admin_principal: admin_principal.into(),
            auth,
        }
    }

    /// Program and arguments for one administrative query.
    fn query_args(&self, query: &str) -> (&'static str, Vec<String>) {
        let mut args = vec!["-r".to_string(), self.realm.clone()];
        let program = match &self.auth {
            AdminAuth::ServiceKeytab { keytab } => {
                args.extend([
                    "-p".to_string(),
                    self.admin_principal.clone(),
                    "-k".to_string(),
                    "-t".to_string(),
                    keytab.display().to_string(),
                ]);
                "kadmin"
            }
            AdminAuth::FixedAdmin {
                password: Some(password),
            } => {
                args.extend([
                    "-p".to_string(),
                    self.admin_principal.clone(),
                    "-w".to_string(),
                    password.clone(),
                ]);
                "kadmin"
            }
            AdminAuth::FixedAdmin { password: None } => "kadmin.local",
        };
        args.extend(["-q".to_string(), query.to_string()]);
        (program, args)
    }

    async fn run_query(&self, query: &str) -> RealmResult<std::process::Output> {
        let (program, args) = self.query_args(query);
        debug!(program, "running administrative query");
        Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| RealmError::SessionInit {
                message: format!("could not run {program}: {e}"),
            })
    }
}

/// Quote one value for the `-q` query line.
///
/// kadmin splits the query on whitespace but honors double quotes, so every
/// value is quoted; a password with spaces must stay a single token or its
/// tail would be read as the principal argument. Values the query syntax
/// cannot carry at all are rejected before anything is spawned.
fn quote_query_arg(value: &str) -> RealmResult<String> {
    if value.contains(['"', '\\', '\n', '\r', '\0']) {
        return Err(RealmError::QueryArgument {
            message: "value contains quote, backslash, or line-break characters".to_string(),
        });
    }
    Ok(format!("\"{value}\""))
}

fn create_query(password: &str, principal: &str) -> RealmResult<String> {
    Ok(format!(
        "add_principal +requires_preauth -pw {} {}",
        quote_query_arg(password)?,
        quote_query_arg(principal)?
    ))
}

fn change_query(password: &str, principal: &str) -> RealmResult<String> {
    Ok(format!(
        "change_password -pw {} {}",
        quote_query_arg(password)?,
        quote_query_arg(principal)?
    ))
}

/// kadmin exits 0 even when a query fails; failures surface only as a
/// `<command>:`-prefixed diagnostic on stderr.
fn query_failed(stderr_lower: &str, command: &str) -> bool {
    stderr_lower.contains("error") || stderr_lower.contains(&format!("{command}:"))
}

fn decode_create(output: &std::process::Output) -> RealmResult<CreateOutcome> {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lower = stderr.to_ascii_lowercase();
    if lower.contains("already exists") {
        return Ok(CreateOutcome::AlreadyExists);
    }
    if output.status.success() && !query_failed(&lower, "add_principal") {
        return Ok(CreateOutcome::Created);
    }
    Err(command_error(&stderr))
}

fn decode_change(output: &std::process::Output) -> RealmResult<()> {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if output.status.success() && !query_failed(&stderr.to_ascii_lowercase(), "change_password") {
        Ok(())
    } else {
        Err(command_error(&stderr))
    }
}

/// Classify a failed command from its stderr text.
fn command_error(stderr: &str) -> RealmError {
    let connectish = ["cannot contact", "communication failure", "cannot resolve",
        "connection refused", "network", "gss-api"];
    let lower = stderr.to_ascii_lowercase();
    if connectish.iter().any(|needle| lower.contains(needle)) {
        RealmError::SessionInit {
            message: stderr.trim().to_string(),
        }
    } else {
        RealmError::AdminCommand {
            message: stderr.trim().to_string(),
        }
    }
}

#[async_trait]
impl RealmAdmin for KadminClient {
    #[instrument(skip(self, password))]
    async fn create_principal(
        &mut self,
        principal: &str,
        password: &str,
    ) -> RealmResult<CreateOutcome> {
        let query = create_query(password, principal)?;
        let output = self.run_query(&query).await?;
        decode_create(&output)
    }

    #[instrument(skip(self, password))]
    async fn change_password(&mut self, principal: &str, password: &str) -> RealmResult<()> {
        let query = change_query(password, principal)?;
        let output = self.run_query(&query).await?;
        decode_change(&output)
    }

    async fn close(&mut self) -> RealmResult<()> {
        // Each query ran in its own short-lived process; nothing to tear
        // down beyond making the release point explicit for callers.
        Ok(())
    }
}

/// Factory building [`KadminClient`] sessions from worker requests.
#[derive(Debug, Default)]
pub struct KadminFactory;

#[async_trait]
impl RealmAdminFactory for KadminFactory {
    type Client = KadminClient;

    async fn connect(&self, request: &WorkerRequest) -> RealmResult<Self::Client> {
        if request.realm.is_empty() {
            warn!("empty realm in worker request");
            return Err(RealmError::SessionInit {
                message: "empty realm".to_string(),
            });
        }
        Ok(KadminClient::new(
            request.realm.clone(),
            request.admin_principal.clone(),
            request.auth.clone(),
        ))
    }
}
