//! Password-change operation interceptor.
//!
//! The entry point the hosting directory invokes for a password-change
//! event. Gating (access, required object class) happens before anything
//! touches an external store; the realm branch then runs to completion
//! before the hash branch, and a realm failure aborts the whole request so
//! the two stores never diverge silently.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use passprop_core::config::ConfigSnapshot;
use passprop_core::directory::{AttributeValue, DirectoryEntry, DirectoryError, DirectoryStore};
use passprop_core::error::{PropagationError, PropagationResult};
use passprop_core::modlist::ModificationList;
use passprop_core::nthash::nt_hash;
use passprop_realm::supervisor::RealmBranch;

/// Credential scheme marker that delegates authentication externally.
const SASL_SCHEME: &str = "{sasl}";

/// One password-change event as delivered by the hosting server.
#[derive(Clone)]
pub struct PasswordChangeRequest {
    /// Target entry identifier.
    pub entry_id: String,
    /// New plaintext credential, explicit length, not assumed terminated.
    pub new_password: String,
}

impl PasswordChangeRequest {
    pub fn new(entry_id: impl Into<String>, new_password: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            new_password: new_password.into(),
        }
    }
}

impl std::fmt::Debug for PasswordChangeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordChangeRequest")
            .field("entry_id", &self.entry_id)
            .field("new_password", &"***")
            .finish()
    }
}

/// The propagation engine for one backend instance.
///
/// Holds a read-only configuration snapshot; concurrent invocations share
/// nothing else, so no locking is involved.
pub struct PasswordPropagator<D, R> {
    snapshot: Arc<ConfigSnapshot>,
    directory: D,
    realm: R,
}

impl<D, R> PasswordPropagator<D, R>
where
    D: DirectoryStore,
    R: RealmBranch,
{
    pub fn new(snapshot: Arc<ConfigSnapshot>, directory: D, realm: R) -> Self {
        Self {
            snapshot,
            directory,
            realm,
        }
    }

    /// Handle one password-change event.
    ///
    /// Side effects are expressed solely as modifications appended to
    /// `mods`; realm-branch modifications, if any, precede hash-branch
    /// modifications. On error the list holds whatever was queued before
    /// the failing step, which for a realm failure is nothing.
    #[instrument(skip_all, fields(entry = %request.entry_id))]
    pub async fn propagate(
        &self,
        request: &PasswordChangeRequest,
        mods: &mut ModificationList,
    ) -> PropagationResult<()> {
        self.propagate_at(request, mods, Utc::now().timestamp()).await
    }

    /// [`propagate`](Self::propagate) with a caller-supplied clock reading,
    /// for deterministic timestamp handling.
    pub async fn propagate_at(
        &self,
        request: &PasswordChangeRequest,
        mods: &mut ModificationList,
        now: i64,
    ) -> PropagationResult<()> {
        // Re-read under the overlay's own access path, not the caller's.
        let entry = self
            .directory
            .entry_for_read(&request.entry_id)
            .await
            .map_err(|err| match err {
                DirectoryError::EntryNotFound { entry_id } => {
                    PropagationError::EntryNotFound { entry_id }
                }
                other => PropagationError::LocalError {
                    message: other.to_string(),
                },
            })?;

        if !self.directory.credential_write_allowed(&entry).await {
            return Err(PropagationError::AccessDenied {
                entry_id: entry.id().to_string(),
            });
        }

        if let Some(required) = &self.snapshot.required_object_class {
            if !entry.has_object_class(required) {
                warn!(class = required.name(), "entry lacks required object class");
                return Err(PropagationError::RequiredClassMissing {
                    entry_id: entry.id().to_string(),
                    object_class: required.name().to_string(),
                });
            }
        }

        if self.snapshot.mode.realm {
            self.run_realm_branch(&entry, request, mods).await?;
        }

        if self.snapshot.mode.samba {
            self.run_samba_branch(&entry, request, mods, now)?;
        }

        Ok(())
    }

    /// The realm branch: one supervised attempt; failure aborts the whole
    /// request so the hash branch never runs against a stale realm store.
    async fn run_realm_branch(
        &self,
        entry: &DirectoryEntry,
        request: &PasswordChangeRequest,
        mods: &mut ModificationList,
    ) -> PropagationResult<()> {
        let attrs = self.snapshot.realm_attrs.as_ref().ok_or_else(|| {
            PropagationError::LocalError {
                message: "realm branch enabled without resolved attributes".to_string(),
            }
        })?;

        let identity = entry
            .first_value(&attrs.uid)
            .and_then(AttributeValue::as_str);

        let outcome = self
            .realm
            .propagate(identity, &request.new_password)
            .await;
        info!(%outcome, "realm branch finished");
        if !outcome.is_success() {
            return Err(PropagationError::from_outcome(outcome, entry.id()));
        }

        if self.snapshot.config.keep_identity_scheme {
            if let Some(old) = entry.first_value(&attrs.user_password) {
                if old.starts_with_ignore_ascii_case(SASL_SCHEME) {
                    debug!("reinstating external identity scheme marker");
                    mods.replace(&attrs.user_password, [old.clone()]);
                }
            }
        }

        Ok(())
    }

    /// The hash branch: queue the NT hash and the timestamp attributes for
    /// entries carrying the Samba account class.
    fn run_samba_branch(
        &self,
        entry: &DirectoryEntry,
        request: &PasswordChangeRequest,
        mods: &mut ModificationList,
        now: i64,
    ) -> PropagationResult<()> {
        let attrs = self.snapshot.samba_attrs.as_ref().ok_or_else(|| {
            PropagationError::LocalError {
                message: "hash branch enabled without resolved attributes".to_string(),
            }
        })?;

        if !entry.has_object_class(&attrs.sam_account) {
            debug!("entry is not a Samba account, skipping hash branch");
            return Ok(());
        }

        mods.replace(&attrs.nt_password, [nt_hash(&request.new_password)]);
        mods.replace(&attrs.pwd_last_set, [now.to_string()]);

        let config = &self.snapshot.config;
        if config.must_change_secs != 0 {
            mods.replace(
                &attrs.pwd_must_change,
                [(now + config.must_change_secs).to_string()],
            );
        }
        if config.can_change_secs != 0 {
            mods.replace(
                &attrs.pwd_can_change,
                [(now + config.can_change_secs).to_string()],
            );
        }

        Ok(())
    }
}
