//! Realm principal naming.
//!
//! Two administrative conventions are supported, selected at configuration
//! time: a per-host service principal authenticated from an
//! operator-provisioned keytab, or the realm's fixed administrator
//! principal. The derived string is cached in the configuration snapshot
//! and recomputed whenever the realm name changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Service name used for the per-host administrative principal.
pub const ADMIN_SERVICE: &str = "passprop";

/// Fixed administrator principal used by the local-server convention.
pub const FIXED_ADMIN: &str = "root/admin";

/// Default key material path, provisioned by the operator.
pub const DEFAULT_KEYTAB: &str = "/etc/ldap/slapd.d/openldap-krb5.keytab";

fn default_keytab() -> PathBuf {
    PathBuf::from(DEFAULT_KEYTAB)
}

/// How the administrative session authenticates to the realm service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminAuth {
    /// Per-host service principal (`passprop/<host>@<REALM>`) authenticated
    /// from a keytab over the network.
    ServiceKeytab {
        #[serde(default = "default_keytab")]
        keytab: PathBuf,
    },

    /// Fixed administrator principal (`root/admin@<REALM>`). With a
    /// password the session goes over the network; without one the worker
    /// drives the co-located administrative service directly.
    FixedAdmin {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
}

impl Default for AdminAuth {
    fn default() -> Self {
        AdminAuth::ServiceKeytab {
            keytab: default_keytab(),
        }
    }
}

impl AdminAuth {
    /// Redacted view for logging and config read-back.
    #[must_use]
    pub fn redacted(&self) -> Self {
        match self {
            AdminAuth::ServiceKeytab { keytab } => AdminAuth::ServiceKeytab {
                keytab: keytab.clone(),
            },
            AdminAuth::FixedAdmin { password } => AdminAuth::FixedAdmin {
                password: password.as_ref().map(|_| "***REDACTED***".to_string()),
            },
        }
    }
}

/// Derive the administrative principal for a realm.
///
/// `host_override` short-circuits host lookup; otherwise the local host
/// name is used for the service-principal convention.
#[must_use]
pub fn admin_principal(auth: &AdminAuth, realm: &str, host_override: Option<&str>) -> String {
    let principal = match auth {
        AdminAuth::ServiceKeytab { .. } => {
            let host = match host_override {
                Some(h) => h.to_string(),
                None => gethostname::gethostname().to_string_lossy().into_owned(),
            };
            format!("{ADMIN_SERVICE}/{host}@{realm}")
        }
        AdminAuth::FixedAdmin { .. } => format!("{FIXED_ADMIN}@{realm}"),
    };
    debug!(principal = %principal, realm = %realm, "derived administrative principal");
    principal
}

/// Name the account's realm principal: `<identity>@<REALM>`.
#[must_use]
pub fn user_principal(identity: &str, realm: &str) -> String {
    format!("{identity}@{realm}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_principal_uses_host_and_realm() {
        let auth = AdminAuth::default();
        let principal = admin_principal(&auth, "EXAMPLE.ORG", Some("ldap1.example.org"));
        assert_eq!(principal, "passprop/ldap1.example.org@EXAMPLE.ORG");
    }

    #[test]
    fn fixed_admin_ignores_host() {
        let auth = AdminAuth::FixedAdmin { password: None };
        let principal = admin_principal(&auth, "EXAMPLE.ORG", Some("ignored"));
        assert_eq!(principal, "root/admin@EXAMPLE.ORG");
    }

    #[test]
    fn user_principal_format() {
        assert_eq!(user_principal("jdoe", "EXAMPLE.ORG"), "jdoe@EXAMPLE.ORG");
    }

    #[test]
    fn default_auth_points_at_provisioned_keytab() {
        match AdminAuth::default() {
            AdminAuth::ServiceKeytab { keytab } => {
                assert_eq!(keytab, PathBuf::from(DEFAULT_KEYTAB));
            }
            other => panic!("unexpected default auth: {other:?}"),
        }
    }

    #[test]
    fn redacted_hides_password_only() {
        let auth = AdminAuth::FixedAdmin {
            password: Some("hunter2".to_string()),
        };
        match auth.redacted() {
            AdminAuth::FixedAdmin { password } => {
                assert_eq!(password.as_deref(), Some("***REDACTED***"));
            }
            other => panic!("unexpected redacted auth: {other:?}"),
        }
        let keytab = AdminAuth::default();
        assert_eq!(keytab.redacted(), keytab);
    }
}
