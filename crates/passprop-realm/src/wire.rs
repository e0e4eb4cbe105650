//! Wire format between supervisor and worker.
//!
//! The request travels over the worker's stdin as a single JSON document;
//! the outcome travels back as the worker's exit status. Nothing else
//! crosses the process boundary.

use serde::{Deserialize, Serialize};

use passprop_core::principal::AdminAuth;

/// Everything the isolated worker needs for one propagation attempt.
#[derive(Clone, Serialize, Deserialize)]
pub struct WorkerRequest {
    /// Account identity from the entry's identity attribute; `None` when
    /// the entry carried no such attribute (reported, not fatal here).
    pub identity: Option<String>,

    /// New plaintext credential. Carried on stdin, never on argv.
    pub password: String,

    /// Realm identifier.
    pub realm: String,

    /// Administrative principal the session authenticates as.
    pub admin_principal: String,

    /// Administrative authentication convention.
    pub auth: AdminAuth,

    /// The worker's own deadline, at most the supervisor's bound.
    pub deadline_secs: u64,
}

// Credentials stay out of logs; Debug is written by hand.
impl std::fmt::Debug for WorkerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRequest")
            .field("identity", &self.identity)
            .field("password", &"***")
            .field("realm", &self.realm)
            .field("admin_principal", &self.admin_principal)
            .field("auth", &self.auth.redacted())
            .field("deadline_secs", &self.deadline_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WorkerRequest {
        WorkerRequest {
            identity: Some("jdoe".to_string()),
            password: "hunter2".to_string(),
            realm: "EXAMPLE.ORG".to_string(),
            admin_principal: "passprop/ldap1.example.org@EXAMPLE.ORG".to_string(),
            auth: AdminAuth::default(),
            deadline_secs: 14,
        }
    }

    #[test]
    fn serializes_and_parses() {
        let json = serde_json::to_string(&sample()).unwrap();
        let parsed: WorkerRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.identity.as_deref(), Some("jdoe"));
        assert_eq!(parsed.password, "hunter2");
        assert_eq!(parsed.deadline_secs, 14);
    }

    #[test]
    fn debug_never_shows_the_password() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }
}
