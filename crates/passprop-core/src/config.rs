//! Module configuration and the registry that validates it.
//!
//! Configuration is mutated only while the hosting server's configuration
//! subsystem is the sole active thread; running interceptors never see the
//! registry itself, only the read-only [`ConfigSnapshot`] it produces.
//! Descriptor resolution happens once, at validation time, and the resolved
//! handles ride along in the snapshot.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::directory::{AttributeDescriptor, DirectoryError, ObjectClassRef, SchemaResolver};
use crate::principal::{admin_principal, AdminAuth};

/// Configuration-time validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No such configuration option.
    #[error("unknown option '{option}'")]
    UnknownOption { option: String },

    /// An enable-list token did not name a known module.
    #[error("unknown module '{token}' in enable list")]
    UnknownModule { token: String },

    /// Time windows must be non-negative.
    #[error("invalid negative value {value} for {option}")]
    NegativeInterval { option: String, value: i64 },

    /// A value failed to parse for the option.
    #[error("invalid value '{value}' for {option}")]
    InvalidValue { option: String, value: String },

    /// The option requires a value that was not supplied.
    #[error("missing value for {option}")]
    MissingValue { option: String },

    /// Schema resolution failed for a configured name.
    #[error(transparent)]
    Schema(#[from] DirectoryError),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which propagation branches run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchMode {
    pub realm: bool,
    pub samba: bool,
}

impl BranchMode {
    /// Both branches, the effective default when nothing was configured.
    #[must_use]
    pub fn all() -> Self {
        Self {
            realm: true,
            samba: true,
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self {
            realm: false,
            samba: false,
        }
    }
}

/// Supervisor settings for the isolated realm worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// Worker executable; when unset the supervisor looks for
    /// `passprop-realm-worker` next to the current executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<PathBuf>,

    /// Hard bound on one worker run, in seconds.
    #[serde(default = "default_worker_timeout")]
    pub timeout_secs: u64,
}

fn default_worker_timeout() -> u64 {
    15
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            command: None,
            timeout_secs: default_worker_timeout(),
        }
    }
}

/// Per-backend-instance configuration. One instance per overlay attachment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Explicitly enabled branches; `None` means both.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<BranchMode>,

    /// Seconds until a password change is forced; 0 disables the window.
    #[serde(default)]
    pub must_change_secs: i64,

    /// Seconds before a password may be changed again; 0 disables.
    #[serde(default)]
    pub can_change_secs: i64,

    /// Realm identifier, e.g. `EXAMPLE.ORG`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_name: Option<String>,

    /// Derived administrative principal; recomputed when the realm changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_principal: Option<String>,

    /// Entries lacking this class are skipped entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_object_class: Option<String>,

    /// Reinstate a `{sasl}` credential marker after a realm-branch success.
    #[serde(default)]
    pub keep_identity_scheme: bool,

    /// Administrative session authentication convention.
    #[serde(default)]
    pub admin_auth: AdminAuth,

    /// Host name override for the service-principal convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_host: Option<String>,

    /// Isolated worker settings.
    #[serde(default)]
    pub worker: WorkerSettings,
}

impl ModuleConfig {
    /// Branch enables with the both-when-unset default applied.
    #[must_use]
    pub fn effective_mode(&self) -> BranchMode {
        self.mode.unwrap_or_else(BranchMode::all)
    }

    /// Redacted view for logging and configuration read-back.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            admin_auth: self.admin_auth.redacted(),
            ..self.clone()
        }
    }
}

/// Descriptors the realm branch needs.
#[derive(Debug, Clone)]
pub struct RealmAttributes {
    pub uid: AttributeDescriptor,
    pub user_password: AttributeDescriptor,
}

/// Descriptors and the object class the hash branch needs.
#[derive(Debug, Clone)]
pub struct SambaAttributes {
    pub nt_password: AttributeDescriptor,
    pub pwd_last_set: AttributeDescriptor,
    pub pwd_must_change: AttributeDescriptor,
    pub pwd_can_change: AttributeDescriptor,
    pub sam_account: ObjectClassRef,
}

/// Read-only, resolved-once configuration passed to the interceptor.
///
/// Attribute sets are present exactly for the enabled branches.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub config: ModuleConfig,
    pub mode: BranchMode,
    pub required_object_class: Option<ObjectClassRef>,
    pub realm_attrs: Option<RealmAttributes>,
    pub samba_attrs: Option<SambaAttributes>,
}

/// Validating front end over [`ModuleConfig`].
///
/// Lives in the configuration subsystem; see the module docs for the
/// threading contract.
pub struct ConfigRegistry<S: SchemaResolver> {
    schema: S,
    config: ModuleConfig,
}

impl<S: SchemaResolver> ConfigRegistry<S> {
    pub fn new(schema: S) -> Self {
        Self {
            schema,
            config: ModuleConfig::default(),
        }
    }

    pub fn with_config(schema: S, config: ModuleConfig) -> Self {
        Self { schema, config }
    }

    #[must_use]
    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Current option values for configuration read-back, secrets redacted.
    #[must_use]
    pub fn emit(&self) -> ModuleConfig {
        self.config.redacted()
    }

    /// Apply one configuration option, validated synchronously.
    pub fn set_option(&mut self, option: &str, args: &[&str]) -> ConfigResult<()> {
        match option {
            "enable" => {
                if args.is_empty() {
                    return Err(ConfigError::MissingValue {
                        option: option.to_string(),
                    });
                }
                let mut mode = self.config.mode.unwrap_or_else(BranchMode::none);
                for token in args {
                    match *token {
                        "realm" | "krb5" => mode.realm = true,
                        "samba" => mode.samba = true,
                        other => {
                            return Err(ConfigError::UnknownModule {
                                token: other.to_string(),
                            })
                        }
                    }
                }
                self.config.mode = Some(mode);
                if mode.realm {
                    self.refresh_admin_principal();
                }
            }
            "must-change-seconds" => {
                self.config.must_change_secs = parse_interval(option, args)?;
            }
            "can-change-seconds" => {
                self.config.can_change_secs = parse_interval(option, args)?;
            }
            "realm-name" => {
                let value = single_value(option, args)?;
                self.config.realm_name = Some(value.to_string());
                self.refresh_admin_principal();
            }
            "required-object-class" => {
                let value = single_value(option, args)?;
                // Resolve now so a bad name is rejected at configuration time.
                self.schema.resolve_object_class(value)?;
                self.config.required_object_class = Some(value.to_string());
            }
            "keep-identity-scheme" => {
                let value = single_value(option, args)?;
                self.config.keep_identity_scheme = match value {
                    "on" => true,
                    "off" => false,
                    other => {
                        return Err(ConfigError::InvalidValue {
                            option: option.to_string(),
                            value: other.to_string(),
                        })
                    }
                };
            }
            other => {
                return Err(ConfigError::UnknownOption {
                    option: other.to_string(),
                })
            }
        }
        debug!(option, "applied configuration option");
        Ok(())
    }

    fn refresh_admin_principal(&mut self) {
        if let Some(realm) = &self.config.realm_name {
            let principal = admin_principal(
                &self.config.admin_auth,
                realm,
                self.config.admin_host.as_deref(),
            );
            info!(principal = %principal, "using administrative principal");
            self.config.admin_principal = Some(principal);
        }
    }

    /// Validate the whole configuration and produce the read-only snapshot
    /// the interceptor runs against.
    pub fn snapshot(&mut self) -> ConfigResult<Arc<ConfigSnapshot>> {
        let mode = self.config.effective_mode();

        let required_object_class = match &self.config.required_object_class {
            Some(name) => Some(self.schema.resolve_object_class(name)?),
            None => None,
        };

        let realm_attrs = if mode.realm {
            if self.config.realm_name.is_none() {
                return Err(ConfigError::MissingValue {
                    option: "realm-name".to_string(),
                });
            }
            if self.config.admin_principal.is_none() {
                self.refresh_admin_principal();
            }
            Some(RealmAttributes {
                uid: self.schema.resolve_attribute("uid")?,
                user_password: self.schema.resolve_attribute("userPassword")?,
            })
        } else {
            None
        };

        let samba_attrs = if mode.samba {
            Some(SambaAttributes {
                nt_password: self.schema.resolve_attribute("sambaNTPassword")?,
                pwd_last_set: self.schema.resolve_attribute("sambaPwdLastSet")?,
                pwd_must_change: self.schema.resolve_attribute("sambaPwdMustChange")?,
                pwd_can_change: self.schema.resolve_attribute("sambaPwdCanChange")?,
                sam_account: self.schema.resolve_object_class("sambaSamAccount")?,
            })
        } else {
            None
        };

        Ok(Arc::new(ConfigSnapshot {
            config: self.config.clone(),
            mode,
            required_object_class,
            realm_attrs,
            samba_attrs,
        }))
    }
}

fn single_value<'a>(option: &str, args: &[&'a str]) -> ConfigResult<&'a str> {
    match args {
        [value] => Ok(value),
        [] => Err(ConfigError::MissingValue {
            option: option.to_string(),
        }),
        _ => Err(ConfigError::InvalidValue {
            option: option.to_string(),
            value: args.join(" "),
        }),
    }
}

fn parse_interval(option: &str, args: &[&str]) -> ConfigResult<i64> {
    let value = single_value(option, args)?;
    let secs: i64 = value.parse().map_err(|_| ConfigError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
    })?;
    if secs < 0 {
        return Err(ConfigError::NegativeInterval {
            option: option.to_string(),
            value: secs,
        });
    }
    Ok(secs)
}
