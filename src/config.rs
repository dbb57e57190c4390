//! Fleet configuration loaded via `ortho-config`.
//!
//! The configuration is an explicit value handed to the registry and to each
//! [`crate::Server`]; nothing in the crate reads ambient global state.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::session::{Credentials, HostTarget, expand_tilde};

/// Identity required by privileged provisioning operations.
pub const SUPERUSER: &str = "root";

/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Fleet-wide defaults and secrets derived from configuration files and
/// environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "FLEETPROV",
    discovery(
        app_name = "fleetprov",
        env_var = "FLEETPROV_CONFIG_PATH",
        config_file_name = "fleetprov.toml",
        dotfile_name = ".fleetprov.toml",
        project_file_name = "fleetprov.toml"
    )
)]
pub struct FleetConfig {
    /// Default remote user for every host.
    #[ortho_config(default = SUPERUSER.to_owned())]
    pub user: String,
    /// Default password for every host. May be empty when an identity file
    /// is configured.
    #[ortho_config(default = String::new())]
    pub password: String,
    /// Private key used instead of the password. Supports `~/` expansion.
    pub identity_file: Option<String>,
    /// SSH port used for every host.
    #[ortho_config(default = DEFAULT_SSH_PORT)]
    pub port: u16,
    /// Ordered list of fleet hostnames.
    #[ortho_config(default = Vec::new())]
    pub hostnames: Vec<String>,
    /// Host that plays the Cloudera Manager (`cm`) role.
    pub cm_host: Option<String>,
    /// Echo captured command output by default.
    #[ortho_config(default = false)]
    pub debug_mode: bool,
    /// Database password used when preparing the Cloudera Manager schema.
    pub mysql_cm_dbs_password: Option<String>,
    /// Local directory holding files pushed to hosts.
    #[ortho_config(default = "files".to_owned())]
    pub files_dir: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to fleetprov.toml",
            self.description, self.env_var, self.toml_key
        ))
    }
}

const USER_FIELD: FieldMetadata = FieldMetadata::new("SSH user", "FLEETPROV_USER", "user");
const PASSWORD_FIELD: FieldMetadata = FieldMetadata::new(
    "SSH password or identity file",
    "FLEETPROV_PASSWORD",
    "password",
);
const HOSTNAMES_FIELD: FieldMetadata =
    FieldMetadata::new("fleet hostnames", "FLEETPROV_HOSTNAMES", "hostnames");
const FILES_DIR_FIELD: FieldMetadata =
    FieldMetadata::new("local files directory", "FLEETPROV_FILES_DIR", "files_dir");
const CM_HOST_FIELD: FieldMetadata =
    FieldMetadata::new("Cloudera Manager host", "FLEETPROV_CM_HOST", "cm_host");
const CM_DB_PASSWORD_FIELD: FieldMetadata = FieldMetadata::new(
    "Cloudera Manager database password",
    "FLEETPROV_MYSQL_CM_DBS_PASSWORD",
    "mysql_cm_dbs_password",
);

impl FleetConfig {
    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("fleetprov")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty or
    /// the fleet contains a blank hostname.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(&self.user, &USER_FIELD)?;
        let has_identity = self
            .identity_file
            .as_deref()
            .is_some_and(|path| !path.trim().is_empty());
        if !has_identity {
            require(&self.password, &PASSWORD_FIELD)?;
        }
        if self.hostnames.is_empty() || self.hostnames.iter().any(|h| h.trim().is_empty()) {
            return Err(HOSTNAMES_FIELD.missing());
        }
        require(&self.files_dir, &FILES_DIR_FIELD)?;
        Ok(())
    }

    /// Default credentials applied to hosts without explicit overrides.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            user: self.user.clone(),
            password: self.password.clone(),
            identity_file: self.identity_file.as_deref().map(expand_tilde),
        }
    }

    /// Builds a connection target for `hostname` using the configured
    /// defaults.
    #[must_use]
    pub fn target_for(&self, hostname: &str) -> HostTarget {
        HostTarget {
            hostname: hostname.to_owned(),
            port: self.port,
            credentials: self.credentials(),
        }
    }

    /// Returns the host assigned to the `cm` role.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when no host is configured.
    pub fn require_cm_host(&self) -> Result<&str, ConfigError> {
        require_optional(self.cm_host.as_deref(), &CM_HOST_FIELD)
    }

    /// Returns the Cloudera Manager database secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the secret is absent.
    pub fn require_cm_database_password(&self) -> Result<&str, ConfigError> {
        require_optional(self.mysql_cm_dbs_password.as_deref(), &CM_DB_PASSWORD_FIELD)
    }
}

fn require(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
    require_optional(Some(value), metadata).map(|_| ())
}

fn require_optional<'a>(
    value: Option<&'a str>,
    metadata: &FieldMetadata,
) -> Result<&'a str, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(metadata.missing()),
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
