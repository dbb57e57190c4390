//! Resolves fleet hostnames and named roles into connected servers.

use log::info;

use crate::config::{ConfigError, FleetConfig};
use crate::error::{ConnectionError, ProvisionError};
use crate::server::Server;
use crate::session::{Connector, Ssh2Connector};

/// Named roles a single host can play.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    /// The Cloudera Manager host (`cm`).
    ClouderaManager,
}

impl Role {
    /// Looks up a role by its identifier. Identifiers are case-sensitive.
    #[must_use]
    pub fn parse(identifier: &str) -> Option<Self> {
        match identifier {
            "cm" => Some(Self::ClouderaManager),
            _ => None,
        }
    }

    /// Identifier used in configuration and on the command line.
    #[must_use]
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::ClouderaManager => "cm",
        }
    }
}

/// Produces [`Server`] handles for the configured fleet.
#[derive(Debug)]
pub struct ServerRegistry<C: Connector> {
    config: FleetConfig,
    connector: C,
}

impl ServerRegistry<Ssh2Connector> {
    /// Convenience constructor that wires the real SSH connector.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn with_ssh(config: FleetConfig) -> Result<Self, ConfigError> {
        Self::new(config, Ssh2Connector)
    }
}

impl<C: Connector> ServerRegistry<C> {
    /// Creates a registry after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn new(config: FleetConfig, connector: C) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, connector })
    }

    /// Configuration the registry resolves against.
    #[must_use]
    pub const fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Connects to every configured host, in configuration order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConnectionError`]; no partial list is returned.
    pub fn all(&self) -> Result<Vec<Server<C::Shell>>, ConnectionError> {
        info!("connecting to {} fleet hosts", self.config.hostnames.len());
        self.config
            .hostnames
            .iter()
            .map(|hostname| self.connect(hostname))
            .collect()
    }

    /// Resolves a named role to its server. Unknown identifiers resolve to
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Config`] when the role has no configured
    /// host, or [`ProvisionError::Connection`] when connecting fails.
    pub fn find(&self, identifier: &str) -> Result<Option<Server<C::Shell>>, ProvisionError> {
        let Some(role) = Role::parse(identifier) else {
            return Ok(None);
        };
        let hostname = match role {
            Role::ClouderaManager => self.config.require_cm_host()?,
        };
        Ok(Some(self.connect(hostname)?))
    }

    /// Role-based fleet lookup. Not available.
    ///
    /// # Errors
    ///
    /// Always returns [`ProvisionError::NotImplemented`].
    pub fn all_with_role(&self, role: &str) -> Result<Vec<Server<C::Shell>>, ProvisionError> {
        Err(ProvisionError::NotImplemented {
            capability: format!("lookup of all servers with role `{role}`"),
        })
    }

    /// Connects to an arbitrary host with the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the session cannot be established.
    pub fn connect(&self, hostname: &str) -> Result<Server<C::Shell>, ConnectionError> {
        Server::connect(&self.connector, &self.config, hostname)
    }
}
