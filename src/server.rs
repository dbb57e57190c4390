//! A fleet host with its exclusively owned remote session.

use camino::Utf8Path;
use shell_escape::unix::escape;

use crate::config::{FleetConfig, SUPERUSER};
use crate::error::{ConnectionError, ProvisionError, ProvisionFailure, TransportError};
use crate::service::ServiceHandle;
use crate::session::{
    CommandResult, Connector, Credentials, HostTarget, RemoteSession, RemoteShell, Ssh2Shell,
};
use crate::step::{IdempotentStep, StepReport};

/// A host plus the live session used to drive it.
///
/// A `Server` only exists with an established session: construction fails
/// as a whole when the connection cannot be made. The session is released
/// when the `Server` is dropped.
#[derive(Debug)]
pub struct Server<S: RemoteShell = Ssh2Shell> {
    hostname: String,
    credentials: Credentials,
    verbose: bool,
    session: RemoteSession<S>,
}

impl<S: RemoteShell> Server<S> {
    /// Connects to `hostname` with the configured default credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the session cannot be established.
    pub fn connect<C>(
        connector: &C,
        config: &FleetConfig,
        hostname: &str,
    ) -> Result<Self, ConnectionError>
    where
        C: Connector<Shell = S>,
    {
        Self::connect_as(connector, config, hostname, config.credentials())
    }

    /// Connects to `hostname` with explicit credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the session cannot be established.
    pub fn connect_as<C>(
        connector: &C,
        config: &FleetConfig,
        hostname: &str,
        credentials: Credentials,
    ) -> Result<Self, ConnectionError>
    where
        C: Connector<Shell = S>,
    {
        let target = HostTarget {
            hostname: hostname.to_owned(),
            port: config.port,
            credentials,
        };
        let session = RemoteSession::establish(connector, &target)?;
        Ok(Self {
            hostname: target.hostname,
            credentials: target.credentials,
            verbose: config.debug_mode,
            session,
        })
    }

    /// Wraps an existing session.
    #[must_use]
    pub fn from_session(session: RemoteSession<S>, credentials: Credentials, verbose: bool) -> Self {
        Self {
            hostname: session.host().to_owned(),
            credentials,
            verbose,
            session,
        }
    }

    /// Hostname of this server.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Remote user the session authenticated as.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.credentials.user
    }

    /// Runs `command`, echoing output when debug mode is configured.
    ///
    /// # Errors
    ///
    /// Propagates [`TransportError`] from the session.
    pub fn run(&self, command: &str) -> Result<CommandResult, TransportError> {
        self.session.run(command, self.verbose)
    }

    /// Runs `command` with an explicit echo setting.
    ///
    /// # Errors
    ///
    /// Propagates [`TransportError`] from the session.
    pub fn run_verbose(&self, command: &str, verbose: bool) -> Result<CommandResult, TransportError> {
        self.session.run(command, verbose)
    }

    /// Copies `local` to `remote` on this server.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Transfer`] when the transfer fails.
    pub fn upload(&self, local: &Utf8Path, remote: &Utf8Path) -> Result<(), TransportError> {
        self.session.upload_file(local, remote)
    }

    /// Handle for the service called `name`.
    #[must_use]
    pub fn service(&self, name: &str) -> ServiceHandle<'_, S> {
        ServiceHandle::new(name, self)
    }

    /// Runs `sql` through the `mysql` client.
    ///
    /// # Errors
    ///
    /// Propagates [`TransportError`] from the session.
    pub fn mysql(&self, sql: &str) -> Result<CommandResult, TransportError> {
        self.run(&format!("mysql -e {}", escape(sql.into())))
    }

    /// Evaluates `step` on this server.
    ///
    /// # Errors
    ///
    /// See [`IdempotentStep::evaluate`].
    pub fn apply(&self, step: &IdempotentStep) -> Result<StepReport, ProvisionFailure> {
        step.evaluate(self)
    }

    /// Sanity check before any mutating operation: the session must be the
    /// superuser and the host must report the expected name.
    ///
    /// The identity check happens before any remote command is issued.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Verification`] when either check fails, or
    /// [`ProvisionError::Transport`] when `hostname` cannot be run.
    pub fn test_connection(&self) -> Result<(), ProvisionError> {
        require_superuser(&self.hostname, &self.credentials)?;

        let reported = self.run("hostname")?;
        if !reported.contains(&self.hostname) {
            return Err(ProvisionError::Verification {
                host: self.hostname.clone(),
                check: String::from("host reports the expected name"),
                detail: format!("hostname returned \"{}\"", reported.output.trim()),
            });
        }
        Ok(())
    }
}

/// Fails unless `credentials` name the superuser.
///
/// # Errors
///
/// Returns [`ProvisionError::Verification`] for any other user.
pub fn require_superuser(host: &str, credentials: &Credentials) -> Result<(), ProvisionError> {
    if credentials.user == SUPERUSER {
        return Ok(());
    }
    Err(ProvisionError::Verification {
        host: host.to_owned(),
        check: format!("must connect as {SUPERUSER}"),
        detail: format!("configured user is {}", credentials.user),
    })
}
