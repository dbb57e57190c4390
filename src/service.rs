//! System service lifecycle on a remote host via `systemctl`.
//!
//! A [`ServiceHandle`] borrows its [`Server`] and holds no state beyond the
//! unit name; every call re-queries the host.

use shell_escape::unix::escape;

use crate::error::{ProvisionError, TransportError};
use crate::server::Server;
use crate::session::{CommandResult, RemoteShell};
use crate::step::{Marker, Probe};

/// Status output substring that marks a running unit.
pub const RUNNING_MARKER: &str = "active (running)";

/// Lifecycle operations a step can request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ServiceOperation {
    /// Start now and enable at boot.
    StartAndEnable,
    /// Restart now.
    Restart,
}

/// A named service on one server.
#[derive(Debug)]
pub struct ServiceHandle<'a, S: RemoteShell> {
    name: String,
    server: &'a Server<S>,
}

impl<'a, S: RemoteShell> ServiceHandle<'a, S> {
    /// Binds `name` to `server`.
    #[must_use]
    pub fn new(name: impl Into<String>, server: &'a Server<S>) -> Self {
        Self {
            name: name.into(),
            server,
        }
    }

    /// Unit name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts the service and enables it at boot. Both commands are issued
    /// unconditionally.
    ///
    /// # Errors
    ///
    /// Propagates [`TransportError`] from either command.
    pub fn start_and_enable(&self) -> Result<Vec<CommandResult>, TransportError> {
        Ok(vec![
            self.systemctl("start")?,
            self.systemctl("enable")?,
        ])
    }

    /// Raw `systemctl status` output for the caller to interpret.
    ///
    /// # Errors
    ///
    /// Propagates [`TransportError`] from the status query.
    pub fn status(&self) -> Result<CommandResult, TransportError> {
        self.systemctl("status")
    }

    /// Restarts the service.
    ///
    /// # Errors
    ///
    /// Propagates [`TransportError`] from the restart command.
    pub fn restart(&self) -> Result<CommandResult, TransportError> {
        self.systemctl("restart")
    }

    /// Runs `operation`, returning every command result in order.
    ///
    /// # Errors
    ///
    /// Propagates [`TransportError`] from the underlying commands.
    pub fn perform(&self, operation: ServiceOperation) -> Result<Vec<CommandResult>, TransportError> {
        match operation {
            ServiceOperation::StartAndEnable => self.start_and_enable(),
            ServiceOperation::Restart => self.restart().map(|result| vec![result]),
        }
    }

    /// Fails unless `status` reports the service as running.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Verification`] naming the host and service
    /// when the running marker is absent, or [`ProvisionError::Transport`]
    /// when the status query fails.
    pub fn ensure_running(&self) -> Result<CommandResult, ProvisionError> {
        let status = self.status()?;
        if status.contains(RUNNING_MARKER) {
            return Ok(status);
        }
        Err(ProvisionError::Verification {
            host: self.server.hostname().to_owned(),
            check: format!("{} could not be started", self.name),
            detail: format!("status lacks \"{RUNNING_MARKER}\""),
        })
    }

    fn systemctl(&self, verb: &str) -> Result<CommandResult, TransportError> {
        self.server.run(&systemctl_command(verb, &self.name))
    }
}

/// Probe that holds when `name` reports as running.
#[must_use]
pub fn running_probe(name: &str) -> Probe {
    Probe::present(systemctl_command("status", name), Marker::text(RUNNING_MARKER))
}

fn systemctl_command(verb: &str, name: &str) -> String {
    format!("systemctl {verb} {}", escape(name.into()))
}
