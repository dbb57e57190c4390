//! Error taxonomy shared by sessions, steps, and provisioning recipes.
//!
//! Transport and connection failures are kept apart from the text-based
//! "not yet satisfied" signal: the former abort the current operation, the
//! latter is a normal outcome handled by [`crate::step::IdempotentStep`].

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::assets::AssetError;
use crate::config::ConfigError;
use crate::step::{StepOutcome, StepReport};

/// Raised when a session to a host cannot be established.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConnectionError {
    /// The TCP connection could not be opened.
    #[error("failed to reach {host}:{port}: {message}")]
    Unreachable {
        /// Host that was dialled.
        host: String,
        /// Port that was dialled.
        port: u16,
        /// Operating system error string.
        message: String,
    },
    /// The SSH protocol handshake failed.
    #[error("SSH handshake with {host} failed: {message}")]
    Handshake {
        /// Host that rejected the handshake.
        host: String,
        /// Protocol error string.
        message: String,
    },
    /// The server rejected the supplied credentials.
    #[error("authentication as {user} on {host} failed: {message}")]
    Authentication {
        /// Host that rejected authentication.
        host: String,
        /// User that attempted to authenticate.
        user: String,
        /// Protocol error string.
        message: String,
    },
}

/// Raised when a command or file transfer fails at the protocol layer.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TransportError {
    /// The remote command could not be dispatched or its output not read.
    #[error("command `{command}` on {host} failed at the transport layer: {message}")]
    Command {
        /// Host the command was sent to.
        host: String,
        /// Command text as issued.
        command: String,
        /// Protocol or I/O error string.
        message: String,
    },
    /// A file upload failed.
    #[error("failed to transfer {local} to {host}:{remote}: {message}")]
    Transfer {
        /// Host receiving the file.
        host: String,
        /// Local source path.
        local: Utf8PathBuf,
        /// Remote destination path.
        remote: Utf8PathBuf,
        /// Protocol or I/O error string.
        message: String,
    },
}

/// Errors surfaced by provisioning operations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProvisionError {
    /// Session establishment failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    /// A command or transfer failed at the protocol layer.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A post-action or precondition check did not hold.
    #[error("verification failed on {host}: {check} ({detail})")]
    Verification {
        /// Host on which the check ran.
        host: String,
        /// Description of the check that failed.
        check: String,
        /// Observed value that failed the check.
        detail: String,
    },
    /// The requested capability is declared but not available.
    #[error("{capability} is not implemented")]
    NotImplemented {
        /// Name of the missing capability.
        capability: String,
    },
    /// A marker pattern failed to compile.
    #[error("invalid marker pattern `{pattern}`: {message}")]
    InvalidMarker {
        /// Pattern source text.
        pattern: String,
        /// Compiler error string.
        message: String,
    },
    /// Configuration was missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A local file required by a recipe was not available.
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// A [`ProvisionError`] together with the step reports recorded before it.
///
/// The last report is the step that failed, with outcome
/// [`StepOutcome::Failed`] and every command it issued before stopping.
/// Errors raised before any step ran carry no reports.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{error}")]
pub struct ProvisionFailure {
    /// Reports of the steps that ran, in order.
    pub reports: Vec<StepReport>,
    /// The error that stopped the sequence.
    #[source]
    pub error: ProvisionError,
}

impl ProvisionFailure {
    /// Report of the step that failed, if one had started.
    #[must_use]
    pub fn failed_step(&self) -> Option<&StepReport> {
        self.reports
            .last()
            .filter(|report| report.outcome == StepOutcome::Failed)
    }

    /// Puts `completed` ahead of the reports already carried.
    #[must_use]
    pub fn after(mut self, mut completed: Vec<StepReport>) -> Self {
        completed.append(&mut self.reports);
        self.reports = completed;
        self
    }
}

impl From<ProvisionError> for ProvisionFailure {
    fn from(error: ProvisionError) -> Self {
        Self {
            reports: Vec::new(),
            error,
        }
    }
}

impl From<AssetError> for ProvisionFailure {
    fn from(error: AssetError) -> Self {
        ProvisionError::from(error).into()
    }
}

impl From<ConfigError> for ProvisionFailure {
    fn from(error: ConfigError) -> Self {
        ProvisionError::from(error).into()
    }
}

impl From<ProvisionFailure> for ProvisionError {
    fn from(failure: ProvisionFailure) -> Self {
        failure.error
    }
}
