//! Transport abstraction and captured command results.

use std::fmt;
use std::time::Duration;

use camino::Utf8Path;
use serde::Serialize;

use crate::error::{ConnectionError, TransportError};

/// Raw output returned by a transport for a single command.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code reported by the remote command, if available.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error, when the transport keeps it separate.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Standard output followed by standard error.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len());
        text.push_str(&self.stdout);
        text.push_str(&self.stderr);
        text
    }
}

/// A live shell on one host.
///
/// Implementations must return captured output regardless of the remote
/// exit code; only protocol-level failures are errors.
pub trait RemoteShell {
    /// Runs `command` and blocks until its output has been captured.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Command`] when the command cannot be
    /// dispatched or its output cannot be read.
    fn exec(&mut self, command: &str) -> Result<CommandOutput, TransportError>;

    /// Writes `contents` to `remote` on the host.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Transfer`] when the upload fails.
    fn upload(&mut self, contents: &[u8], remote: &Utf8Path) -> Result<(), TransportError>;
}

/// Opens [`RemoteShell`]s for connection targets.
pub trait Connector {
    /// Shell type produced by this connector.
    type Shell: RemoteShell;

    /// Establishes an authenticated session to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the host is unreachable, the
    /// handshake fails, or authentication is rejected.
    fn connect(&self, target: &HostTarget) -> Result<Self::Shell, ConnectionError>;
}

/// Login details for a host.
#[derive(Clone, Eq, PartialEq)]
pub struct Credentials {
    /// Remote user.
    pub user: String,
    /// Password, used when no identity file is set.
    pub password: String,
    /// Private key path, already tilde-expanded.
    pub identity_file: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("identity_file", &self.identity_file)
            .finish()
    }
}

/// Host plus the credentials used to reach it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostTarget {
    /// Hostname or address.
    pub hostname: String,
    /// SSH port.
    pub port: u16,
    /// Login details.
    pub credentials: Credentials,
}

/// Output and timing of one command issued through a
/// [`super::RemoteSession`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CommandResult {
    /// Host that ran the command.
    pub host: String,
    /// Command text as issued.
    pub command: String,
    /// Combined output text. Whitespace is preserved.
    pub output: String,
    /// Remote exit status, when the transport reported one.
    pub exit_code: Option<i32>,
    /// Wall-clock time from dispatch until the output was captured.
    pub duration: Duration,
}

impl CommandResult {
    /// Returns `true` when `needle` occurs in the output.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.output.contains(needle)
    }

    /// Returns `true` when the remote exit status equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}
