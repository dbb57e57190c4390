//! Remote sessions: one live shell per host, with traced, timed command
//! execution and file upload.
//!
//! Every command emits a `BEGIN`/`END` trace line through the `log` facade,
//! so the last command issued before a failure is always visible. Verbosity
//! only controls whether captured output is echoed; it never changes the
//! returned [`CommandResult`].

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use log::{info, warn};

use crate::error::{ConnectionError, TransportError};

mod ssh;
mod types;
mod util;

pub use ssh::{Ssh2Connector, Ssh2Shell};
pub use types::{CommandOutput, CommandResult, Connector, Credentials, HostTarget, RemoteShell};
pub use util::expand_tilde;

/// An established session to a single host.
///
/// The shell sits behind a mutex so commands on one host are serialised even
/// when the session is shared by reference. Dropping the session drops the
/// shell, which releases the underlying connection.
#[derive(Debug)]
pub struct RemoteSession<S: RemoteShell> {
    host: String,
    shell: Mutex<S>,
}

impl<S: RemoteShell> RemoteSession<S> {
    /// Connects to `target` using `connector`.
    ///
    /// # Errors
    ///
    /// Returns the connector's [`ConnectionError`] unchanged.
    pub fn establish<C>(connector: &C, target: &HostTarget) -> Result<Self, ConnectionError>
    where
        C: Connector<Shell = S>,
    {
        let shell = connector.connect(target)?;
        info!("connected to {} as {}", target.hostname, target.credentials.user);
        Ok(Self::new(target.hostname.clone(), shell))
    }

    /// Wraps an already established shell.
    #[must_use]
    pub fn new(host: impl Into<String>, shell: S) -> Self {
        Self {
            host: host.into(),
            shell: Mutex::new(shell),
        }
    }

    /// Hostname this session is bound to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Runs `command`, returning its captured output and duration.
    ///
    /// The remote exit status is recorded but never turned into an error;
    /// callers decide from the output whether the command did what they
    /// needed.
    ///
    /// # Errors
    ///
    /// Propagates [`TransportError`] from the shell untouched.
    pub fn run(&self, command: &str, verbose: bool) -> Result<CommandResult, TransportError> {
        info!("BEGIN: {command}");
        let mut shell = self.lock();
        let started = Instant::now();
        let outcome = shell.exec(command);
        let duration = started.elapsed();
        drop(shell);

        let output = outcome.inspect_err(|err| warn!("FAILED ({:?}): {err}", duration))?;
        let result = CommandResult {
            host: self.host.clone(),
            command: command.to_owned(),
            output: output.combined(),
            exit_code: output.code,
            duration,
        };
        if verbose {
            info!("{}", result.output);
        }
        info!("END ({:.3}s)", duration.as_secs_f64());
        Ok(result)
    }

    /// Copies the local file at `local` to `remote` on the host.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Transfer`] when the local file cannot be
    /// read or the upload fails.
    pub fn upload_file(&self, local: &Utf8Path, remote: &Utf8Path) -> Result<(), TransportError> {
        info!("UPLOAD: {local} -> {}:{remote}", self.host);
        let contents = read_local(local).map_err(|err| TransportError::Transfer {
            host: self.host.clone(),
            local: local.to_path_buf(),
            remote: remote.to_path_buf(),
            message: err.to_string(),
        })?;
        self.lock()
            .upload(&contents, remote)
            .map_err(|err| match err {
                TransportError::Transfer {
                    host,
                    remote: target,
                    message,
                    ..
                } => TransportError::Transfer {
                    host,
                    local: local.to_path_buf(),
                    remote: target,
                    message,
                },
                other @ TransportError::Command { .. } => other,
            })
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        self.shell.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_local(path: &Utf8Path) -> std::io::Result<Vec<u8>> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.read(file_name)
}
