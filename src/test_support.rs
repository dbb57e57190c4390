//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::config::{DEFAULT_SSH_PORT, FleetConfig, SUPERUSER};
use crate::error::{ConnectionError, TransportError};
use crate::server::Server;
use crate::session::{CommandOutput, Connector, Credentials, HostTarget, RemoteSession, RemoteShell};

/// A file received by a [`ScriptedShell`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadRecord {
    /// Remote destination path.
    pub remote: Utf8PathBuf,
    /// Bytes that were uploaded.
    pub contents: Vec<u8>,
}

#[derive(Debug, Default)]
struct ShellState {
    rules: Vec<(String, CommandOutput)>,
    queue: VecDeque<CommandOutput>,
    failures: Vec<String>,
    commands: Vec<String>,
    uploads: Vec<UploadRecord>,
}

/// Scripted shell that answers commands from canned outputs.
///
/// A command is answered by the most recently added rule whose needle it
/// contains, then by the FIFO queue, and otherwise with empty successful
/// output. Clones share state, so a test can keep a handle after the shell
/// has been moved into a session.
#[derive(Clone, Debug, Default)]
pub struct ScriptedShell {
    state: Rc<RefCell<ShellState>>,
}

impl ScriptedShell {
    /// Creates a shell with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every command containing `needle` with `stdout` and exit code
    /// zero.
    pub fn on(&self, needle: &str, stdout: &str) {
        self.on_output(
            needle,
            CommandOutput {
                code: Some(0),
                stdout: stdout.to_owned(),
                stderr: String::new(),
            },
        );
    }

    /// Answers every command containing `needle` with `output`.
    pub fn on_output(&self, needle: &str, output: CommandOutput) {
        self.state
            .borrow_mut()
            .rules
            .push((needle.to_owned(), output));
    }

    /// Queues a one-shot response for the next unmatched command.
    pub fn push_output(&self, code: Option<i32>, stdout: impl Into<String>) {
        self.state.borrow_mut().queue.push_back(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: String::new(),
        });
    }

    /// Fails commands containing `needle`, and uploads to paths containing
    /// it, at the transport layer.
    pub fn fail_on(&self, needle: &str) {
        self.state.borrow_mut().failures.push(needle.to_owned());
    }

    /// Every command issued so far, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }

    /// Number of issued commands containing `needle`.
    #[must_use]
    pub fn count(&self, needle: &str) -> usize {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|command| command.contains(needle))
            .count()
    }

    /// Every upload received so far, in order.
    #[must_use]
    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.state.borrow().uploads.clone()
    }

    fn fails(&self, subject: &str) -> bool {
        self.state
            .borrow()
            .failures
            .iter()
            .any(|needle| subject.contains(needle.as_str()))
    }
}

impl RemoteShell for ScriptedShell {
    fn exec(&mut self, command: &str) -> Result<CommandOutput, TransportError> {
        self.state.borrow_mut().commands.push(command.to_owned());
        if self.fails(command) {
            return Err(TransportError::Command {
                host: String::from("scripted"),
                command: command.to_owned(),
                message: String::from("simulated transport failure"),
            });
        }

        let mut state = self.state.borrow_mut();
        let ruled = state
            .rules
            .iter()
            .rev()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .map(|(_, output)| output.clone());
        Ok(ruled
            .or_else(|| state.queue.pop_front())
            .unwrap_or_else(|| CommandOutput {
                code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            }))
    }

    fn upload(&mut self, contents: &[u8], remote: &Utf8Path) -> Result<(), TransportError> {
        if self.fails(remote.as_str()) {
            return Err(TransportError::Transfer {
                host: String::from("scripted"),
                local: Utf8PathBuf::new(),
                remote: remote.to_path_buf(),
                message: String::from("simulated transfer failure"),
            });
        }
        self.state.borrow_mut().uploads.push(UploadRecord {
            remote: remote.to_path_buf(),
            contents: contents.to_vec(),
        });
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ConnectorState {
    shells: HashMap<String, ScriptedShell>,
    refused: HashSet<String>,
    connections: Vec<String>,
}

/// Connector that hands out one [`ScriptedShell`] per hostname.
#[derive(Clone, Debug, Default)]
pub struct ScriptedConnector {
    state: Rc<RefCell<ConnectorState>>,
}

impl ScriptedConnector {
    /// Creates a connector that accepts every host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shell used for `hostname`, created on first use.
    #[must_use]
    pub fn shell(&self, hostname: &str) -> ScriptedShell {
        self.state
            .borrow_mut()
            .shells
            .entry(hostname.to_owned())
            .or_default()
            .clone()
    }

    /// Makes connections to `hostname` fail.
    pub fn refuse(&self, hostname: &str) {
        self.state.borrow_mut().refused.insert(hostname.to_owned());
    }

    /// Hostnames successfully connected to, in order.
    #[must_use]
    pub fn connections(&self) -> Vec<String> {
        self.state.borrow().connections.clone()
    }
}

impl Connector for ScriptedConnector {
    type Shell = ScriptedShell;

    fn connect(&self, target: &HostTarget) -> Result<ScriptedShell, ConnectionError> {
        if self.state.borrow().refused.contains(&target.hostname) {
            return Err(ConnectionError::Unreachable {
                host: target.hostname.clone(),
                port: target.port,
                message: String::from("connection refused"),
            });
        }
        let shell = self.shell(&target.hostname);
        self.state
            .borrow_mut()
            .connections
            .push(target.hostname.clone());
        Ok(shell)
    }
}

/// Valid configuration for `hostnames`, connecting as the superuser.
#[must_use]
pub fn fleet_config(hostnames: &[&str]) -> FleetConfig {
    FleetConfig {
        user: SUPERUSER.to_owned(),
        password: String::from("secret"),
        identity_file: None,
        port: DEFAULT_SSH_PORT,
        hostnames: hostnames.iter().map(|&host| host.to_owned()).collect(),
        cm_host: None,
        debug_mode: false,
        mysql_cm_dbs_password: None,
        files_dir: String::from("files"),
    }
}

/// Server bound to `shell`, authenticated as the superuser.
#[must_use]
pub fn server_with(hostname: &str, shell: &ScriptedShell) -> Server<ScriptedShell> {
    Server::from_session(
        RemoteSession::new(hostname, shell.clone()),
        Credentials {
            user: SUPERUSER.to_owned(),
            password: String::from("secret"),
            identity_file: None,
        },
        false,
    )
}
