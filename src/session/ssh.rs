//! `ssh2`-backed transport: one authenticated libssh2 session per host,
//! commands on fresh channels with stderr merged into stdout, uploads over
//! SCP on the same session.

use std::fmt;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use ssh2::{Channel, ExtendedData, Session};

use super::types::{CommandOutput, Connector, Credentials, HostTarget, RemoteShell};
use crate::error::{ConnectionError, TransportError};

const UPLOAD_MODE: i32 = 0o644;

/// Connects to hosts with libssh2 using password or key authentication.
#[derive(Clone, Debug, Default)]
pub struct Ssh2Connector;

impl Connector for Ssh2Connector {
    type Shell = Ssh2Shell;

    fn connect(&self, target: &HostTarget) -> Result<Ssh2Shell, ConnectionError> {
        let host = target.hostname.clone();
        let tcp = TcpStream::connect((target.hostname.as_str(), target.port)).map_err(|err| {
            ConnectionError::Unreachable {
                host: host.clone(),
                port: target.port,
                message: err.to_string(),
            }
        })?;

        let mut session = Session::new().map_err(|err| ConnectionError::Handshake {
            host: host.clone(),
            message: err.to_string(),
        })?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|err| ConnectionError::Handshake {
                host: host.clone(),
                message: err.to_string(),
            })?;

        authenticate(&session, &host, &target.credentials)?;
        if !session.authenticated() {
            return Err(ConnectionError::Authentication {
                host,
                user: target.credentials.user.clone(),
                message: String::from("server did not accept the credentials"),
            });
        }

        Ok(Ssh2Shell { host, session })
    }
}

fn authenticate(
    session: &Session,
    host: &str,
    credentials: &Credentials,
) -> Result<(), ConnectionError> {
    let result = match credentials.identity_file.as_deref() {
        Some(key) => {
            session.userauth_pubkey_file(&credentials.user, None, Path::new(key), None)
        }
        None => session.userauth_password(&credentials.user, &credentials.password),
    };
    result.map_err(|err| ConnectionError::Authentication {
        host: host.to_owned(),
        user: credentials.user.clone(),
        message: err.to_string(),
    })
}

/// Live libssh2 session. The connection is closed on drop.
pub struct Ssh2Shell {
    host: String,
    session: Session,
}

impl fmt::Debug for Ssh2Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ssh2Shell").field("host", &self.host).finish()
    }
}

impl Ssh2Shell {
    fn command_error(&self, command: &str, err: impl fmt::Display) -> TransportError {
        TransportError::Command {
            host: self.host.clone(),
            command: command.to_owned(),
            message: err.to_string(),
        }
    }

    fn transfer_error(&self, remote: &Utf8Path, err: impl fmt::Display) -> TransportError {
        TransportError::Transfer {
            host: self.host.clone(),
            local: Utf8PathBuf::new(),
            remote: remote.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl RemoteShell for Ssh2Shell {
    fn exec(&mut self, command: &str) -> Result<CommandOutput, TransportError> {
        let mut channel = self
            .session
            .channel_session()
            .map_err(|err| self.command_error(command, err))?;
        channel
            .handle_extended_data(ExtendedData::Merge)
            .map_err(|err| self.command_error(command, err))?;
        channel
            .exec(command)
            .map_err(|err| self.command_error(command, err))?;

        let mut buffer = Vec::new();
        channel
            .read_to_end(&mut buffer)
            .map_err(|err| self.command_error(command, err))?;
        channel
            .wait_close()
            .map_err(|err| self.command_error(command, err))?;

        Ok(CommandOutput {
            code: channel.exit_status().ok(),
            stdout: String::from_utf8_lossy(&buffer).into_owned(),
            stderr: String::new(),
        })
    }

    fn upload(&mut self, contents: &[u8], remote: &Utf8Path) -> Result<(), TransportError> {
        let size = u64::try_from(contents.len()).map_err(|err| self.transfer_error(remote, err))?;
        let mut channel = self
            .session
            .scp_send(remote.as_std_path(), UPLOAD_MODE, size, None)
            .map_err(|err| self.transfer_error(remote, err))?;
        channel
            .write_all(contents)
            .map_err(|err| self.transfer_error(remote, err))?;
        finish_upload(&mut channel).map_err(|err| self.transfer_error(remote, err))
    }
}

fn finish_upload(channel: &mut Channel) -> Result<(), ssh2::Error> {
    channel.send_eof()?;
    channel.wait_eof()?;
    channel.close()?;
    channel.wait_close()
}

impl Drop for Ssh2Shell {
    fn drop(&mut self) {
        self.session
            .disconnect(None, "fleetprov session closed", None)
            .ok();
    }
}
