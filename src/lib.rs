//! Core library for the `fleetprov` provisioning tool.
//!
//! The crate drives a fixed fleet of hosts over SSH. Every provisioning
//! operation is an idempotent check-then-act step: a read-only probe decides
//! whether the mutating commands still need to run, so recipes are safe to
//! re-run against hosts in any starting state.

pub mod assets;
pub mod config;
pub mod error;
pub mod provision;
pub mod registry;
pub mod server;
pub mod service;
pub mod session;
pub mod step;
pub mod test_support;

pub use assets::{AssetDir, AssetError};
pub use config::{ConfigError, FleetConfig};
pub use error::{ConnectionError, ProvisionError, ProvisionFailure, TransportError};
pub use provision::{MysqlRole, Provisioner, Recipe};
pub use registry::{Role, ServerRegistry};
pub use server::Server;
pub use service::{ServiceHandle, ServiceOperation};
pub use session::{
    CommandOutput, CommandResult, Connector, Credentials, HostTarget, RemoteSession, RemoteShell,
    Ssh2Connector, Ssh2Shell,
};
pub use step::{IdempotentStep, Marker, Probe, StepOutcome, StepReport};
