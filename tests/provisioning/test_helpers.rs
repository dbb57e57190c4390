//! Shared fixtures for provisioning BDD scenarios.

use fleetprov::test_support::{ScriptedConnector, ScriptedShell, fleet_config};
use fleetprov::{FleetConfig, ProvisionError, ServerRegistry, StepReport};
use rstest::fixture;

#[derive(Clone, Debug)]
pub struct ProvisionContext {
    pub connector: ScriptedConnector,
    pub config: FleetConfig,
    pub hostname: String,
    pub outcome: Option<ProvisionOutcome>,
}

impl ProvisionContext {
    pub fn shell(&self) -> ScriptedShell {
        self.connector.shell(&self.hostname)
    }

    pub fn registry(&self) -> Result<ServerRegistry<ScriptedConnector>, ProvisionError> {
        Ok(ServerRegistry::new(
            self.config.clone(),
            self.connector.clone(),
        )?)
    }

    pub fn with_outcome(self, outcome: ProvisionOutcome) -> Self {
        Self {
            outcome: Some(outcome),
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    Connection,
    Transport,
    Verification,
    NotImplemented,
    Config,
    Other,
}

impl FailureKind {
    pub const fn of(err: &ProvisionError) -> Self {
        match err {
            ProvisionError::Connection(_) => Self::Connection,
            ProvisionError::Transport(_) => Self::Transport,
            ProvisionError::Verification { .. } => Self::Verification,
            ProvisionError::NotImplemented { .. } => Self::NotImplemented,
            ProvisionError::Config(_) => Self::Config,
            ProvisionError::InvalidMarker { .. } | ProvisionError::Asset(_) => Self::Other,
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "connection" => Some(Self::Connection),
            "transport" => Some(Self::Transport),
            "verification" => Some(Self::Verification),
            "not-implemented" => Some(Self::NotImplemented),
            "config" => Some(Self::Config),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum ProvisionOutcome {
    Installed(Vec<bool>),
    Report(StepReport),
    Connected(usize),
    Failed { kind: FailureKind, message: String },
}

impl ProvisionOutcome {
    pub fn failed(err: &ProvisionError) -> Self {
        Self::Failed {
            kind: FailureKind::of(err),
            message: err.to_string(),
        }
    }
}

#[fixture]
pub fn provision_context() -> ProvisionContext {
    ProvisionContext {
        connector: ScriptedConnector::new(),
        config: fleet_config(&["node1.example.com"]),
        hostname: String::from("node1.example.com"),
        outcome: None,
    }
}
