//! The check-then-act pattern behind every provisioning operation.
//!
//! A step issues its read-only probes, and when every probe already shows
//! the "done" signature it stops without issuing any mutating command.
//! Otherwise it runs its actions in order and, if configured, re-probes to
//! confirm the post-condition, failing with
//! [`ProvisionError::Verification`] when the confirmation is missing. A
//! failed step still reports every command it issued.
//!
//! Output that does not match a known marker always means "not done yet".
//! Action commands are not checked for success: the sequence runs to the
//! end unless the transport itself fails.

use camino::Utf8PathBuf;
use log::info;

use crate::error::{ProvisionError, ProvisionFailure};
use crate::server::Server;
use crate::service::ServiceOperation;
use crate::session::{CommandResult, RemoteShell};

mod marker;
mod report;

pub use marker::{Expectation, Marker, Probe};
pub use report::{ActionRecord, StepOutcome, StepReport};

/// One entry in a step's mutating sequence.
#[derive(Clone, Debug)]
pub enum Action {
    /// Run a shell command.
    Run(String),
    /// Push a local file to the host.
    Upload {
        /// Local source path.
        local: Utf8PathBuf,
        /// Remote destination path.
        remote: Utf8PathBuf,
    },
    /// Drive a system service.
    Service {
        /// Unit name.
        name: String,
        /// Lifecycle operation.
        operation: ServiceOperation,
    },
    /// Evaluate a nested step, which may itself be skipped.
    Step(Box<IdempotentStep>),
}

/// Post-action check that must hold for the step to succeed.
#[derive(Clone, Debug)]
pub struct Verification {
    probe: Probe,
    check: String,
}

impl Verification {
    /// Pairs a probe with a human-readable description of what it checks.
    #[must_use]
    pub fn new(probe: Probe, check: impl Into<String>) -> Self {
        Self {
            probe,
            check: check.into(),
        }
    }

    /// Description used in the verification error.
    #[must_use]
    pub fn check(&self) -> &str {
        &self.check
    }
}

/// Probe, actions, and optional verification for one idempotent change.
///
/// A step without probes is unconditional: it always applies.
#[derive(Clone, Debug)]
pub struct IdempotentStep {
    name: String,
    probes: Vec<Probe>,
    actions: Vec<Action>,
    verification: Option<Verification>,
}

impl IdempotentStep {
    /// Starts an empty step.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            probes: Vec::new(),
            actions: Vec::new(),
            verification: None,
        }
    }

    /// Adds a probe. All probes must be satisfied for the step to skip.
    #[must_use]
    pub fn probe(mut self, probe: Probe) -> Self {
        self.probes.push(probe);
        self
    }

    /// Appends an action.
    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Appends a shell command action.
    #[must_use]
    pub fn run(self, command: impl Into<String>) -> Self {
        self.action(Action::Run(command.into()))
    }

    /// Appends a file upload action.
    #[must_use]
    pub fn upload(self, local: impl Into<Utf8PathBuf>, remote: impl Into<Utf8PathBuf>) -> Self {
        self.action(Action::Upload {
            local: local.into(),
            remote: remote.into(),
        })
    }

    /// Appends a service lifecycle action.
    #[must_use]
    pub fn service(self, name: impl Into<String>, operation: ServiceOperation) -> Self {
        self.action(Action::Service {
            name: name.into(),
            operation,
        })
    }

    /// Appends a nested step.
    #[must_use]
    pub fn nested(self, step: Self) -> Self {
        self.action(Action::Step(Box::new(step)))
    }

    /// Sets the post-action verification.
    #[must_use]
    pub fn verify(mut self, probe: Probe, check: impl Into<String>) -> Self {
        self.verification = Some(Verification::new(probe, check));
        self
    }

    /// Step name used in logs and reports.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured probes.
    #[must_use]
    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    /// Configured actions.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Evaluates the step against `server`.
    ///
    /// # Errors
    ///
    /// Fails with [`ProvisionError::Transport`] when any command or upload
    /// fails at the protocol layer, and [`ProvisionError::Verification`] when
    /// the post-action check does not hold. The returned
    /// [`ProvisionFailure`] carries this step's report up to the failing
    /// command.
    pub fn evaluate<S: RemoteShell>(
        &self,
        server: &Server<S>,
    ) -> Result<StepReport, ProvisionFailure> {
        // Stays `Failed` unless evaluation runs to completion.
        let mut report = StepReport {
            name: self.name.clone(),
            host: server.hostname().to_owned(),
            outcome: StepOutcome::Failed,
            probes: Vec::with_capacity(self.probes.len()),
            actions: Vec::new(),
            verification: None,
            failure: None,
        };
        if let Err(error) = self.evaluate_into(server, &mut report) {
            report.failure = Some(error.to_string());
            return Err(ProvisionFailure {
                reports: vec![report],
                error,
            });
        }
        Ok(report)
    }

    fn evaluate_into<S: RemoteShell>(
        &self,
        server: &Server<S>,
        report: &mut StepReport,
    ) -> Result<(), ProvisionError> {
        for probe in &self.probes {
            report.probes.push(server.run(probe.command())?);
        }

        if self.is_satisfied(&report.probes) {
            info!("{}: already satisfied on {}", self.name, server.hostname());
            report.outcome = StepOutcome::AlreadySatisfied;
            return Ok(());
        }

        info!("{}: applying on {}", self.name, server.hostname());
        for action in &self.actions {
            perform(server, action, &mut report.actions)?;
        }

        if let Some(verification) = &self.verification {
            let result = server.run(verification.probe.command())?;
            let held = verification.probe.is_satisfied_by(&result);
            let observed = result.output.trim().to_owned();
            report.verification = Some(result);
            if !held {
                return Err(ProvisionError::Verification {
                    host: server.hostname().to_owned(),
                    check: verification.check.clone(),
                    detail: format!(
                        "expected {}, got: {observed}",
                        verification.probe.expectation()
                    ),
                });
            }
        }
        report.outcome = StepOutcome::Applied;
        Ok(())
    }

    fn is_satisfied(&self, results: &[CommandResult]) -> bool {
        !self.probes.is_empty()
            && self
                .probes
                .iter()
                .zip(results)
                .all(|(probe, result)| probe.is_satisfied_by(result))
    }
}

fn perform<S: RemoteShell>(
    server: &Server<S>,
    action: &Action,
    records: &mut Vec<ActionRecord>,
) -> Result<(), ProvisionError> {
    match action {
        Action::Run(command) => records.push(ActionRecord::Command(server.run(command)?)),
        Action::Upload { local, remote } => {
            server.upload(local, remote)?;
            records.push(ActionRecord::Upload {
                local: local.clone(),
                remote: remote.clone(),
            });
        }
        Action::Service { name, operation } => {
            let results = server.service(name).perform(*operation)?;
            records.extend(results.into_iter().map(ActionRecord::Command));
        }
        Action::Step(step) => match step.evaluate(server) {
            Ok(nested) => records.push(ActionRecord::Step(nested)),
            Err(failure) => {
                records.extend(failure.reports.into_iter().map(ActionRecord::Step));
                return Err(failure.error);
            }
        },
    }
    Ok(())
}
