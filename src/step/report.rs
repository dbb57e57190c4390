//! Structured results of step evaluation.

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::session::CommandResult;

/// Whether a step had to act.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// Every probe already matched; no mutating command was issued.
    AlreadySatisfied,
    /// The action sequence ran.
    Applied,
    /// A transport error or failed verification stopped the step.
    Failed,
}

/// Record of one executed action.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionRecord {
    /// A remote command and its result.
    Command(CommandResult),
    /// A file pushed to the host.
    Upload {
        /// Local source path.
        local: Utf8PathBuf,
        /// Remote destination path.
        remote: Utf8PathBuf,
    },
    /// A nested step evaluated as part of the action sequence.
    Step(StepReport),
}

/// Everything a step issued, in order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StepReport {
    /// Step name.
    pub name: String,
    /// Host the step ran on.
    pub host: String,
    /// Skip or apply.
    pub outcome: StepOutcome,
    /// Probe results in issue order.
    pub probes: Vec<CommandResult>,
    /// Action records in issue order. Empty when already satisfied.
    pub actions: Vec<ActionRecord>,
    /// Post-action verification result, if the step verifies.
    pub verification: Option<CommandResult>,
    /// Why the step stopped, when the outcome is [`StepOutcome::Failed`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl StepReport {
    /// Returns `true` when the action sequence ran to completion.
    #[must_use]
    pub fn applied(&self) -> bool {
        self.outcome == StepOutcome::Applied
    }

    /// Every command issued by this step and its nested steps, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<&str> {
        let mut commands: Vec<&str> = self.probes.iter().map(|r| r.command.as_str()).collect();
        for action in &self.actions {
            match action {
                ActionRecord::Command(result) => commands.push(&result.command),
                ActionRecord::Upload { .. } => {}
                ActionRecord::Step(nested) => commands.extend(nested.commands()),
            }
        }
        if let Some(result) = &self.verification {
            commands.push(&result.command);
        }
        commands
    }
}
