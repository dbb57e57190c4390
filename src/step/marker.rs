//! Marker predicates over captured command output.

use std::fmt;

use regex::Regex;

use crate::error::ProvisionError;
use crate::session::CommandResult;

/// A known signature searched for in command output.
#[derive(Clone, Debug)]
pub enum Marker {
    /// Plain substring containment.
    Text(String),
    /// Whole output, ignoring surrounding whitespace, equals the value.
    Exact(String),
    /// Regular-expression match anywhere in the output.
    Pattern(Regex),
}

impl Marker {
    /// Substring marker.
    #[must_use]
    pub fn text(needle: impl Into<String>) -> Self {
        Self::Text(needle.into())
    }

    /// Trimmed-equality marker.
    #[must_use]
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    /// Compiles a regular-expression marker.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::InvalidMarker`] when `pattern` does not
    /// compile.
    pub fn pattern(pattern: &str) -> Result<Self, ProvisionError> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|err| ProvisionError::InvalidMarker {
                pattern: pattern.to_owned(),
                message: err.to_string(),
            })
    }

    /// Returns `true` when the marker occurs in `output`.
    #[must_use]
    pub fn found_in(&self, output: &str) -> bool {
        match self {
            Self::Text(needle) => output.contains(needle.as_str()),
            Self::Exact(value) => output.trim() == value.trim(),
            Self::Pattern(regex) => regex.is_match(output),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(needle) => write!(f, "\"{needle}\""),
            Self::Exact(value) => write!(f, "exactly \"{value}\""),
            Self::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// Whether a probe is satisfied by the presence or the absence of its
/// marker.
#[derive(Clone, Debug)]
pub enum Expectation {
    /// Satisfied when the marker is found.
    Present(Marker),
    /// Satisfied when the marker is not found.
    Absent(Marker),
}

impl Expectation {
    /// Evaluates the expectation against `output`.
    #[must_use]
    pub fn holds_for(&self, output: &str) -> bool {
        match self {
            Self::Present(marker) => marker.found_in(output),
            Self::Absent(marker) => !marker.found_in(output),
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(marker) => write!(f, "output contains {marker}"),
            Self::Absent(marker) => write!(f, "output lacks {marker}"),
        }
    }
}

/// A read-only command paired with the expectation that means "done".
#[derive(Clone, Debug)]
pub struct Probe {
    command: String,
    expectation: Expectation,
}

impl Probe {
    /// Builds a probe from a command and an expectation.
    #[must_use]
    pub fn new(command: impl Into<String>, expectation: Expectation) -> Self {
        Self {
            command: command.into(),
            expectation,
        }
    }

    /// Probe satisfied when `marker` appears in the output of `command`.
    #[must_use]
    pub fn present(command: impl Into<String>, marker: Marker) -> Self {
        Self::new(command, Expectation::Present(marker))
    }

    /// Probe satisfied when `marker` does not appear in the output of
    /// `command`.
    #[must_use]
    pub fn absent(command: impl Into<String>, marker: Marker) -> Self {
        Self::new(command, Expectation::Absent(marker))
    }

    /// Command issued to observe state.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Expectation applied to the command output.
    #[must_use]
    pub const fn expectation(&self) -> &Expectation {
        &self.expectation
    }

    /// Returns `true` when `result` shows the condition already holds.
    #[must_use]
    pub fn is_satisfied_by(&self, result: &CommandResult) -> bool {
        self.expectation.holds_for(&result.output)
    }
}
