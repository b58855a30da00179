//! Failure taxonomy for migration executions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a migration failure, deciding whether a retry can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Bad payload or input row.
    Validation,
    /// Storage is missing or cannot serve the requested direction.
    Configuration,
    /// Pull, push or other I/O failure.
    Transport,
    /// The host failed while materializing the course.
    RestoreExecution,
    /// The record, category or archive does not exist.
    NotFound,
}

impl FailureKind {
    /// Returns whether the retry controller may reschedule this failure.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Configuration | Self::Transport | Self::RestoreExecution
        )
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Configuration => "configuration",
            Self::Transport => "transport",
            Self::RestoreExecution => "restore_execution",
            Self::NotFound => "not_found",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure with the text recorded on the migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationFailure {
    kind: FailureKind,
    message: String,
}

impl MigrationFailure {
    /// Creates a failure.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a validation failure.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    /// Creates a configuration failure.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Configuration, message)
    }

    /// Creates a transport failure.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, message)
    }

    /// Creates a restore execution failure.
    #[must_use]
    pub fn restore_execution(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RestoreExecution, message)
    }

    /// Creates a not-found failure.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, message)
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Returns the failure text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the same failure with `prefix` prepended to its text.
    #[must_use]
    pub fn prefixed(self, prefix: &str) -> Self {
        Self {
            kind: self.kind,
            message: format!("{prefix}{}", self.message),
        }
    }
}

impl fmt::Display for MigrationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}
