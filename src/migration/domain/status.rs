//! Migration action and lifecycle status.

use super::{ParseMigrationActionError, ParseMigrationStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a migration record asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationAction {
    /// Produce and push an archive of a source course.
    Backup,
    /// Pull an archive and materialize it as a new course.
    Restore,
}

impl MigrationAction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backup => "backup",
            Self::Restore => "restore",
        }
    }
}

impl TryFrom<&str> for MigrationAction {
    type Error = ParseMigrationActionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "backup" => Ok(Self::Backup),
            "restore" => Ok(Self::Restore),
            _ => Err(ParseMigrationActionError(value.to_owned())),
        }
    }
}

impl fmt::Display for MigrationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Migration lifecycle status.
///
/// ```text
/// NotStarted -> InProgress -> Completed
///     |             |
///     v             v
///  Invalid       Failed -> Retrying -> InProgress
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    /// Queued; no execution has started.
    NotStarted,
    /// An execution is running.
    InProgress,
    /// The migration finished successfully.
    Completed,
    /// The latest execution failed.
    Failed,
    /// A failed execution has been rescheduled.
    Retrying,
    /// The input was malformed; the record never entered the work loop.
    Invalid,
}

impl MigrationStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::NotStarted,
        Self::InProgress,
        Self::Completed,
        Self::Failed,
        Self::Retrying,
        Self::Invalid,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Retrying => "retrying",
            Self::Invalid => "invalid",
        }
    }

    /// Returns whether the lifecycle permits moving to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::InProgress | Self::Invalid)
                | (Self::InProgress, Self::Completed | Self::Failed)
                | (Self::Failed, Self::Retrying)
                | (Self::Retrying, Self::InProgress)
        )
    }

    /// Returns whether no further transition is possible.
    ///
    /// [`MigrationStatus::Failed`] is not terminal here because a retry may
    /// still follow; it becomes final only when the retry controller
    /// declines.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Invalid)
    }

    /// Returns whether a restore execution may start from this status.
    ///
    /// `InProgress` is accepted so an execution interrupted by a crash can
    /// be resumed.
    #[must_use]
    pub const fn accepts_execution(self) -> bool {
        matches!(self, Self::NotStarted | Self::InProgress | Self::Retrying)
    }
}

impl TryFrom<&str> for MigrationStatus {
    type Error = ParseMigrationStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseMigrationStatusError(value.to_owned()))
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
