//! Queued unit of work.

use super::{BackupPayload, CleanupPayload, PayloadError, RestorePayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Kind of background execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Archive a course and queue its restore.
    Backup,
    /// Restore an archive into a new course.
    Restore,
    /// Delete an orphaned course.
    CourseCleanup,
}

impl TaskKind {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backup => "backup",
            Self::Restore => "restore",
            Self::CourseCleanup => "course_cleanup",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier for a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueuedTaskId(Uuid);

impl QueuedTaskId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QueuedTaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueuedTaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of work waiting in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedTask {
    id: QueuedTaskId,
    kind: TaskKind,
    payload: Value,
    run_after: DateTime<Utc>,
    reschedules: u32,
}

impl QueuedTask {
    /// Creates a task due at `run_after`.
    #[must_use]
    pub fn new(kind: TaskKind, payload: Value, run_after: DateTime<Utc>) -> Self {
        Self {
            id: QueuedTaskId::new(),
            kind,
            payload,
            run_after,
            reschedules: 0,
        }
    }

    /// Creates a restore task.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Malformed`] when the payload cannot be
    /// encoded.
    pub fn restore(payload: RestorePayload, run_after: DateTime<Utc>) -> Result<Self, PayloadError> {
        Ok(Self::new(TaskKind::Restore, encode(&payload)?, run_after))
    }

    /// Creates a backup task.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Malformed`] when the payload cannot be
    /// encoded.
    pub fn backup(payload: BackupPayload, run_after: DateTime<Utc>) -> Result<Self, PayloadError> {
        Ok(Self::new(TaskKind::Backup, encode(&payload)?, run_after))
    }

    /// Creates a course cleanup task.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Malformed`] when the payload cannot be
    /// encoded.
    pub fn cleanup(payload: CleanupPayload, run_after: DateTime<Utc>) -> Result<Self, PayloadError> {
        Ok(Self::new(TaskKind::CourseCleanup, encode(&payload)?, run_after))
    }

    /// Returns a copy of this task due again at `run_after`, counting one
    /// more applied delay.
    #[must_use]
    pub fn rescheduled(&self, run_after: DateTime<Utc>) -> Self {
        Self {
            id: self.id,
            kind: self.kind,
            payload: self.payload.clone(),
            run_after,
            reschedules: self.reschedules.saturating_add(1),
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> QueuedTaskId {
        self.id
    }

    /// Returns the task kind.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Returns the raw payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns when the task becomes due.
    #[must_use]
    pub const fn run_after(&self) -> DateTime<Utc> {
        self.run_after
    }

    /// Returns how many delays have been applied to this task.
    #[must_use]
    pub const fn reschedules(&self) -> u32 {
        self.reschedules
    }

    /// Returns whether both tasks describe the same unit of work.
    #[must_use]
    pub fn same_work(&self, other: &Self) -> bool {
        self.kind == other.kind && self.payload == other.payload
    }
}

fn encode(payload: &impl Serialize) -> Result<Value, PayloadError> {
    serde_json::to_value(payload).map_err(|err| PayloadError::Malformed(err.to_string()))
}
