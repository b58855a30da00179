//! Migration record aggregate root.

use super::{MigrationAction, MigrationDomainError, MigrationId, MigrationStatus};
use crate::course::domain::{CategoryId, CourseId};
use crate::storage::domain::ArchiveFilename;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Persisted unit of migration work.
///
/// `course_id` holds the source course for backup records and the newly
/// created course for restore records. `error` keeps the most recent
/// failure text until the record completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    id: MigrationId,
    action: MigrationAction,
    status: MigrationStatus,
    course_id: Option<CourseId>,
    destination_category_id: Option<CategoryId>,
    filename: Option<ArchiveFilename>,
    error: Option<String>,
    attempts: u32,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    modified_by: Option<String>,
}

/// Parameter object for reconstructing a persisted migration record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMigrationData {
    /// Persisted identifier.
    pub id: MigrationId,
    /// Persisted action.
    pub action: MigrationAction,
    /// Persisted status.
    pub status: MigrationStatus,
    /// Persisted course link, if any.
    pub course_id: Option<CourseId>,
    /// Persisted destination category, if any.
    pub destination_category_id: Option<CategoryId>,
    /// Persisted archive filename, if any.
    pub filename: Option<ArchiveFilename>,
    /// Persisted failure text, if any.
    pub error: Option<String>,
    /// Persisted execution count.
    pub attempts: u32,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub modified_at: DateTime<Utc>,
    /// Persisted actor of the latest modification.
    pub modified_by: Option<String>,
}

impl MigrationRecord {
    /// Creates a restore record queued for an archive that has already been
    /// pushed to storage.
    #[must_use]
    pub fn new_restore(
        filename: ArchiveFilename,
        destination_category_id: CategoryId,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: MigrationId::new(),
            action: MigrationAction::Restore,
            status: MigrationStatus::NotStarted,
            course_id: None,
            destination_category_id: Some(destination_category_id),
            filename: Some(filename),
            error: None,
            attempts: 0,
            created_at: timestamp,
            modified_at: timestamp,
            modified_by: None,
        }
    }

    /// Creates an audit record for input that failed validation.
    #[must_use]
    pub fn new_invalid(
        action: MigrationAction,
        course_id: Option<CourseId>,
        destination_category_id: Option<CategoryId>,
        error: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: MigrationId::new(),
            action,
            status: MigrationStatus::Invalid,
            course_id,
            destination_category_id,
            filename: None,
            error: Some(error.into()),
            attempts: 0,
            created_at: timestamp,
            modified_at: timestamp,
            modified_by: None,
        }
    }

    /// Reconstructs a record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedMigrationData) -> Self {
        Self {
            id: data.id,
            action: data.action,
            status: data.status,
            course_id: data.course_id,
            destination_category_id: data.destination_category_id,
            filename: data.filename,
            error: data.error,
            attempts: data.attempts,
            created_at: data.created_at,
            modified_at: data.modified_at,
            modified_by: data.modified_by,
        }
    }

    /// Records the actor responsible for subsequent modifications.
    #[must_use]
    pub fn with_modified_by(mut self, actor: impl Into<String>) -> Self {
        self.modified_by = Some(actor.into());
        self
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> MigrationId {
        self.id
    }

    /// Returns the record action.
    #[must_use]
    pub const fn action(&self) -> MigrationAction {
        self.action
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> MigrationStatus {
        self.status
    }

    /// Returns the linked course, if any.
    #[must_use]
    pub const fn course_id(&self) -> Option<CourseId> {
        self.course_id
    }

    /// Returns the destination category, if any.
    #[must_use]
    pub const fn destination_category_id(&self) -> Option<CategoryId> {
        self.destination_category_id
    }

    /// Returns the archive filename, if any.
    #[must_use]
    pub const fn filename(&self) -> Option<&ArchiveFilename> {
        self.filename.as_ref()
    }

    /// Returns the most recent failure text, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns how many executions have started for this record.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Returns the actor of the latest modification, if recorded.
    #[must_use]
    pub fn modified_by(&self) -> Option<&str> {
        self.modified_by.as_deref()
    }

    /// Moves the record to `next`.
    ///
    /// Completing a record clears its failure text.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationDomainError::InvalidStateTransition`] when the
    /// lifecycle does not permit the change.
    pub fn transition_to(
        &mut self,
        next: MigrationStatus,
        clock: &impl Clock,
    ) -> Result<(), MigrationDomainError> {
        if !self.status.can_transition_to(next) {
            return Err(MigrationDomainError::InvalidStateTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        if next == MigrationStatus::Completed {
            self.error = None;
        }
        self.touch(clock);
        Ok(())
    }

    /// Starts a new execution: moves to `InProgress` unless already there
    /// and increments the attempt counter.
    ///
    /// Returns the attempt number of the execution that just started.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationDomainError::InvalidStateTransition`] when the
    /// record cannot be executed from its current status.
    pub fn begin_attempt(&mut self, clock: &impl Clock) -> Result<u32, MigrationDomainError> {
        if self.status != MigrationStatus::InProgress {
            self.transition_to(MigrationStatus::InProgress, clock)?;
        }
        self.attempts = self.attempts.saturating_add(1);
        self.touch(clock);
        Ok(self.attempts)
    }

    /// Links the course created by the current restore.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationDomainError::CourseAlreadyAssigned`] when a course
    /// is already linked; the caller must release it first.
    pub fn assign_course(
        &mut self,
        course_id: CourseId,
        clock: &impl Clock,
    ) -> Result<(), MigrationDomainError> {
        if let Some(existing) = self.course_id {
            return Err(MigrationDomainError::CourseAlreadyAssigned {
                id: self.id,
                course_id: existing,
            });
        }
        self.course_id = Some(course_id);
        self.touch(clock);
        Ok(())
    }

    /// Unlinks the current course and returns it so the caller can schedule
    /// its deletion.
    pub fn release_course(&mut self, clock: &impl Clock) -> Option<CourseId> {
        let released = self.course_id.take();
        if released.is_some() {
            self.touch(clock);
        }
        released
    }

    /// Replaces the failure text without changing status.
    pub fn record_error(&mut self, message: impl Into<String>, clock: &impl Clock) {
        self.error = Some(message.into());
        self.touch(clock);
    }

    /// Marks the current execution as failed with the given text.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationDomainError::InvalidStateTransition`] when the
    /// record is not in progress.
    pub fn fail(
        &mut self,
        message: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), MigrationDomainError> {
        self.transition_to(MigrationStatus::Failed, clock)?;
        self.error = Some(message.into());
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.modified_at = clock.utc();
    }
}
