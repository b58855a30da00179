//! Restore task: pull an archive and materialize it as a new course.
//!
//! One call to [`RestoreTaskService::execute`] is one execution of the
//! restore task for one migration record. Every failure is caught here,
//! recorded on the migration, published as a `restore_failed` event and
//! returned together with the retry controller's decision, which the
//! dispatcher turns into a delayed re-enqueue.

use super::{FailureKind, MigrationFailure, OrchestrationContext, RetryDecision, RetryReason};
use crate::course::{
    domain::{Category, Course, CourseId},
    ports::{CourseHostError, CourseRestore},
};
use crate::events::domain::MigrationEvent;
use crate::migration::{
    domain::{MigrationAction, MigrationId, MigrationRecord, MigrationStatus},
    ports::MigrationRepository,
};
use crate::scheduler::domain::RestorePayload;
use crate::storage::{
    domain::{ArchiveFilename, LocalArtifact},
    ports::{StorageBackend, StorageError},
};
use camino::{Utf8Path, Utf8PathBuf};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use thiserror::Error;

/// Prefix of every failure recorded by a started restore execution.
pub const RESTORE_FAILED_PREFIX: &str = "Cannot restore the course. ";
/// Failure text when no storage backend is selected.
pub const STORAGE_NOT_CONFIGURED: &str = "A storage class has not been configured";
/// Failure text when the selected backend cannot pull.
pub const STORAGE_NOT_READY_FOR_PULL: &str = "Selected storage is not ready for pull";
/// Failure text for a payload without a record identifier.
pub const INVALID_DATA: &str = "Invalid data. Error: missing one of the required parameters.";
/// Failure text for an unknown record identifier.
pub const INVALID_ID: &str = "Invalid id. Error: could not find record for restore.";

/// Builds the text recorded when an execution finds a course left behind by
/// an interrupted attempt.
#[must_use]
pub fn task_restarted_message(course_id: CourseId) -> String {
    format!("Task restarted, orphaned course {course_id} scheduled for deletion")
}

fn pull_failed_message(detail: &str) -> String {
    format!("File can not be pulled from the storage. Error: {detail}")
}

/// A completed restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// Completed record.
    pub migration_id: MigrationId,
    /// Newly created course.
    pub course_id: CourseId,
    /// Full name of the new course.
    pub course_name: String,
    /// Attempt number of the successful execution.
    pub attempt: u32,
}

/// A failed restore execution.
///
/// `retry` tells the caller whether to reschedule the execution; the
/// record is already in `Retrying` when it approves.
#[derive(Debug, Clone, Error)]
#[error("{failure}")]
pub struct RestoreTaskError {
    /// Record the execution was for, when known.
    pub migration_id: Option<MigrationId>,
    /// Classified failure with the recorded text.
    pub failure: MigrationFailure,
    /// Retry controller decision.
    pub retry: RetryDecision,
}

impl RestoreTaskError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.failure.kind()
    }
}

struct Restored {
    course: Course,
    category: Category,
    filename: ArchiveFilename,
}

/// Restore task orchestration service.
#[derive(Clone)]
pub struct RestoreTaskService<R, H, C>
where
    R: MigrationRepository,
    H: CourseRestore,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    host: Arc<H>,
    context: OrchestrationContext,
    clock: Arc<C>,
}

impl<R, H, C> RestoreTaskService<R, H, C>
where
    R: MigrationRepository,
    H: CourseRestore,
    C: Clock + Send + Sync,
{
    /// Creates a new restore task service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        host: Arc<H>,
        context: OrchestrationContext,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            host,
            context,
            clock,
        }
    }

    /// Runs one restore execution for the record named in `data`.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreTaskError`] for any failure. Validation failures and
    /// unknown records are rejected before the record changes; every later
    /// failure leaves the record `Failed`, or `Retrying` when the returned
    /// decision approves a retry.
    #[tracing::instrument(name = "restore_task", skip_all, fields(migration_id = tracing::field::Empty))]
    pub async fn execute(&self, data: &Value) -> Result<RestoreOutcome, RestoreTaskError> {
        let payload = match RestorePayload::from_custom_data(data) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "restore payload rejected");
                return Err(self
                    .reject(
                        None,
                        None,
                        MigrationFailure::validation(INVALID_DATA),
                        RetryReason::NotRetryable(FailureKind::Validation),
                    )
                    .await);
            }
        };
        let migration_id = payload.migration_id;
        tracing::Span::current().record("migration_id", tracing::field::display(migration_id));

        let mut record = match self.repository.find_by_id(migration_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                return Err(self
                    .reject(
                        Some(migration_id),
                        None,
                        MigrationFailure::not_found(INVALID_ID),
                        RetryReason::NotRetryable(FailureKind::NotFound),
                    )
                    .await);
            }
            Err(err) => {
                let failure = MigrationFailure::transport(format!("{RESTORE_FAILED_PREFIX}{err}"));
                return Err(self
                    .reject(
                        Some(migration_id),
                        None,
                        failure,
                        RetryReason::RecordUnavailable(err.to_string()),
                    )
                    .await);
            }
        };

        if record.action() != MigrationAction::Restore || !record.status().accepts_execution() {
            let failure = MigrationFailure::validation(format!(
                "Invalid data. Error: migration {migration_id} is a {} record in status {} and cannot be restored.",
                record.action(),
                record.status()
            ));
            return Err(self
                .reject(
                    Some(migration_id),
                    record.filename().cloned(),
                    failure,
                    RetryReason::NotRetryable(FailureKind::Validation),
                )
                .await);
        }

        let attempt = self.start_attempt(&mut record).await?;
        tracing::info!(attempt, "restore started");

        let result = match create_working_dir() {
            Ok((guard, working_dir)) => {
                let result = self.attempt(&mut record, &working_dir).await;
                remove_working_dir(guard);
                result
            }
            Err(failure) => Err(failure),
        };

        match result {
            Ok(restored) => Ok(self.finish(&record, restored, attempt).await),
            Err(failure) => Err(self.handle_failure(record, failure).await),
        }
    }

    /// Releases any course left by an interrupted attempt, moves the record
    /// to `InProgress` and counts the attempt, persisting all three at once.
    async fn start_attempt(&self, record: &mut MigrationRecord) -> Result<u32, RestoreTaskError> {
        let clock = &*self.clock;
        let orphan = record.release_course(clock);
        if let Some(course_id) = orphan {
            tracing::warn!(%course_id, "restore restarted with a partially restored course");
            record.record_error(task_restarted_message(course_id), clock);
        }

        let attempt = match record.begin_attempt(clock) {
            Ok(attempt) => attempt,
            Err(err) => {
                return Err(self
                    .reject(
                        Some(record.id()),
                        record.filename().cloned(),
                        MigrationFailure::validation(err.to_string()),
                        RetryReason::NotRetryable(FailureKind::Validation),
                    )
                    .await);
            }
        };

        if let Err(err) = self.repository.update(record).await {
            let failure = MigrationFailure::transport(format!("{RESTORE_FAILED_PREFIX}{err}"));
            return Err(self
                .reject(
                    Some(record.id()),
                    record.filename().cloned(),
                    failure,
                    RetryReason::RecordUnavailable(err.to_string()),
                )
                .await);
        }

        if let Some(course_id) = orphan {
            self.context.schedule_cleanup(course_id, clock.utc()).await;
        }
        Ok(attempt)
    }

    async fn attempt(
        &self,
        record: &mut MigrationRecord,
        working_dir: &Utf8Path,
    ) -> Result<Restored, MigrationFailure> {
        let clock = &*self.clock;
        let category_id = record
            .destination_category_id()
            .or(self.context.config.default_destination_category)
            .ok_or_else(|| MigrationFailure::validation("Destination category is not set"))?;
        let category = self
            .host
            .find_category(category_id)
            .await
            .map_err(host_failure)?
            .ok_or_else(|| {
                MigrationFailure::not_found(format!("Category {category_id} does not exist"))
            })?;

        let storage = self
            .context
            .storage()
            .ok_or_else(|| MigrationFailure::configuration(STORAGE_NOT_CONFIGURED))?;
        if !storage.ready_for_pull() {
            return Err(MigrationFailure::configuration(STORAGE_NOT_READY_FOR_PULL));
        }

        let filename = record
            .filename()
            .cloned()
            .ok_or_else(|| MigrationFailure::validation("The migration has no archive filename"))?;
        let artifact = storage
            .pull(&filename)
            .await
            .map_err(|err| pull_failure(storage, &err))?;

        let extracted = self.host.extract_archive(&artifact, working_dir).await;
        discard_pulled_copy(artifact).await;
        extracted.map_err(host_failure)?;

        let course_id = self
            .host
            .create_course_shell(category.id)
            .await
            .map_err(host_failure)?;
        record
            .assign_course(course_id, clock)
            .map_err(|err| MigrationFailure::restore_execution(err.to_string()))?;
        self.repository
            .update(record)
            .await
            .map_err(|err| MigrationFailure::transport(err.to_string()))?;
        tracing::debug!(%course_id, "course shell created");

        self.host
            .execute_precheck(working_dir, course_id)
            .await
            .map_err(host_failure)?;
        self.host
            .execute_plan(working_dir, course_id)
            .await
            .map_err(host_failure)?;

        let course = self
            .host
            .find_course(course_id)
            .await
            .map_err(host_failure)?
            .ok_or_else(|| {
                MigrationFailure::restore_execution(format!(
                    "Restored course {course_id} no longer exists"
                ))
            })?;

        let mut completed = record.clone();
        completed
            .transition_to(MigrationStatus::Completed, clock)
            .map_err(|err| MigrationFailure::restore_execution(err.to_string()))?;
        self.repository
            .update(&completed)
            .await
            .map_err(|err| MigrationFailure::transport(err.to_string()))?;
        *record = completed;

        Ok(Restored {
            course,
            category,
            filename,
        })
    }

    /// Post-completion steps. None of them can fail the restore.
    async fn finish(
        &self,
        record: &MigrationRecord,
        restored: Restored,
        attempt: u32,
    ) -> RestoreOutcome {
        let Restored {
            course,
            category,
            filename,
        } = restored;
        tracing::info!(course_id = %course.id, %filename, "restore completed");

        if self.context.config.hide_restored_course {
            if let Err(err) = self.host.hide_course(course.id).await {
                tracing::warn!(course_id = %course.id, error = %err, "failed to hide restored course");
            }
        }

        self.context
            .publish(MigrationEvent::RestoreCompleted {
                migration_id: record.id(),
                course_id: course.id,
                course_name: course.full_name.clone(),
                destination_category_id: category.id,
                destination_category_name: category.name,
                filename: filename.clone(),
            })
            .await;

        if self.context.config.delete_on_success {
            if let Some(storage) = self.context.storage() {
                delete_archive(storage, &filename).await;
            }
        }

        RestoreOutcome {
            migration_id: record.id(),
            course_id: course.id,
            course_name: course.full_name,
            attempt,
        }
    }

    async fn handle_failure(
        &self,
        mut record: MigrationRecord,
        failure: MigrationFailure,
    ) -> RestoreTaskError {
        let clock = &*self.clock;
        let failure = failure.prefixed(RESTORE_FAILED_PREFIX);
        tracing::error!(kind = %failure.kind(), error = failure.message(), "restore failed");

        if let Err(err) = record.fail(failure.message(), clock) {
            tracing::error!(error = %err, "failed to mark migration as failed");
        }
        // The partial course is handed to cleanup now, so failed rows keep no course id.
        let orphan = record.release_course(clock);
        if let Err(err) = self.repository.update(&record).await {
            tracing::error!(error = %err, "failed to persist restore failure");
        }

        self.context
            .publish(MigrationEvent::RestoreFailed {
                migration_id: Some(record.id()),
                error: failure.message().to_owned(),
                filename: record.filename().cloned(),
            })
            .await;

        if let Some(course_id) = orphan {
            self.context.schedule_cleanup(course_id, clock.utc()).await;
        }

        let storage = self.context.storage();
        if self.context.config.delete_on_fail {
            if let (Some(storage), Some(filename)) = (storage, record.filename()) {
                if matches!(storage.exists(filename).await, Ok(true)) {
                    delete_archive(storage, filename).await;
                } else {
                    storage.clear_error();
                }
            }
        }

        let mut retry = self
            .context
            .retry_policy()
            .decide(&record, failure.kind(), storage)
            .await;
        if retry.should_retry {
            retry = self.mark_retrying(&mut record, retry).await;
        } else {
            tracing::info!(reason = %retry.reason, attempt = retry.attempt, "restore will not be retried");
        }

        RestoreTaskError {
            migration_id: Some(record.id()),
            failure,
            retry,
        }
    }

    async fn mark_retrying(
        &self,
        record: &mut MigrationRecord,
        approved: RetryDecision,
    ) -> RetryDecision {
        let persisted = match record.transition_to(MigrationStatus::Retrying, &*self.clock) {
            Ok(()) => self
                .repository
                .update(record)
                .await
                .map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };
        match persisted {
            Ok(()) => {
                tracing::info!(attempt = approved.attempt, "restore will be retried");
                approved
            }
            Err(detail) => {
                tracing::error!(error = %detail, "failed to mark migration for retry");
                RetryDecision::declined(approved.attempt, RetryReason::RecordUnavailable(detail))
            }
        }
    }

    /// Fails an execution that never started work on the record.
    async fn reject(
        &self,
        migration_id: Option<MigrationId>,
        filename: Option<ArchiveFilename>,
        failure: MigrationFailure,
        reason: RetryReason,
    ) -> RestoreTaskError {
        tracing::error!(kind = %failure.kind(), error = failure.message(), "restore rejected");
        self.context
            .publish(MigrationEvent::RestoreFailed {
                migration_id,
                error: failure.message().to_owned(),
                filename,
            })
            .await;
        RestoreTaskError {
            migration_id,
            failure,
            retry: RetryDecision::declined(0, reason),
        }
    }
}

fn host_failure(err: CourseHostError) -> MigrationFailure {
    match err {
        CourseHostError::CategoryNotFound(_) => MigrationFailure::not_found(err.to_string()),
        other => MigrationFailure::restore_execution(other.to_string()),
    }
}

fn pull_failure(storage: &dyn StorageBackend, err: &StorageError) -> MigrationFailure {
    let detail = storage.last_error().unwrap_or_else(|| err.to_string());
    storage.clear_error();
    let kind = match err {
        StorageError::NotFound(_) => FailureKind::NotFound,
        _ => FailureKind::Transport,
    };
    MigrationFailure::new(kind, pull_failed_message(&detail))
}

async fn delete_archive(storage: &dyn StorageBackend, filename: &ArchiveFilename) {
    match storage.delete(filename).await {
        Ok(()) => tracing::info!(%filename, "archive deleted from storage"),
        Err(err) => {
            let detail = storage.last_error().unwrap_or_else(|| err.to_string());
            storage.clear_error();
            tracing::warn!(%filename, error = %detail, "failed to delete archive from storage");
        }
    }
}

async fn discard_pulled_copy(artifact: LocalArtifact) {
    let path = artifact.path().to_owned();
    let deleted = tokio::task::spawn_blocking(move || artifact.delete()).await;
    match deleted {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!(%path, error = %err, "failed to delete pulled archive copy"),
        Err(err) => tracing::warn!(%path, error = %err, "pulled archive cleanup did not run"),
    }
}

fn create_working_dir() -> Result<(TempDir, Utf8PathBuf), MigrationFailure> {
    let dir = tempfile::Builder::new()
        .prefix("restore_")
        .tempdir()
        .map_err(|err| {
            MigrationFailure::transport(format!("Cannot create restore working directory: {err}"))
        })?;
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).map_err(|path| {
        MigrationFailure::transport(format!(
            "Restore working directory {} is not valid UTF-8",
            path.display()
        ))
    })?;
    Ok((dir, path))
}

fn remove_working_dir(dir: TempDir) {
    if let Err(err) = dir.close() {
        tracing::warn!(error = %err, "failed to remove restore working directory");
    }
}
