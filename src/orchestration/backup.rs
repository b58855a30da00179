//! Backup task: archive a course, push it and queue its restore.

use super::OrchestrationContext;
use crate::course::{
    domain::{ArchiveHandle, CategoryId, CourseId},
    ports::{CourseBackup, CourseHostError},
};
use crate::migration::{
    domain::{MigrationId, MigrationRecord, MigrationStatus},
    ports::{MigrationRepository, MigrationRepositoryError},
};
use crate::scheduler::{
    domain::{BackupPayload, PayloadError, QueuedTask, QueuedTaskId, RestorePayload},
    ports::TaskQueueError,
};
use crate::storage::domain::ArchiveFilename;
use mockable::Clock;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Request to migrate one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupRequest {
    /// Course to archive.
    pub course_id: CourseId,
    /// Category the restored course goes into.
    pub destination_category_id: CategoryId,
}

impl BackupRequest {
    /// Creates a request.
    #[must_use]
    pub const fn new(course_id: CourseId, destination_category_id: CategoryId) -> Self {
        Self {
            course_id,
            destination_category_id,
        }
    }
}

impl From<BackupPayload> for BackupRequest {
    fn from(payload: BackupPayload) -> Self {
        Self::new(payload.course_id, payload.destination_category_id)
    }
}

/// A pushed archive with its queued restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOutcome {
    /// Restore record created for the archive.
    pub migration_id: MigrationId,
    /// Archive name in storage.
    pub filename: ArchiveFilename,
    /// Queued restore execution.
    pub restore_task: QueuedTaskId,
}

/// Service-level errors for backup executions.
#[derive(Debug, Error)]
pub enum BackupTaskError {
    /// Another backup of the same course is running.
    #[error("a backup of course {0} is already running")]
    AlreadyRunning(CourseId),

    /// No storage backend is selected.
    #[error("A storage class has not been configured")]
    StorageNotConfigured,

    /// The selected backend cannot accept pushes.
    #[error("Selected storage is not ready for push")]
    StorageNotReadyForPush,

    /// The host could not produce the archive.
    #[error("Cannot back up the course. {0}")]
    Backup(#[source] CourseHostError),

    /// The archive could not be pushed.
    #[error("File can not be pushed to the storage. Error: {detail}")]
    Push {
        /// Archive name.
        filename: ArchiveFilename,
        /// Backend failure detail.
        detail: String,
    },

    /// The task payload could not be decoded.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Persisting the restore record failed.
    #[error(transparent)]
    Repository(#[from] MigrationRepositoryError),

    /// Queueing the restore failed; the record was marked invalid.
    #[error("Cannot queue the restore: {0}")]
    Queue(#[from] TaskQueueError),
}

/// Result type for backup executions.
pub type BackupTaskResult<T> = Result<T, BackupTaskError>;

/// Backup task orchestration service.
#[derive(Clone)]
pub struct BackupTaskService<R, H, C>
where
    R: MigrationRepository,
    H: CourseBackup,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    host: Arc<H>,
    context: OrchestrationContext,
    clock: Arc<C>,
    running: Arc<Mutex<HashSet<CourseId>>>,
}

/// Exclusive marker for one course's backup; released on drop.
struct AttemptMarker {
    running: Arc<Mutex<HashSet<CourseId>>>,
    course_id: CourseId,
}

impl AttemptMarker {
    fn acquire(running: &Arc<Mutex<HashSet<CourseId>>>, course_id: CourseId) -> Option<Self> {
        let mut active = running.lock().unwrap_or_else(PoisonError::into_inner);
        active.insert(course_id).then(|| Self {
            running: Arc::clone(running),
            course_id,
        })
    }
}

impl Drop for AttemptMarker {
    fn drop(&mut self) {
        let mut active = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        active.remove(&self.course_id);
    }
}

impl<R, H, C> BackupTaskService<R, H, C>
where
    R: MigrationRepository,
    H: CourseBackup,
    C: Clock + Send + Sync,
{
    /// Creates a new backup task service.
    #[must_use]
    pub fn new(
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
            running: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Runs a backup described by raw task data.
    ///
    /// # Errors
    ///
    /// Returns [`BackupTaskError::Payload`] when the data is not a backup
    /// payload, and any error from [`BackupTaskService::execute`].
    pub async fn execute_payload(&self, data: &Value) -> BackupTaskResult<BackupOutcome> {
        let payload: BackupPayload = serde_json::from_value(data.clone())
            .map_err(|err| PayloadError::Malformed(err.to_string()))?;
        self.execute(payload.into()).await
    }

    /// Archives the course, pushes the archive, records a queued restore
    /// and enqueues its execution.
    ///
    /// No record is created when archiving or pushing fails.
    ///
    /// # Errors
    ///
    /// Returns [`BackupTaskError`] describing the first failing step.
    #[tracing::instrument(
        name = "backup_task",
        skip(self),
        fields(course_id = %request.course_id, category_id = %request.destination_category_id)
    )]
    pub async fn execute(&self, request: BackupRequest) -> BackupTaskResult<BackupOutcome> {
        let _marker = AttemptMarker::acquire(&self.running, request.course_id)
            .ok_or(BackupTaskError::AlreadyRunning(request.course_id))?;

        let storage = self
            .context
            .storage()
            .ok_or(BackupTaskError::StorageNotConfigured)?;
        if !storage.ready_for_push() {
            return Err(BackupTaskError::StorageNotReadyForPush);
        }

        let archive = self
            .host
            .backup(request.course_id)
            .await
            .map_err(BackupTaskError::Backup)?;
        let filename = archive.filename().clone();
        tracing::debug!(%filename, "course archive produced");

        let pushed = storage.push(&filename, archive.artifact()).await;
        if let Err(err) = pushed {
            let detail = storage.last_error().unwrap_or_else(|| err.to_string());
            storage.clear_error();
            tracing::error!(%filename, error = %detail, "archive push failed");
            if self.context.config.delete_local_archive_after_failed_push {
                self.discard(&archive).await;
            }
            return Err(BackupTaskError::Push { filename, detail });
        }
        self.discard(&archive).await;
        tracing::info!(%filename, backend = storage.name(), "archive pushed");

        self.queue_restore(request, filename).await
    }

    async fn queue_restore(
        &self,
        request: BackupRequest,
        filename: ArchiveFilename,
    ) -> BackupTaskResult<BackupOutcome> {
        let clock = &*self.clock;
        let mut record =
            MigrationRecord::new_restore(filename.clone(), request.destination_category_id, clock);
        self.repository.store(&record).await?;

        let queued = match QueuedTask::restore(
            RestorePayload {
                migration_id: record.id(),
            },
            clock.utc(),
        ) {
            Ok(task) => self.context.queue.enqueue(task).await,
            Err(err) => Err(TaskQueueError::from(err)),
        };

        match queued {
            Ok(restore_task) => {
                tracing::info!(migration_id = %record.id(), %restore_task, "restore queued");
                Ok(BackupOutcome {
                    migration_id: record.id(),
                    filename,
                    restore_task,
                })
            }
            Err(err) => {
                tracing::error!(migration_id = %record.id(), error = %err, "failed to queue restore");
                let marked = record.transition_to(MigrationStatus::Invalid, clock);
                if marked.is_ok() {
                    record.record_error(format!("Cannot queue the restore: {err}"), clock);
                    if let Err(update_err) = self.repository.update(&record).await {
                        tracing::error!(error = %update_err, "failed to mark unqueued migration invalid");
                    }
                }
                Err(BackupTaskError::Queue(err))
            }
        }
    }

    async fn discard(&self, archive: &ArchiveHandle) {
        if let Err(err) = self.host.discard(archive).await {
            tracing::warn!(filename = %archive.filename(), error = %err, "failed to discard local archive");
        }
    }
}
