//! Runs queued units of work one at a time.

use super::{
    BackupOutcome, BackupTaskError, BackupTaskService, CleanupOutcome, CleanupTaskError,
    CourseCleanupService, OrchestrationContext, RestoreOutcome, RestoreTaskError,
    RestoreTaskService,
};
use crate::course::ports::{CourseBackup, CourseRestore};
use crate::migration::ports::MigrationRepository;
use crate::observability::task_span;
use crate::scheduler::{
    domain::{QueuedTask, QueuedTaskId, TaskKind},
    ports::TaskQueueError,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

/// Result of one executed unit of work.
#[derive(Debug)]
pub enum TaskResult {
    /// A backup execution finished.
    Backup(Result<BackupOutcome, BackupTaskError>),
    /// A restore execution finished.
    Restore(Result<RestoreOutcome, RestoreTaskError>),
    /// A cleanup execution finished.
    Cleanup(Result<CleanupOutcome, CleanupTaskError>),
}

impl TaskResult {
    /// Returns whether the execution succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        match self {
            Self::Backup(result) => result.is_ok(),
            Self::Restore(result) => result.is_ok(),
            Self::Cleanup(result) => result.is_ok(),
        }
    }
}

/// What [`TaskDispatcher::run_next`] did.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// No task was due.
    Idle,
    /// A task ran.
    Executed {
        /// Executed task.
        task: QueuedTaskId,
        /// Kind of the executed task.
        kind: TaskKind,
        /// Execution result.
        result: TaskResult,
        /// Due time of the re-enqueued retry, when one was scheduled.
        retry_at: Option<DateTime<Utc>>,
    },
}

/// Errors raised by the dispatcher itself, as opposed to task failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The queue could not be read or written.
    #[error(transparent)]
    Queue(#[from] TaskQueueError),
}

/// Claims due tasks and routes them to the matching service.
pub struct TaskDispatcher<R, H, C>
where
    R: MigrationRepository,
    H: CourseBackup + CourseRestore,
    C: Clock + Send + Sync,
{
    backups: BackupTaskService<R, H, C>,
    restores: RestoreTaskService<R, H, C>,
    cleanups: CourseCleanupService<H>,
    context: OrchestrationContext,
    clock: Arc<C>,
}

impl<R, H, C> TaskDispatcher<R, H, C>
where
    R: MigrationRepository,
    H: CourseBackup + CourseRestore,
    C: Clock + Send + Sync,
{
    /// Builds a dispatcher and the services it routes to.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        host: Arc<H>,
        context: OrchestrationContext,
        clock: Arc<C>,
    ) -> Self {
        Self {
            backups: BackupTaskService::new(
                Arc::clone(&repository),
                Arc::clone(&host),
                context.clone(),
                Arc::clone(&clock),
            ),
            restores: RestoreTaskService::new(
                repository,
                Arc::clone(&host),
                context.clone(),
                Arc::clone(&clock),
            ),
            cleanups: CourseCleanupService::new(host),
            context,
            clock,
        }
    }

    /// Returns the backup service, sharing its running-course markers.
    #[must_use]
    pub const fn backups(&self) -> &BackupTaskService<R, H, C> {
        &self.backups
    }

    /// Claims and executes the next due task.
    ///
    /// A failed restore whose retry was approved is re-enqueued with the
    /// policy's backoff delay.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Queue`] when claiming or re-enqueueing fails.
    /// Task failures are reported in [`DispatchOutcome::Executed`].
    pub async fn run_next(&self) -> Result<DispatchOutcome, DispatchError> {
        let Some(task) = self.context.queue.claim_due(self.clock.utc()).await? else {
            return Ok(DispatchOutcome::Idle);
        };

        let span = task_span(task.kind().as_str(), task.reschedules().saturating_add(1));
        let result = self.execute(&task).instrument(span).await;

        let retry_at = match &result {
            TaskResult::Restore(Err(err)) if err.retry.should_retry => {
                Some(self.reschedule(&task, err.retry.attempt).await?)
            }
            _ => None,
        };

        Ok(DispatchOutcome::Executed {
            task: task.id(),
            kind: task.kind(),
            result,
            retry_at,
        })
    }

    /// Runs due tasks until none is left, returning how many ran.
    ///
    /// # Errors
    ///
    /// Returns the first [`DispatchError`].
    pub async fn run_until_idle(&self) -> Result<usize, DispatchError> {
        let mut executed = 0;
        while let DispatchOutcome::Executed { .. } = self.run_next().await? {
            executed += 1;
        }
        Ok(executed)
    }

    async fn execute(&self, task: &QueuedTask) -> TaskResult {
        let payload = task.payload();
        match task.kind() {
            TaskKind::Backup => TaskResult::Backup(self.backups.execute_payload(payload).await),
            TaskKind::Restore => TaskResult::Restore(self.restores.execute(payload).await),
            TaskKind::CourseCleanup => {
                let result = self.cleanups.execute(payload).await;
                if let Err(err) = &result {
                    tracing::warn!(error = %err, "course cleanup failed");
                }
                TaskResult::Cleanup(result)
            }
        }
    }

    async fn reschedule(
        &self,
        task: &QueuedTask,
        attempt: u32,
    ) -> Result<DateTime<Utc>, DispatchError> {
        let delay = self.context.retry_policy().backoff_delay(attempt);
        let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX);
        let run_after = self
            .clock
            .utc()
            .checked_add_signed(delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let retry = task.rescheduled(run_after);
        self.context.queue.enqueue(retry).await?;
        tracing::info!(task = %task.id(), attempt, %run_after, "restore retry scheduled");
        Ok(run_after)
    }
}
