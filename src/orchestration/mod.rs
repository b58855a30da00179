//! Migration orchestration services.
//!
//! Each service drives one kind of background execution against the ports
//! of the other bounded contexts:
//!
//! - [`BackupTaskService`] archives a course, pushes it and queues a restore
//! - [`RestoreTaskService`] pulls an archive and restores it into a course
//! - [`CourseCleanupService`] deletes courses left by interrupted restores
//! - [`RetryPolicy`] decides whether a failed restore runs again
//! - [`BulkIntakeProcessor`] runs one backup per row of an uploaded list
//! - [`TaskDispatcher`] claims queued tasks and routes them to the services

mod backup;
mod cleanup;
mod context;
mod dispatcher;
mod failure;
mod intake;
mod restore;
mod retry;

pub use backup::{
    BackupOutcome, BackupRequest, BackupTaskError, BackupTaskResult, BackupTaskService,
};
pub use cleanup::{CleanupOutcome, CleanupTaskError, CourseCleanupService};
pub use context::OrchestrationContext;
pub use dispatcher::{DispatchError, DispatchOutcome, TaskDispatcher, TaskResult};
pub use failure::{FailureKind, MigrationFailure};
pub use intake::{
    BulkIntakeProcessor, IntakeDelimiter, IntakeError, IntakeFile, IntakeFileError, IntakeRow,
    IntakeSummary, SummaryRenderError,
};
pub use restore::{
    INVALID_DATA, INVALID_ID, RESTORE_FAILED_PREFIX, RestoreOutcome, RestoreTaskError,
    RestoreTaskService, STORAGE_NOT_CONFIGURED, STORAGE_NOT_READY_FOR_PULL,
    task_restarted_message,
};
pub use retry::{RetryDecision, RetryPolicy, RetryReason};

#[cfg(test)]
mod tests;
