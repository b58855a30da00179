//! Domain model for queued units of work.

mod payload;
mod task;

pub use payload::{BackupPayload, CleanupPayload, PayloadError, RestorePayload};
pub use task::{QueuedTask, QueuedTaskId, TaskKind};
