//! Task queue port.

use crate::scheduler::domain::{PayloadError, QueuedTask, QueuedTaskId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task queue operations.
pub type TaskQueueResult<T> = Result<T, TaskQueueError>;

/// Durable queue of background work.
///
/// Implementations guarantee that a claimed task is handed to exactly one
/// caller.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Adds a task. When a pending task already describes the same unit of
    /// work, nothing is added and the existing identifier is returned.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Persistence`] when the queue cannot be
    /// written.
    async fn enqueue(&self, task: QueuedTask) -> TaskQueueResult<QueuedTaskId>;

    /// Claims the earliest task due at `now`, removing it from the queue.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Persistence`] when the queue cannot be
    /// read.
    async fn claim_due(&self, now: DateTime<Utc>) -> TaskQueueResult<Option<QueuedTask>>;

    /// Returns every pending task in due order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskQueueError::Persistence`] when the queue cannot be
    /// read.
    async fn pending(&self) -> TaskQueueResult<Vec<QueuedTask>>;
}

/// Errors returned by task queue implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskQueueError {
    /// A payload could not be encoded or decoded.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Queue storage failure.
    #[error("task queue error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskQueueError {
    /// Wraps a queue storage error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
