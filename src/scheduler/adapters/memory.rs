//! In-memory task queue.

use crate::scheduler::{
    domain::{QueuedTask, QueuedTaskId},
    ports::{TaskQueue, TaskQueueError, TaskQueueResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory queue. Tasks due at the same instant are claimed
/// in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskQueue {
    tasks: Arc<RwLock<Vec<QueuedTask>>>,
}

impl InMemoryTaskQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl ToString) -> TaskQueueError {
    TaskQueueError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, task: QueuedTask) -> TaskQueueResult<QueuedTaskId> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        if let Some(existing) = tasks.iter().find(|pending| pending.same_work(&task)) {
            tracing::debug!(kind = %task.kind(), id = %existing.id(), "identical task already queued");
            return Ok(existing.id());
        }
        let id = task.id();
        tasks.push(task);
        Ok(id)
    }

    async fn claim_due(&self, now: DateTime<Utc>) -> TaskQueueResult<Option<QueuedTask>> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let due = tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.run_after() <= now)
            .min_by_key(|(position, task)| (task.run_after(), *position))
            .map(|(position, _)| position);
        Ok(due.map(|position| tasks.remove(position)))
    }

    async fn pending(&self) -> TaskQueueResult<Vec<QueuedTask>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        let mut ordered = tasks.clone();
        ordered.sort_by_key(QueuedTask::run_after);
        Ok(ordered)
    }
}
