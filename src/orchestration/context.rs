//! Collaborators shared by every orchestration service.

use super::RetryPolicy;
use crate::config::MigrationConfig;
use crate::course::domain::CourseId;
use crate::events::{domain::MigrationEvent, ports::EventSink};
use crate::scheduler::{
    domain::{CleanupPayload, QueuedTask},
    ports::TaskQueue,
};
use crate::storage::ports::StorageBackend;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Queue, event sink, storage and configuration handed to each service.
#[derive(Clone)]
pub struct OrchestrationContext {
    /// Queue for follow-up work.
    pub queue: Arc<dyn TaskQueue>,
    /// Destination of lifecycle events.
    pub events: Arc<dyn EventSink>,
    /// Selected storage backend; `None` when storage is not configured.
    pub storage: Option<Arc<dyn StorageBackend>>,
    /// Engine configuration.
    pub config: Arc<MigrationConfig>,
}

impl OrchestrationContext {
    /// Bundles the shared collaborators.
    #[must_use]
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        events: Arc<dyn EventSink>,
        storage: Option<Arc<dyn StorageBackend>>,
        config: Arc<MigrationConfig>,
    ) -> Self {
        Self {
            queue,
            events,
            storage,
            config,
        }
    }

    /// Returns the storage backend as a borrowed trait object.
    #[must_use]
    pub fn storage(&self) -> Option<&dyn StorageBackend> {
        self.storage.as_deref()
    }

    /// Returns the retry policy derived from configuration.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.config)
    }

    /// Publishes an event. Delivery failures are logged and swallowed.
    pub(crate) async fn publish(&self, event: MigrationEvent) {
        let name = event.name();
        if let Err(err) = self.events.publish(event).await {
            tracing::warn!(event = name, error = %err, "failed to publish lifecycle event");
        }
    }

    /// Queues deletion of an orphaned course. Failures are logged; the
    /// cleanup outcome never affects the caller.
    pub(crate) async fn schedule_cleanup(&self, course_id: CourseId, now: DateTime<Utc>) {
        let queued = match QueuedTask::cleanup(CleanupPayload { course_id }, now) {
            Ok(task) => self.queue.enqueue(task).await.map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };
        match queued {
            Ok(task_id) => tracing::info!(%course_id, %task_id, "course cleanup scheduled"),
            Err(error) => tracing::error!(%course_id, %error, "failed to schedule course cleanup"),
        }
    }
}

impl std::fmt::Debug for OrchestrationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestrationContext")
            .field("storage", &self.storage.as_ref().map(|storage| storage.name()))
            .field("max_restore_retries", &self.config.max_restore_retries)
            .finish_non_exhaustive()
    }
}
