//! Event sink writing events to the structured log.

use crate::events::{
    domain::MigrationEvent,
    ports::{EventSink, EventSinkError},
};
use async_trait::async_trait;

/// Sink that records each event as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn publish(&self, event: MigrationEvent) -> Result<(), EventSinkError> {
        let payload = serde_json::to_string(&event).map_err(EventSinkError::delivery)?;
        match &event {
            MigrationEvent::RestoreCompleted { .. } => tracing::info!(
                event = event.name(),
                filename = event.filename(),
                %payload,
                "{}",
                event.description()
            ),
            MigrationEvent::RestoreFailed { .. } => tracing::warn!(
                event = event.name(),
                filename = event.filename(),
                %payload,
                "{}",
                event.description()
            ),
        }
        Ok(())
    }
}
