//! Event delivery port.

use crate::events::domain::MigrationEvent;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Receives lifecycle events.
///
/// Delivery failures are logged by callers and never change the outcome of
/// the execution that emitted the event.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers an event.
    ///
    /// # Errors
    ///
    /// Returns [`EventSinkError`] when the event cannot be delivered.
    async fn publish(&self, event: MigrationEvent) -> Result<(), EventSinkError>;
}

/// Errors returned by event sinks.
#[derive(Debug, Clone, Error)]
#[error("event delivery failed: {0}")]
pub struct EventSinkError(pub Arc<dyn std::error::Error + Send + Sync>);

impl EventSinkError {
    /// Wraps a delivery failure.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
