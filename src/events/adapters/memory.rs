//! Recording event sink for tests.

use crate::events::{
    domain::MigrationEvent,
    ports::{EventSink, EventSinkError},
};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Thread-safe sink that keeps every published event in order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventSink {
    events: Arc<RwLock<Vec<MigrationEvent>>>,
}

impl InMemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the published events.
    ///
    /// # Errors
    ///
    /// Returns [`EventSinkError`] when lock acquisition fails.
    pub fn events(&self) -> Result<Vec<MigrationEvent>, EventSinkError> {
        let events = self
            .events
            .read()
            .map_err(|err| EventSinkError::delivery(std::io::Error::other(err.to_string())))?;
        Ok(events.clone())
    }

    /// Returns the published events with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`EventSinkError`] when lock acquisition fails.
    pub fn named(&self, name: &str) -> Result<Vec<MigrationEvent>, EventSinkError> {
        Ok(self
            .events()?
            .into_iter()
            .filter(|event| event.name() == name)
            .collect())
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn publish(&self, event: MigrationEvent) -> Result<(), EventSinkError> {
        let mut events = self
            .events
            .write()
            .map_err(|err| EventSinkError::delivery(std::io::Error::other(err.to_string())))?;
        events.push(event);
        Ok(())
    }
}
