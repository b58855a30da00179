//! Domain model for lifecycle events.

mod event;

pub use event::MigrationEvent;
