//! Port contracts for event delivery.

pub mod sink;

pub use sink::{EventSink, EventSinkError};
