//! Event sink adapters.

pub mod memory;
pub mod tracing_sink;

pub use memory::InMemoryEventSink;
pub use tracing_sink::TracingEventSink;
