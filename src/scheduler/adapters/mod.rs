//! Task queue adapters.

pub mod memory;

pub use memory::InMemoryTaskQueue;
