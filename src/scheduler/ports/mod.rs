//! Port contracts for the task queue.

pub mod queue;

pub use queue::{TaskQueue, TaskQueueError, TaskQueueResult};
