//! Background unit-of-work queue.
//!
//! Backup, restore and cleanup executions are queued with a JSON payload and
//! a due time. Claiming a due task removes it from the queue, so a unit of
//! work is never executed twice concurrently. A rescheduled task carries the
//! number of delays already applied to it.

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
