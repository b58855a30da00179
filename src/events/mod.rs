//! Lifecycle events emitted by restore executions.
//!
//! Events carry a fixed payload and a human-readable description. The host
//! platform decides where they go through the [`ports::EventSink`] port.

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
