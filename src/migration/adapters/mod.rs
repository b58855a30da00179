//! Adapter implementations of the migration repository port.

pub mod memory;
pub mod postgres;
