//! Port contracts for archive storage.
//!
//! Ports define infrastructure-agnostic interfaces used by orchestration
//! services.

pub mod backend;

pub use backend::{LastErrorSlot, StorageBackend, StorageError, StorageResult};
