//! Migration records and their lifecycle.
//!
//! A migration record is the persisted unit of work tracking one
//! backup-then-restore operation. Records are never deleted; they form the
//! audit trail rendered in administrator reports. The status state machine
//! lives on the aggregate so every writer goes through the same transition
//! rules.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
