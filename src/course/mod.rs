//! Course capabilities of the host platform.
//!
//! The archive format and the backup/restore engine are opaque to this
//! crate. They are reached only through the ports in [`ports`]: "produce an
//! archive for a course" and "materialize an archive into a new course".
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
