//! Archive storage backends.
//!
//! A storage backend moves archive files between the orchestration engine
//! and a durable location. Backends advertise a capability set instead of
//! sharing a base type, so a push-only backend (such as the remote web
//! service) is simply one that is never ready for pull.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
