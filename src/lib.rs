//! Coursemigration: course migration orchestration between two installations
//! of an online-course platform.
//!
//! A course is packaged into a portable backup archive on the source
//! installation, transferred through a pluggable storage backend, and
//! restored on the destination installation. This crate provides the
//! orchestration engine that drives every migration record through its
//! lifecycle, the bounded retry policy for transient failures, and the
//! storage abstraction that decouples the transfer mechanism from the
//! orchestration logic.
//!
//! # Architecture
//!
//! Coursemigration follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, disk, HTTP)
//!
//! # Modules
//!
//! - [`config`]: Immutable migration configuration
//! - [`course`]: Opaque course backup/restore capabilities of the host platform
//! - [`events`]: Lifecycle events emitted by restore executions
//! - [`migration`]: Migration records and their status state machine
//! - [`observability`]: Structured logging setup and task spans
//! - [`orchestration`]: Backup, restore, cleanup, retry, bulk intake, and the
//!   task dispatcher that drains the queue
//! - [`scheduler`]: Queue abstraction for background units of work
//! - [`storage`]: Storage backends for archive transfer

pub mod config;
pub mod course;
pub mod events;
pub mod migration;
pub mod observability;
pub mod orchestration;
pub mod scheduler;
pub mod storage;
