//! In-memory adapters for migration records.

mod repository;

pub use repository::InMemoryMigrationRepository;
