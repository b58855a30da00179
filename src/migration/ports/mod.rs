//! Port contracts for migration record persistence.

pub mod repository;

pub use repository::{MigrationRepository, MigrationRepositoryError, MigrationRepositoryResult};
