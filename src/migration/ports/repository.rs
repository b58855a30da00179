//! Repository port for migration record persistence and reporting.

use crate::migration::domain::{MigrationFilter, MigrationId, MigrationRecord};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for migration repository operations.
pub type MigrationRepositoryResult<T> = Result<T, MigrationRepositoryError>;

/// Migration record persistence contract.
///
/// Records are never deleted through this port.
#[async_trait]
pub trait MigrationRepository: Send + Sync {
    /// Stores a new record.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationRepositoryError::DuplicateMigration`] when the
    /// identifier already exists.
    async fn store(&self, record: &MigrationRecord) -> MigrationRepositoryResult<()>;

    /// Persists changes to an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationRepositoryError::NotFound`] when the record does
    /// not exist.
    async fn update(&self, record: &MigrationRecord) -> MigrationRepositoryResult<()>;

    /// Finds a record by identifier.
    ///
    /// Returns `None` when the record does not exist.
    async fn find_by_id(&self, id: MigrationId) -> MigrationRepositoryResult<Option<MigrationRecord>>;

    /// Returns records matching the filter, newest first.
    async fn list(&self, filter: &MigrationFilter) -> MigrationRepositoryResult<Vec<MigrationRecord>>;

    /// Counts records matching the filter, ignoring pagination.
    async fn count(&self, filter: &MigrationFilter) -> MigrationRepositoryResult<u64>;
}

/// Errors returned by migration repository implementations.
#[derive(Debug, Clone, Error)]
pub enum MigrationRepositoryError {
    /// A record with the same identifier already exists.
    #[error("duplicate migration identifier: {0}")]
    DuplicateMigration(MigrationId),

    /// The record was not found.
    #[error("migration not found: {0}")]
    NotFound(MigrationId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl MigrationRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
