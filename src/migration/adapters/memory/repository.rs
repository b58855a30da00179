//! In-memory repository for migration record tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::migration::{
    domain::{MigrationFilter, MigrationId, MigrationRecord},
    ports::{MigrationRepository, MigrationRepositoryError, MigrationRepositoryResult},
};

/// Thread-safe in-memory migration repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMigrationRepository {
    state: Arc<RwLock<HashMap<MigrationId, MigrationRecord>>>,
}

impl InMemoryMigrationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn matching(
        &self,
        filter: &MigrationFilter,
    ) -> MigrationRepositoryResult<Vec<MigrationRecord>> {
        let state = self.state.read().map_err(|err| {
            MigrationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut records: Vec<MigrationRecord> = state
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        records.sort_by(|left, right| {
            right
                .created_at()
                .cmp(&left.created_at())
                .then_with(|| right.id().cmp(&left.id()))
        });
        Ok(records)
    }
}

#[async_trait]
impl MigrationRepository for InMemoryMigrationRepository {
    async fn store(&self, record: &MigrationRecord) -> MigrationRepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            MigrationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        if state.contains_key(&record.id()) {
            return Err(MigrationRepositoryError::DuplicateMigration(record.id()));
        }
        state.insert(record.id(), record.clone());
        Ok(())
    }

    async fn update(&self, record: &MigrationRecord) -> MigrationRepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            MigrationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let slot = state
            .get_mut(&record.id())
            .ok_or(MigrationRepositoryError::NotFound(record.id()))?;
        *slot = record.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: MigrationId) -> MigrationRepositoryResult<Option<MigrationRecord>> {
        let state = self.state.read().map_err(|err| {
            MigrationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.get(&id).cloned())
    }

    async fn list(&self, filter: &MigrationFilter) -> MigrationRepositoryResult<Vec<MigrationRecord>> {
        let records = self.matching(filter)?;
        let page = records.into_iter().skip(filter.offset);
        Ok(match filter.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        })
    }

    async fn count(&self, filter: &MigrationFilter) -> MigrationRepositoryResult<u64> {
        let total = self.matching(filter)?.len();
        u64::try_from(total).map_err(MigrationRepositoryError::persistence)
    }
}
