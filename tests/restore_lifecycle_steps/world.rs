//! Shared world state for restore lifecycle BDD scenarios.

use std::sync::Arc;

use coursemigration::config::MigrationConfig;
use coursemigration::course::{
    adapters::InMemoryCourseHost,
    domain::{Category, Course},
};
use coursemigration::events::adapters::InMemoryEventSink;
use coursemigration::migration::{
    adapters::memory::InMemoryMigrationRepository,
    domain::{MigrationId, MigrationRecord},
    ports::MigrationRepository,
};
use coursemigration::orchestration::{
    OrchestrationContext, RestoreOutcome, RestoreTaskError, RestoreTaskService,
};
use coursemigration::scheduler::adapters::InMemoryTaskQueue;
use coursemigration::storage::{adapters::InMemoryStorage, ports::StorageBackend};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestRestoreService =
    RestoreTaskService<InMemoryMigrationRepository, InMemoryCourseHost, DefaultClock>;

/// Scenario world for restore lifecycle behaviour tests.
pub struct RestoreWorld {
    pub repository: Arc<InMemoryMigrationRepository>,
    pub host: Arc<InMemoryCourseHost>,
    pub storage: Arc<InMemoryStorage>,
    pub queue: Arc<InMemoryTaskQueue>,
    pub events: Arc<InMemoryEventSink>,
    pub config: MigrationConfig,
    pub storage_enabled: bool,
    pub category: Option<Category>,
    pub course: Option<Course>,
    pub migration_id: Option<MigrationId>,
    pub last_result: Option<Result<RestoreOutcome, RestoreTaskError>>,
    pub retrying_states: u32,
}

impl RestoreWorld {
    /// Creates a world with empty collaborators and default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            repository: Arc::new(InMemoryMigrationRepository::new()),
            host: Arc::new(InMemoryCourseHost::new()),
            storage: Arc::new(InMemoryStorage::new()),
            queue: Arc::new(InMemoryTaskQueue::new()),
            events: Arc::new(InMemoryEventSink::new()),
            config: MigrationConfig::default(),
            storage_enabled: true,
            category: None,
            course: None,
            migration_id: None,
            last_result: None,
            retrying_states: 0,
        }
    }

    /// Builds a restore service over the current configuration.
    pub fn service(&self) -> TestRestoreService {
        let storage = self
            .storage_enabled
            .then(|| Arc::clone(&self.storage) as Arc<dyn StorageBackend>);
        let context = OrchestrationContext::new(
            self.queue.clone(),
            self.events.clone(),
            storage,
            Arc::new(self.config.clone()),
        );
        RestoreTaskService::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.host),
            context,
            Arc::new(DefaultClock),
        )
    }

    /// Returns the category created by the scenario.
    pub fn category(&self) -> Result<&Category, eyre::Report> {
        self.category
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing category in scenario world"))
    }

    /// Loads the migration the scenario is about.
    pub fn record(&self) -> Result<MigrationRecord, eyre::Report> {
        let id = self
            .migration_id
            .ok_or_else(|| eyre::eyre!("missing migration id in scenario world"))?;
        run_async(self.repository.find_by_id(id))?
            .ok_or_else(|| eyre::eyre!("migration {id} not found"))
    }

    /// Returns the failure of the last restore execution.
    pub fn failure(&self) -> Result<&RestoreTaskError, eyre::Report> {
        match &self.last_result {
            Some(Err(err)) => Ok(err),
            Some(Ok(outcome)) => Err(eyre::eyre!("restore unexpectedly succeeded: {outcome:?}")),
            None => Err(eyre::eyre!("the restore task has not run")),
        }
    }
}

impl Default for RestoreWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> RestoreWorld {
    RestoreWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
