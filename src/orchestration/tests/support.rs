//! Shared wiring for orchestration tests.

use crate::config::MigrationConfig;
use crate::course::{
    adapters::InMemoryCourseHost,
    domain::{Category, Course},
    ports::CourseBackup,
};
use crate::events::adapters::InMemoryEventSink;
use crate::migration::{
    adapters::memory::InMemoryMigrationRepository,
    domain::{MigrationId, MigrationRecord},
    ports::MigrationRepository,
};
use crate::orchestration::{
    BackupTaskService, OrchestrationContext, RestoreTaskService, TaskDispatcher,
};
use crate::scheduler::adapters::InMemoryTaskQueue;
use crate::storage::{
    adapters::InMemoryStorage,
    domain::ArchiveFilename,
    ports::StorageBackend,
};
use mockable::DefaultClock;
use serde_json::{Value, json};
use std::sync::Arc;

pub(super) type Restores =
    RestoreTaskService<InMemoryMigrationRepository, InMemoryCourseHost, DefaultClock>;
pub(super) type Backups =
    BackupTaskService<InMemoryMigrationRepository, InMemoryCourseHost, DefaultClock>;
pub(super) type Dispatcher =
    TaskDispatcher<InMemoryMigrationRepository, InMemoryCourseHost, DefaultClock>;

/// In-memory collaborators with one category and one source course.
pub(super) struct Harness {
    pub repository: Arc<InMemoryMigrationRepository>,
    pub host: Arc<InMemoryCourseHost>,
    pub storage: Arc<InMemoryStorage>,
    pub queue: Arc<InMemoryTaskQueue>,
    pub events: Arc<InMemoryEventSink>,
    pub category: Category,
    pub course: Course,
    pub config: MigrationConfig,
    pub storage_enabled: bool,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_storage(InMemoryStorage::new())
    }

    pub fn with_storage(storage: InMemoryStorage) -> Self {
        let host = InMemoryCourseHost::new();
        let category = host.add_category("Miscellaneous").expect("category");
        let course = host
            .add_course("Test restore course", "trc", category.id)
            .expect("course");
        Self {
            repository: Arc::new(InMemoryMigrationRepository::new()),
            host: Arc::new(host),
            storage: Arc::new(storage),
            queue: Arc::new(InMemoryTaskQueue::new()),
            events: Arc::new(InMemoryEventSink::new()),
            category,
            course,
            config: MigrationConfig::default(),
            storage_enabled: true,
        }
    }

    pub fn configure(mut self, update: impl FnOnce(&mut MigrationConfig)) -> Self {
        update(&mut self.config);
        self
    }

    pub fn without_storage(mut self) -> Self {
        self.storage_enabled = false;
        self
    }

    pub fn context(&self) -> OrchestrationContext {
        let storage = self
            .storage_enabled
            .then(|| Arc::clone(&self.storage) as Arc<dyn StorageBackend>);
        OrchestrationContext::new(
            self.queue.clone(),
            self.events.clone(),
            storage,
            Arc::new(self.config.clone()),
        )
    }

    pub fn restores(&self) -> Restores {
        RestoreTaskService::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.host),
            self.context(),
            Arc::new(DefaultClock),
        )
    }

    pub fn backups(&self) -> Backups {
        BackupTaskService::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.host),
            self.context(),
            Arc::new(DefaultClock),
        )
    }

    pub fn dispatcher(&self) -> Dispatcher {
        TaskDispatcher::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.host),
            self.context(),
            Arc::new(DefaultClock),
        )
    }

    /// Archives the source course straight into storage and stores a
    /// restore record for it.
    pub async fn seed_restore(&self) -> MigrationRecord {
        let archive = self.host.backup(self.course.id).await.expect("backup");
        self.storage
            .push(archive.filename(), archive.artifact())
            .await
            .expect("push");
        self.host.discard(&archive).await.expect("discard");
        self.store(archive.filename().clone()).await
    }

    /// Stores a restore record for an archive that was never pushed.
    pub async fn seed_missing_archive(&self) -> MigrationRecord {
        self.store(ArchiveFilename::new("missing.mbz").expect("filename"))
            .await
    }

    async fn store(&self, filename: ArchiveFilename) -> MigrationRecord {
        let record = MigrationRecord::new_restore(filename, self.category.id, &DefaultClock);
        self.repository.store(&record).await.expect("store");
        record
    }

    pub async fn record(&self, id: MigrationId) -> MigrationRecord {
        self.repository
            .find_by_id(id)
            .await
            .expect("lookup")
            .expect("record exists")
    }
}

pub(super) fn restore_data(id: MigrationId) -> Value {
    json!({ "migration_id": id })
}
