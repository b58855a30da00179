//! Tests for the in-memory migration repository.

use crate::course::domain::CategoryId;
use crate::migration::{
    adapters::memory::InMemoryMigrationRepository,
    domain::{MigrationAction, MigrationFilter, MigrationRecord, MigrationStatus},
    ports::{MigrationRepository, MigrationRepositoryError},
};
use crate::storage::domain::ArchiveFilename;
use chrono::{Duration, TimeZone, Utc};
use eyre::ensure;
use mockable::{Clock, DefaultClock};
use rstest::{fixture, rstest};

struct FixedClock(chrono::DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> chrono::DateTime<chrono::Local> {
        self.0.with_timezone(&chrono::Local)
    }

    fn utc(&self) -> chrono::DateTime<Utc> {
        self.0
    }
}

fn record_at(day: u32, name: &str) -> MigrationRecord {
    let instant = Utc
        .with_ymd_and_hms(2026, 3, day, 12, 0, 0)
        .single()
        .expect("valid instant");
    MigrationRecord::new_restore(
        ArchiveFilename::new(name).expect("valid filename"),
        CategoryId::new(1).expect("valid category"),
        &FixedClock(instant),
    )
}

#[fixture]
fn repository() -> InMemoryMigrationRepository {
    InMemoryMigrationRepository::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn store_rejects_duplicates(repository: InMemoryMigrationRepository) -> eyre::Result<()> {
    let record = record_at(1, "a.mbz");
    repository.store(&record).await?;

    let result = repository.store(&record).await;

    ensure!(
        matches!(result, Err(MigrationRepositoryError::DuplicateMigration(id)) if id == record.id()),
        "unexpected result: {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_requires_existing_record(
    repository: InMemoryMigrationRepository,
) -> eyre::Result<()> {
    let mut record = record_at(1, "a.mbz");
    let missing = repository.update(&record).await;
    ensure!(
        matches!(missing, Err(MigrationRepositoryError::NotFound(_))),
        "update of unknown record should fail"
    );

    repository.store(&record).await?;
    record.begin_attempt(&DefaultClock)?;
    repository.update(&record).await?;

    let stored = repository.find_by_id(record.id()).await?;
    ensure!(stored == Some(record), "update should be visible");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_orders_newest_first_and_paginates(
    repository: InMemoryMigrationRepository,
) -> eyre::Result<()> {
    for (day, name) in [(1, "a.mbz"), (3, "c.mbz"), (2, "b.mbz")] {
        repository.store(&record_at(day, name)).await?;
    }

    let all = repository.list(&MigrationFilter::new()).await?;
    let names: Vec<_> = all
        .iter()
        .filter_map(|record| record.filename().map(|name| name.as_str().to_owned()))
        .collect();
    ensure!(names == ["c.mbz", "b.mbz", "a.mbz"], "unexpected order: {names:?}");

    let page = repository.list(&MigrationFilter::new().page(1, 1)).await?;
    ensure!(page.len() == 1, "page should hold one record");
    ensure!(
        page.first().and_then(MigrationRecord::filename).map(ArchiveFilename::as_str)
            == Some("b.mbz"),
        "second newest expected"
    );
    ensure!(
        repository.count(&MigrationFilter::new().page(1, 1)).await? == 3,
        "count ignores pagination"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_filters_by_status_action_and_window(
    repository: InMemoryMigrationRepository,
) -> eyre::Result<()> {
    let mut started = record_at(5, "started.mbz");
    started.begin_attempt(&DefaultClock)?;
    repository.store(&started).await?;
    repository.store(&record_at(6, "queued.mbz")).await?;
    let invalid = MigrationRecord::new_invalid(
        MigrationAction::Backup,
        None,
        None,
        "Row 2: missing category",
        &DefaultClock,
    );
    repository.store(&invalid).await?;

    let in_progress = MigrationFilter::new().with_status(MigrationStatus::InProgress);
    ensure!(repository.count(&in_progress).await? == 1, "one in progress");

    let backups = MigrationFilter::new().with_action(MigrationAction::Backup);
    let listed = repository.list(&backups).await?;
    ensure!(listed.len() == 1, "one backup record");

    let window_start = started.created_at();
    let window = MigrationFilter::new().created_between(
        Some(window_start),
        Some(window_start + Duration::days(1)),
    );
    let windowed = repository.list(&window).await?;
    ensure!(
        windowed.iter().map(MigrationRecord::id).collect::<Vec<_>>() == vec![started.id()],
        "window should select only the started record"
    );
    Ok(())
}
