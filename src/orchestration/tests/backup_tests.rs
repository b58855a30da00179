//! Backup task execution tests.

use super::support::Harness;
use crate::course::domain::CourseId;
use crate::migration::{
    domain::{MigrationAction, MigrationFilter, MigrationStatus},
    ports::MigrationRepository,
};
use crate::orchestration::{BackupRequest, BackupTaskError};
use crate::scheduler::{domain::TaskKind, ports::TaskQueue};
use crate::storage::{adapters::InMemoryStorage, domain::StorageCapabilities, ports::StorageBackend};
use eyre::{bail, ensure};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

fn request(harness: &Harness) -> BackupRequest {
    BackupRequest::new(harness.course.id, harness.category.id)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn backup_pushes_archive_and_queues_restore(harness: Harness) -> eyre::Result<()> {
    let outcome = harness.backups().execute(request(&harness)).await?;

    let record = harness.record(outcome.migration_id).await;
    ensure!(record.action() == MigrationAction::Restore);
    ensure!(record.status() == MigrationStatus::NotStarted);
    ensure!(record.filename() == Some(&outcome.filename));
    ensure!(record.destination_category_id() == Some(harness.category.id));
    ensure!(harness.storage.exists(&outcome.filename).await?);
    ensure!(
        harness.host.discarded_archives()? == vec![outcome.filename.clone()],
        "local archive is discarded after the push"
    );

    let pending = harness.queue.pending().await?;
    let [task] = pending.as_slice() else {
        bail!("expected one queued task, got {pending:?}");
    };
    ensure!(task.id() == outcome.restore_task);
    ensure!(task.kind() == TaskKind::Restore);
    ensure!(task.payload() == &json!({ "migration_id": outcome.migration_id }));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn backup_payload_is_decoded(harness: Harness) -> eyre::Result<()> {
    let data = json!({
        "course_id": harness.course.id,
        "destination_category_id": harness.category.id,
    });

    let outcome = harness.backups().execute_payload(&data).await?;

    ensure!(harness.record(outcome.migration_id).await.status() == MigrationStatus::NotStarted);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_backup_payload_is_rejected(harness: Harness) -> eyre::Result<()> {
    let result = harness
        .backups()
        .execute_payload(&json!({ "course_id": 0 }))
        .await;

    ensure!(matches!(result, Err(BackupTaskError::Payload(_))), "unexpected: {result:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_backup_creates_no_record(harness: Harness) -> eyre::Result<()> {
    harness.host.fail_backups_with("disk full")?;

    let result = harness.backups().execute(request(&harness)).await;

    ensure!(matches!(result, Err(BackupTaskError::Backup(_))), "unexpected: {result:?}");
    ensure!(harness.repository.count(&MigrationFilter::default()).await? == 0);
    ensure!(harness.queue.pending().await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_push_reports_backend_detail(harness: Harness) -> eyre::Result<()> {
    harness.storage.fail_pushes_with("share is read-only")?;

    let result = harness.backups().execute(request(&harness)).await;

    let Err(BackupTaskError::Push { filename, detail }) = result else {
        bail!("expected a push failure, got {result:?}");
    };
    ensure!(detail.contains("share is read-only"), "detail: {detail}");
    ensure!(harness.storage.last_error().is_none(), "backend error is cleared");
    ensure!(harness.host.discarded_archives()? == vec![filename]);
    ensure!(harness.repository.count(&MigrationFilter::default()).await? == 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_push_keeps_local_archive_when_configured(
    #[from(harness)] base: Harness,
) -> eyre::Result<()> {
    let harness = base.configure(|config| config.delete_local_archive_after_failed_push = false);
    harness.storage.fail_pushes_with("offline")?;

    let result = harness.backups().execute(request(&harness)).await;

    ensure!(matches!(result, Err(BackupTaskError::Push { .. })));
    ensure!(harness.host.discarded_archives()?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn backup_requires_configured_storage(
    #[from(harness)] base: Harness,
) -> eyre::Result<()> {
    let harness = base.without_storage();

    let result = harness.backups().execute(request(&harness)).await;

    ensure!(matches!(result, Err(BackupTaskError::StorageNotConfigured)));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn backup_requires_push_capability() -> eyre::Result<()> {
    let harness = Harness::with_storage(InMemoryStorage::with_capabilities(
        StorageCapabilities::none(),
    ));

    let result = harness.backups().execute(request(&harness)).await;

    ensure!(matches!(result, Err(BackupTaskError::StorageNotReadyForPush)));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn backup_of_unknown_course_fails(harness: Harness) -> eyre::Result<()> {
    let request = BackupRequest::new(CourseId::new(999)?, harness.category.id);

    let result = harness.backups().execute(request).await;

    ensure!(matches!(result, Err(BackupTaskError::Backup(_))), "unexpected: {result:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_backups_of_one_course_are_refused(harness: Harness) -> eyre::Result<()> {
    let backups = harness.backups();

    let (first, second) = tokio::join!(
        backups.execute(request(&harness)),
        backups.execute(request(&harness)),
    );

    let refused = [&first, &second]
        .iter()
        .filter(|result| matches!(result, Err(BackupTaskError::AlreadyRunning(_))))
        .count();
    ensure!(refused <= 1, "at most one execution is refused");
    ensure!(first.is_ok() || second.is_ok(), "one execution succeeds");

    let sequential = backups.execute(request(&harness)).await;
    ensure!(sequential.is_ok(), "marker is released after completion");
    Ok(())
}
