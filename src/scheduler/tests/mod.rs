//! Unit tests for the task queue.

use crate::course::domain::CourseId;
use crate::migration::domain::MigrationId;
use crate::scheduler::{
    adapters::InMemoryTaskQueue,
    domain::{CleanupPayload, PayloadError, QueuedTask, RestorePayload, TaskKind},
    ports::TaskQueue,
};
use chrono::{Duration, Utc};
use eyre::{ensure, eyre};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn queue() -> InMemoryTaskQueue {
    InMemoryTaskQueue::new()
}

#[rstest]
#[case(json!({}))]
#[case(json!(null))]
#[case(json!({"courseid": 4}))]
fn restore_payload_requires_record_id(#[case] data: serde_json::Value) {
    assert_eq!(
        RestorePayload::from_custom_data(&data),
        Err(PayloadError::Missing("migration_id"))
    );
}

#[rstest]
fn restore_payload_rejects_malformed_id() {
    let result = RestorePayload::from_custom_data(&json!({"migration_id": "not-a-uuid"}));
    assert!(matches!(result, Err(PayloadError::Malformed(_))));
}

#[rstest]
fn restore_payload_accepts_legacy_key() {
    let id = MigrationId::new();
    let decoded = RestorePayload::from_custom_data(&json!({"coursemigrationid": id}))
        .expect("legacy key should decode");
    assert_eq!(decoded.migration_id, id);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn claims_only_due_tasks_in_order(queue: InMemoryTaskQueue) -> eyre::Result<()> {
    let now = Utc::now();
    let later = QueuedTask::restore(
        RestorePayload {
            migration_id: MigrationId::new(),
        },
        now + Duration::minutes(5),
    )?;
    let first = QueuedTask::cleanup(
        CleanupPayload {
            course_id: CourseId::new(1)?,
        },
        now,
    )?;
    let second = QueuedTask::cleanup(
        CleanupPayload {
            course_id: CourseId::new(2)?,
        },
        now,
    )?;
    queue.enqueue(later.clone()).await?;
    queue.enqueue(first.clone()).await?;
    queue.enqueue(second.clone()).await?;

    ensure!(queue.claim_due(now).await? == Some(first), "first due task");
    ensure!(queue.claim_due(now).await? == Some(second), "second due task");
    ensure!(queue.claim_due(now).await?.is_none(), "later task not yet due");

    let claimed = queue
        .claim_due(now + Duration::minutes(5))
        .await?
        .ok_or_else(|| eyre!("delayed task should become due"))?;
    ensure!(claimed.kind() == TaskKind::Restore, "restore task expected");
    ensure!(queue.pending().await?.is_empty(), "queue drained");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn identical_work_is_queued_once(queue: InMemoryTaskQueue) -> eyre::Result<()> {
    let payload = CleanupPayload {
        course_id: CourseId::new(9)?,
    };
    let first = queue.enqueue(QueuedTask::cleanup(payload, Utc::now())?).await?;
    let second = queue.enqueue(QueuedTask::cleanup(payload, Utc::now())?).await?;

    ensure!(first == second, "duplicate should resolve to the pending task");
    ensure!(queue.pending().await?.len() == 1, "one pending task");
    Ok(())
}

#[rstest]
fn rescheduling_counts_applied_delays() -> eyre::Result<()> {
    let now = Utc::now();
    let task = QueuedTask::restore(
        RestorePayload {
            migration_id: MigrationId::new(),
        },
        now,
    )?;

    let delayed = task.rescheduled(now + Duration::seconds(60)).rescheduled(now);

    ensure!(delayed.reschedules() == 2, "two delays applied");
    ensure!(delayed.id() == task.id(), "identity preserved");
    Ok(())
}
