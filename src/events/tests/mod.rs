//! Unit tests for lifecycle events.

use crate::course::domain::{CategoryId, CourseId};
use crate::events::{
    adapters::{InMemoryEventSink, TracingEventSink},
    domain::MigrationEvent,
    ports::EventSink,
};
use crate::migration::domain::MigrationId;
use crate::storage::domain::ArchiveFilename;
use rstest::{fixture, rstest};

#[fixture]
fn completed() -> MigrationEvent {
    MigrationEvent::RestoreCompleted {
        migration_id: MigrationId::new(),
        course_id: CourseId::new(12).expect("valid course"),
        course_name: "Test restore course".to_owned(),
        destination_category_id: CategoryId::new(3).expect("valid category"),
        destination_category_name: "Archive".to_owned(),
        filename: ArchiveFilename::new("c.mbz").expect("valid filename"),
    }
}

#[rstest]
fn completed_event_describes_course_and_category(completed: MigrationEvent) {
    assert_eq!(completed.name(), "restore_completed");
    assert_eq!(
        completed.description(),
        "Restoring course 'Test restore course' (id: 12) is successfully completed into \
         category 'Archive' (id: 3)."
    );
    assert_eq!(completed.filename(), "c.mbz");
}

#[rstest]
fn failed_event_without_record_has_empty_filename() {
    let event = MigrationEvent::RestoreFailed {
        migration_id: None,
        error: "Invalid data. Error: missing one of the required parameters.".to_owned(),
        filename: None,
    };

    assert_eq!(event.name(), "restore_failed");
    assert_eq!(event.filename(), "");
    assert_eq!(
        event.description(),
        "Restoring course is failed. Error: Invalid data. Error: missing one of the required \
         parameters."
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sinks_accept_events(completed: MigrationEvent) {
    let sink = InMemoryEventSink::new();
    sink.publish(completed.clone()).await.expect("publish");
    TracingEventSink
        .publish(completed.clone())
        .await
        .expect("tracing sink publish");

    assert_eq!(sink.events().expect("events"), vec![completed]);
    assert!(sink.named("restore_failed").expect("events").is_empty());
}
