//! Then steps for restore lifecycle BDD scenarios.

use super::world::{RestoreWorld, run_async};
use coursemigration::events::domain::MigrationEvent;
use coursemigration::migration::{
    domain::{MigrationFilter, MigrationStatus},
    ports::MigrationRepository,
};
use rstest_bdd_macros::then;

#[then(r#"the migration status is "{status}""#)]
fn migration_status_is(world: &RestoreWorld, status: String) -> Result<(), eyre::Report> {
    let expected = MigrationStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let record = world.record()?;
    if record.status() != expected {
        return Err(eyre::eyre!(
            "expected status {expected}, found {} (error: {:?})",
            record.status(),
            record.error()
        ));
    }
    Ok(())
}

#[then("the migration references a new course")]
fn migration_references_new_course(world: &RestoreWorld) -> Result<(), eyre::Report> {
    let source = world
        .course
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing course in scenario world"))?;
    let restored = world
        .record()?
        .course_id()
        .ok_or_else(|| eyre::eyre!("completed migration has no course"))?;
    if restored == source.id {
        return Err(eyre::eyre!("restore reused the source course {restored}"));
    }
    Ok(())
}

#[then(r#"a restore_completed event names "{course}" in "{category}""#)]
fn completed_event_names(
    world: &RestoreWorld,
    course: String,
    category: String,
) -> Result<(), eyre::Report> {
    let events = world.events.named("restore_completed")?;
    let [MigrationEvent::RestoreCompleted {
        course_name,
        destination_category_name,
        ..
    }] = events.as_slice()
    else {
        return Err(eyre::eyre!("expected one restore_completed event, got {events:?}"));
    };
    if *course_name != course || *destination_category_name != category {
        return Err(eyre::eyre!(
            "event names '{course_name}' in '{destination_category_name}'"
        ));
    }
    Ok(())
}

#[then(r#"the restore fails with a "{kind}" failure"#)]
fn restore_fails_with(world: &RestoreWorld, kind: String) -> Result<(), eyre::Report> {
    let failure = world.failure()?;
    if failure.kind().as_str() != kind {
        return Err(eyre::eyre!("expected a {kind} failure, got {}", failure.kind()));
    }
    Ok(())
}

#[then("the restore_failed event has an empty filename")]
fn failed_event_without_filename(world: &RestoreWorld) -> Result<(), eyre::Report> {
    let events = world.events.named("restore_failed")?;
    let [event] = events.as_slice() else {
        return Err(eyre::eyre!("expected one restore_failed event, got {events:?}"));
    };
    if !event.filename().is_empty() {
        return Err(eyre::eyre!("unexpected filename '{}'", event.filename()));
    }
    Ok(())
}

#[then("no migration records exist")]
fn no_records(world: &RestoreWorld) -> Result<(), eyre::Report> {
    let count = run_async(world.repository.count(&MigrationFilter::default()))?;
    if count != 0 {
        return Err(eyre::eyre!("expected no records, found {count}"));
    }
    Ok(())
}

#[then("no retry is scheduled")]
fn no_retry(world: &RestoreWorld) -> Result<(), eyre::Report> {
    let failure = world.failure()?;
    if failure.retry.should_retry {
        return Err(eyre::eyre!("unexpected retry: {:?}", failure.retry));
    }
    Ok(())
}

#[then(r#"the migration error mentions "{text}""#)]
fn error_mentions(world: &RestoreWorld, text: String) -> Result<(), eyre::Report> {
    let record = world.record()?;
    let error = record.error().unwrap_or_default();
    if !error.contains(&text) {
        return Err(eyre::eyre!("error '{error}' does not mention '{text}'"));
    }
    Ok(())
}

#[then(r#"the migration error is "{text}""#)]
fn error_is(world: &RestoreWorld, text: String) -> Result<(), eyre::Report> {
    let record = world.record()?;
    if record.error() != Some(text.as_str()) {
        return Err(eyre::eyre!("unexpected error {:?}", record.error()));
    }
    Ok(())
}

#[then("the migration passed through {count:u32} retrying states")]
fn retrying_states(world: &RestoreWorld, count: u32) -> Result<(), eyre::Report> {
    if world.retrying_states != count {
        return Err(eyre::eyre!(
            "expected {count} retrying states, saw {}",
            world.retrying_states
        ));
    }
    Ok(())
}
