//! Given steps for restore lifecycle BDD scenarios.

use super::world::{RestoreWorld, run_async};
use coursemigration::course::ports::CourseBackup;
use coursemigration::migration::{domain::MigrationRecord, ports::MigrationRepository};
use coursemigration::storage::{domain::ArchiveFilename, ports::StorageBackend};
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest_bdd_macros::given;

#[given(r#"a source course "{name}" in category "{category}""#)]
fn source_course(
    world: &mut RestoreWorld,
    name: String,
    category: String,
) -> Result<(), eyre::Report> {
    let category = world.host.add_category(category).wrap_err("create category")?;
    let course = world
        .host
        .add_course(name, "trc", category.id)
        .wrap_err("create course")?;
    world.category = Some(category);
    world.course = Some(course);
    Ok(())
}

#[given("the course has been backed up to storage")]
fn course_backed_up(world: &mut RestoreWorld) -> Result<(), eyre::Report> {
    let course = world
        .course
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing course in scenario world"))?;
    let archive = run_async(world.host.backup(course.id)).wrap_err("back up course")?;
    run_async(world.storage.push(archive.filename(), archive.artifact()))
        .wrap_err("push archive")?;
    run_async(world.host.discard(&archive)).wrap_err("discard local archive")?;
    store_restore(world, archive.filename().clone())
}

#[given(r#"a migration for archive "{filename}" that was never pushed"#)]
fn migration_for_missing_archive(
    world: &mut RestoreWorld,
    filename: String,
) -> Result<(), eyre::Report> {
    let filename = ArchiveFilename::new(filename).wrap_err("archive filename")?;
    store_restore(world, filename)
}

#[given("restore retries are limited to {retries:u32}")]
fn retries_limited(world: &mut RestoreWorld, retries: u32) {
    world.config.max_restore_retries = retries;
}

#[given("no storage backend is configured")]
fn no_storage(world: &mut RestoreWorld) {
    world.storage_enabled = false;
}

#[given(r#"restore plans fail with "{detail}""#)]
fn plans_fail(world: &mut RestoreWorld, detail: String) -> Result<(), eyre::Report> {
    world
        .host
        .fail_plans_with(Some(detail))
        .wrap_err("inject plan failure")
}

fn store_restore(world: &mut RestoreWorld, filename: ArchiveFilename) -> Result<(), eyre::Report> {
    let category = world.category()?.id;
    let record = MigrationRecord::new_restore(filename, category, &DefaultClock);
    run_async(world.repository.store(&record)).wrap_err("store migration")?;
    world.migration_id = Some(record.id());
    Ok(())
}
