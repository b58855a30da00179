//! When steps for restore lifecycle BDD scenarios.

use super::world::{RestoreWorld, run_async};
use coursemigration::migration::domain::{MigrationId, MigrationStatus};
use rstest_bdd_macros::when;
use serde_json::json;

#[when("the restore task runs for the migration")]
fn restore_runs(world: &mut RestoreWorld) -> Result<(), eyre::Report> {
    let id = world
        .migration_id
        .ok_or_else(|| eyre::eyre!("missing migration id in scenario world"))?;
    world.last_result = Some(run_async(
        world.service().execute(&json!({ "migration_id": id })),
    ));
    Ok(())
}

#[when("the restore task runs without data")]
fn restore_runs_without_data(world: &mut RestoreWorld) {
    world.last_result = Some(run_async(world.service().execute(&json!({}))));
}

#[when("the restore task runs for an unknown migration")]
fn restore_runs_for_unknown(world: &mut RestoreWorld) {
    let data = json!({ "migrationRecordId": MigrationId::new() });
    world.last_result = Some(run_async(world.service().execute(&data)));
}

#[when("the restore task runs until it stops retrying")]
fn restore_runs_until_settled(world: &mut RestoreWorld) -> Result<(), eyre::Report> {
    let id = world
        .migration_id
        .ok_or_else(|| eyre::eyre!("missing migration id in scenario world"))?;
    let service = world.service();
    let data = json!({ "migration_id": id });
    let budget = world.config.max_restore_retries.saturating_add(2);

    for _ in 0..budget {
        let result = run_async(service.execute(&data));
        let retry = result.as_ref().err().is_some_and(|err| err.retry.should_retry);
        if world.record()?.status() == MigrationStatus::Retrying {
            world.retrying_states += 1;
        }
        world.last_result = Some(result);
        if !retry {
            return Ok(());
        }
    }
    Err(eyre::eyre!("restore kept retrying past {budget} executions"))
}
