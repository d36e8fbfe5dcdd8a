//! Db-migrate command - provision the Aurora cluster, then seed it.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use pilot_db::{configure_database, DatabaseTarget};
use pilot_iac::programs::{self, database};
use pilot_iac::{Lifecycle, LifecycleOutcome, LocalWorkspace, Mode};
use pilot_runner::StdoutSink;

use super::EngineArgs;

#[derive(Args)]
pub struct DbMigrateArgs {
    /// `destroy` to tear the stack down, otherwise update it and seed the database
    pub action: Option<String>,
}

pub async fn execute(args: DbMigrateArgs, engine: &EngineArgs) -> Result<()> {
    let mode = Mode::from_args(args.action.as_deref());
    info!("Running database program ({:?})", mode);

    let stack = LocalWorkspace::create_or_select_stack(
        database::PROJECT_NAME,
        &engine.stack,
        database::declare,
        engine.workspace_options()?,
    )
    .await
    .context("failed to initialize database stack")?;

    let mut stdout = std::io::stdout();
    let outcome = lifecycle(mode, engine)
        .run(&stack, &StdoutSink, &mut stdout)
        .await
        .context("database program failed")?;

    let Some(target) = seed_target(&outcome, engine.dry_run)? else {
        return Ok(());
    };
    let rows = configure_database(&target, &mut stdout)
        .await
        .context("database seeding failed")?;
    info!("hello_pulumi holds {} rows", rows);
    Ok(())
}

fn lifecycle(mode: Mode, engine: &EngineArgs) -> Lifecycle {
    engine.label_outputs(
        Lifecycle::new(mode)
            .plugin(programs::AWS_PLUGIN)
            .config("aws:region", &engine.region),
        &[("host", "db host url")],
    )
}

/// The database to seed after `outcome`. Only a real update is seeded.
fn seed_target(outcome: &LifecycleOutcome, dry_run: bool) -> Result<Option<DatabaseTarget>> {
    let Some(result) = outcome.up_result() else {
        return Ok(None);
    };
    if dry_run {
        info!("Dry run, skipping database seeding");
        return Ok(None);
    }
    let target = DatabaseTarget::from_outputs(&result.outputs)
        .context("stack outputs do not describe a database")?;
    Ok(Some(target))
}
