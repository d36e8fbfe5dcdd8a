//! Local command - S3 website project on disk.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use pilot_iac::{Lifecycle, LocalWorkspace, Mode};
use pilot_runner::StdoutSink;

use super::EngineArgs;

#[derive(Args)]
pub struct LocalArgs {
    /// `destroy` to tear the stack down, otherwise update it
    pub action: Option<String>,

    /// Project directory containing Pulumi.yaml
    #[arg(long, default_value = "projects/website")]
    pub work_dir: PathBuf,
}

pub async fn execute(args: LocalArgs, engine: &EngineArgs) -> Result<()> {
    let mode = Mode::from_args(args.action.as_deref());
    info!("Running local program in {} ({:?})", args.work_dir.display(), mode);

    let stack = LocalWorkspace::create_or_select_stack_local(
        &engine.stack,
        &args.work_dir,
        engine.workspace_options()?,
    )
    .await
    .with_context(|| format!("failed to open project in {}", args.work_dir.display()))?;

    // The project's own runtime installs its plugins
    let lifecycle = engine.label_outputs(
        Lifecycle::new(mode).config("aws:region", &engine.region),
        &[("website_url", "Website URL")],
    );

    lifecycle
        .run(&stack, &StdoutSink, &mut std::io::stdout())
        .await
        .context("local program failed")?;
    Ok(())
}
