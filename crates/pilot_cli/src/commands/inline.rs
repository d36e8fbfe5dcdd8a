//! Inline command - S3 website declared in-process.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use pilot_iac::programs::{self, website};
use pilot_iac::{Lifecycle, LocalWorkspace, Mode};
use pilot_runner::StdoutSink;

use super::EngineArgs;

#[derive(Args)]
pub struct InlineArgs {
    /// `destroy` to tear the stack down, otherwise update it
    pub action: Option<String>,
}

pub async fn execute(args: InlineArgs, engine: &EngineArgs) -> Result<()> {
    let mode = Mode::from_args(args.action.as_deref());
    info!("Running inline website program ({:?})", mode);

    let stack = LocalWorkspace::create_or_select_stack(
        website::PROJECT_NAME,
        &engine.stack,
        website::declare,
        engine.workspace_options()?,
    )
    .await
    .context("failed to initialize inline stack")?;

    let lifecycle = engine.label_outputs(
        Lifecycle::new(mode)
            .plugin(programs::AWS_PLUGIN)
            .config("aws:region", &engine.region),
        &[("website_url", "Website URL")],
    );

    lifecycle
        .run(&stack, &StdoutSink, &mut std::io::stdout())
        .await
        .context("inline program failed")?;
    Ok(())
}
