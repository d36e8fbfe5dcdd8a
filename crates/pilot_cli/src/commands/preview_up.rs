//! Preview-up command - preview into a saved plan, then apply exactly that plan.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use pilot_iac::lifecycle::write_summary;
use pilot_iac::programs::{self, pet};
use pilot_iac::{LocalWorkspace, PreviewOptions, UpOptions};
use pilot_runner::StdoutSink;

use super::{absolute, EngineArgs};

#[derive(Args)]
pub struct PreviewUpArgs {
    /// `preview`, `up` or `destroy`
    pub action: Option<String>,

    /// Plan file written by `preview` and applied by `up`
    /// [default: <stack>.<project>.json]
    pub plan: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Preview,
    Up,
    Destroy,
}

impl Action {
    fn parse(action: Option<&str>) -> Option<Self> {
        match action? {
            "preview" => Some(Action::Preview),
            "up" => Some(Action::Up),
            "destroy" => Some(Action::Destroy),
            _ => None,
        }
    }
}

pub async fn execute(args: PreviewUpArgs, engine: &EngineArgs) -> Result<()> {
    let mut stdout = std::io::stdout();
    let Some(action) = Action::parse(args.action.as_deref()) else {
        writeln!(
            stdout,
            "no supported stack operations please provide preview, up or destroy as an argument"
        )?;
        return Ok(());
    };

    // The program runs in a scratch directory, so relative plans must be
    // anchored to where pilot was started.
    let plan = absolute(
        &args
            .plan
            .unwrap_or_else(|| PathBuf::from(format!("{}.{}.json", engine.stack, pet::PROJECT_NAME))),
    )?;
    info!("Running preview/up program ({:?}, plan {})", action, plan.display());

    let stack = LocalWorkspace::create_or_select_stack(
        pet::PROJECT_NAME,
        &engine.stack,
        pet::declare,
        engine.workspace_options()?,
    )
    .await
    .context("failed to initialize preview stack")?;
    writeln!(stdout, "successfully initialized stack")?;

    writeln!(stdout, "installing plugins...")?;
    stack
        .workspace()
        .install_plugin(programs::RANDOM_PLUGIN.name, programs::RANDOM_PLUGIN.version)
        .await?;
    writeln!(stdout, "plugins installed")?;

    writeln!(stdout, "refreshing stack...")?;
    stack.refresh(&StdoutSink).await?;
    writeln!(stdout, "refresh complete")?;

    match action {
        Action::Destroy => {
            writeln!(stdout, "destroying stack...")?;
            stack.destroy(&StdoutSink).await?;
            writeln!(stdout, "stack destroy complete")?;
        }
        Action::Preview => {
            writeln!(stdout, "previewing changes to stack...")?;
            let preview = stack
                .preview(&PreviewOptions::default().plan(&plan), &StdoutSink)
                .await
                .context("preview failed")?;

            writeln!(stdout, "preview summary:")?;
            for (op, count) in &preview.change_summary {
                writeln!(stdout, "    {}: {}", op, count)?;
            }
            writeln!(stdout, "stack preview saved to {}", plan.display())?;
        }
        Action::Up => {
            writeln!(stdout, "updating stack from preview {}...", plan.display())?;
            let result = stack
                .up(&UpOptions::default().plan(&plan), &StdoutSink)
                .await
                .context("update from plan failed")?;

            write_summary(&result.summary, &mut stdout)?;
            if let Some(name) = result.outputs.get("name") {
                writeln!(stdout, "name: {}", name)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse() {
        assert_eq!(Action::parse(Some("preview")), Some(Action::Preview));
        assert_eq!(Action::parse(Some("up")), Some(Action::Up));
        assert_eq!(Action::parse(Some("destroy")), Some(Action::Destroy));
        assert_eq!(Action::parse(Some("apply")), None);
        assert_eq!(Action::parse(None), None);
    }
}
