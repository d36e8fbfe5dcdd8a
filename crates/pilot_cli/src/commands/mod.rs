//! CLI command definitions.
//!
//! Each subcommand drives one program through the engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pilot_iac::programs::DEFAULT_REGION;
use pilot_iac::{Lifecycle, WorkspaceOptions};
use pilot_runner::{CliRunner, CliRunnerOptions, EngineRunner};

pub mod db_migrate;
pub mod inline;
pub mod local;
pub mod preview_up;

/// stackpilot - drive infrastructure stacks through the engine's automation mode
#[derive(Parser)]
#[command(name = "pilot")]
#[command(version, about = "stackpilot - drive infrastructure stacks from Rust")]
#[command(long_about = r#"
stackpilot declares cloud infrastructure and drives the pulumi engine to
refresh, preview, update or destroy it.

PROGRAMS:
  inline       → S3 static website declared inline
  local        → S3 static website from a project directory
  db-migrate   → Aurora MySQL cluster, then seed a table
  preview-up   → Random pet name, previewed to a plan and applied from it

Pass `destroy` as the action to tear a stack down. Any other action updates it.

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  5 - Engine error
  6 - Database error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Update or destroy the inline S3 website
    Inline(inline::InlineArgs),

    /// Update or destroy the S3 website project on disk
    Local(local::LocalArgs),

    /// Provision the Aurora cluster and seed it
    #[command(name = "db-migrate")]
    DbMigrate(db_migrate::DbMigrateArgs),

    /// Preview to a saved plan, apply it, or destroy
    #[command(name = "preview-up")]
    PreviewUp(preview_up::PreviewUpArgs),
}

/// Engine and stack settings shared by every command.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Engine binary
    #[arg(long, env = "PILOT_ENGINE_BIN", default_value = "pulumi", global = true)]
    pub engine_bin: PathBuf,

    /// Stack to create or select
    #[arg(long, env = "PILOT_STACK", default_value = "dev", global = true)]
    pub stack: String,

    /// AWS region
    #[arg(long, env = "PILOT_REGION", default_value = DEFAULT_REGION, global = true)]
    pub region: String,

    /// Timeout per engine command in seconds (0 = none)
    #[arg(long, env = "PILOT_TIMEOUT", default_value_t = 0, global = true)]
    pub timeout: u64,

    /// Log engine commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,
}

impl EngineArgs {
    /// Exit codes are checked by the workspace, which reports the failed
    /// operation by name.
    pub fn runner_options(&self) -> CliRunnerOptions {
        let options = CliRunnerOptions::new()
            .binary(&self.engine_bin)
            .fail_fast(false);
        if self.dry_run {
            options.dry_run()
        } else {
            options
        }
    }

    pub fn runner(&self) -> Result<Arc<dyn EngineRunner>> {
        let runner = CliRunner::new(self.runner_options()).with_context(|| {
            format!("engine binary {} is not usable", self.engine_bin.display())
        })?;
        Ok(Arc::new(runner))
    }

    pub fn workspace_options(&self) -> Result<WorkspaceOptions> {
        Ok(WorkspaceOptions::new(self.runner()?).timeout(self.timeout))
    }

    /// Dry runs produce no outputs, so labeled outputs are only requested
    /// from a real engine.
    pub fn label_outputs(&self, mut lifecycle: Lifecycle, labels: &[(&str, &str)]) -> Lifecycle {
        if self.dry_run {
            return lifecycle;
        }
        for (key, label) in labels {
            lifecycle = lifecycle.output_label(*key, *label);
        }
        lifecycle
    }
}

/// Resolve `path` against the current directory.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}
