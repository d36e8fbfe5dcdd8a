//! # pilot_iac
//!
//! Stack orchestration client for stackpilot.
//!
//! Resource declarations are collected into a [`ProgramContext`], validated,
//! and rendered as an engine project using the YAML runtime. A
//! [`LocalWorkspace`] points the engine at that project (or at an existing
//! project directory) and hands out a [`Stack`] handle on which every
//! lifecycle operation runs.
//!
//! ## Features
//!
//! - Inline programs declared from Rust closures
//! - Local programs loaded from a project directory
//! - Refresh, preview (with saved plans), update and destroy
//! - Update summaries and stack outputs parsed from engine JSON
//! - The refresh-then-branch lifecycle shared by every driver
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pilot_iac::{programs, Lifecycle, LocalWorkspace, Mode, WorkspaceOptions};
//! use pilot_runner::{CliRunner, CliRunnerOptions, StdoutSink};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = Arc::new(CliRunner::new(CliRunnerOptions::default())?);
//! let stack = LocalWorkspace::create_or_select_stack(
//!     programs::website::PROJECT_NAME,
//!     "dev",
//!     programs::website::declare,
//!     WorkspaceOptions::new(runner),
//! )
//! .await?;
//!
//! Lifecycle::new(Mode::Up)
//!     .plugin(programs::AWS_PLUGIN)
//!     .config("aws:region", "us-west-2")
//!     .run(&stack, &StdoutSink, &mut std::io::stdout())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod lifecycle;
pub mod program;
pub mod programs;
pub mod project;
pub mod stack;
pub mod summary;
pub mod validator;
pub mod workspace;

pub use error::{AutomationError, AutomationResult};
pub use lifecycle::{Lifecycle, LifecycleOutcome, Mode};
pub use program::{Invoke, ProgramContext, Reference, Resource};
pub use programs::PluginRef;
pub use project::{ProjectSettings, PROJECT_FILE};
pub use stack::{ConfigValue, PreviewOptions, Stack, UpOptions};
pub use summary::{OutputMap, OutputValue, PreviewResult, PreviewStep, UpResult, UpdateSummary};
pub use validator::{ProgramValidator, ValidationCheck, ValidationReport};
pub use workspace::{LocalWorkspace, WorkspaceOptions};
