//! # pilot_runner
//!
//! Engine CLI execution wrapper for stackpilot.
//!
//! Every stack operation ends up as an invocation of the `pulumi` CLI. This
//! crate owns that boundary: spawning the process, streaming its output line
//! by line to an [`OutputSink`], and collecting the result.
//!
//! # Features
//!
//! - **CLI Runner**: spawns the engine binary with streaming stdout
//! - **Dry-Run Mode**: log commands without executing them
//! - **Output Sinks**: stdout, capture, null, or any `Fn(&str)`
//! - **Mock Runner**: canned responses for tests without an engine install
//!
//! # Example
//!
//! ```rust,no_run
//! use pilot_runner::{CliRunner, CliRunnerOptions, CommandConfig, EngineRunner, RunConfig, StdoutSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = CliRunner::new(CliRunnerOptions::default())?;
//!
//!     let command = CommandConfig::new(["stack", "ls"]).workdir("projects/website");
//!     let result = runner.run(&command, &RunConfig::default(), &StdoutSink).await?;
//!     println!("Exit code: {}", result.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod mock;
pub mod output;
pub mod runner;

pub use cli::{CliRunner, CliRunnerOptions};
pub use config::{CommandConfig, RunConfig};
pub use error::{RunnerError, RunnerResult};
pub use mock::{CapturedCall, MockResponse, MockRunner};
pub use output::{CaptureSink, NullSink, OutputSink, StdoutSink};
pub use runner::{EngineRunner, ExecutionResult};
