//! Engine runner trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{CommandConfig, RunConfig};
use crate::error::RunnerResult;
use crate::output::OutputSink;

/// Result of an engine invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Run identifier
    pub run_id: String,
    /// Exit code from the engine process
    pub exit_code: i64,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }

    /// Last non-empty stderr line, the engine's usual error summary.
    pub fn error_summary(&self) -> &str {
        self.stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("Unknown error")
    }
}

/// Engine runner trait.
#[async_trait]
pub trait EngineRunner: Send + Sync {
    /// Check if the engine binary can be executed.
    async fn is_available(&self) -> RunnerResult<bool>;

    /// Get engine version information.
    async fn version(&self) -> RunnerResult<String>;

    /// Run an engine command, forwarding stdout lines to `sink`.
    async fn run(
        &self,
        command: &CommandConfig,
        run_config: &RunConfig,
        sink: &dyn OutputSink,
    ) -> RunnerResult<ExecutionResult>;
}
