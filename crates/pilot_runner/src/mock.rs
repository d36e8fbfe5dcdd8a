//! Mock engine runner for testing.
//!
//! Provides a configurable mock implementation of the EngineRunner trait
//! for use in unit tests without requiring an engine installation.
//! Responses are matched against the command's leading arguments; the
//! longest matching prefix wins.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::config::{CommandConfig, RunConfig};
use crate::error::{RunnerError, RunnerResult};
use crate::output::OutputSink;
use crate::runner::{EngineRunner, ExecutionResult};

/// Predefined mock response for an engine command.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 100,
        }
    }

    pub fn failure(exit_code: i64, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 100,
        }
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
    pub env: HashMap<String, String>,
}

impl CapturedCall {
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        prefix.len() <= self.args.len() && self.args.iter().zip(prefix).all(|(a, p)| a == p)
    }
}

/// Mock engine runner for testing.
///
/// Captures all calls and returns predefined responses, so tests can
/// verify which engine commands ran, in what order, and with what
/// arguments.
#[derive(Clone)]
pub struct MockRunner {
    /// Whether the runner should report as available.
    available: Arc<RwLock<bool>>,
    /// Version string to return.
    version: Arc<RwLock<String>>,
    /// Responses keyed by argument prefix.
    responses: Arc<RwLock<Vec<(Vec<String>, MockResponse)>>>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Simulated failure to return (as a string message for ExecutionFailed).
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self {
            available: Arc::new(RwLock::new(true)),
            version: Arc::new(RwLock::new("v3.150.0".to_string())),
            responses: Arc::new(RwLock::new(Vec::new())),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Set whether the runner is available.
    pub fn set_available(self, available: bool) -> Self {
        *self.available.write() = available;
        self
    }

    /// Set the version string.
    pub fn set_version(self, version: impl Into<String>) -> Self {
        *self.version.write() = version.into();
        self
    }

    /// Respond to commands starting with `prefix`.
    pub fn on(self, prefix: &[&str], response: MockResponse) -> Self {
        self.responses
            .write()
            .push((prefix.iter().map(|s| s.to_string()).collect(), response));
        self
    }

    /// Set a failure to simulate for every command.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a command starting with `prefix` was run.
    pub fn was_called(&self, prefix: &[&str]) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.starts_with(prefix))
    }

    /// Get calls starting with `prefix`.
    pub fn get_matching_calls(&self, prefix: &[&str]) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Index of the first call starting with `prefix`.
    pub fn position(&self, prefix: &[&str]) -> Option<usize> {
        self.captured_calls
            .read()
            .iter()
            .position(|c| c.starts_with(prefix))
    }

    /// Record a call.
    fn record_call(&self, command: &CommandConfig) {
        self.captured_calls.write().push(CapturedCall {
            args: command.args.clone(),
            workdir: command.workdir.clone(),
            env: command.env.clone(),
        });
    }

    /// Find the response for a command.
    fn response_for(&self, command: &CommandConfig) -> MockResponse {
        self.responses
            .read()
            .iter()
            .filter(|(prefix, _)| {
                let prefix: Vec<&str> = prefix.iter().map(String::as_str).collect();
                command.starts_with(&prefix)
            })
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| MockResponse::success(""))
    }

    /// Check for simulated failure.
    fn check_failure(&self) -> RunnerResult<()> {
        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(RunnerError::ExecutionFailed(msg));
        }
        Ok(())
    }
}

#[async_trait]
impl EngineRunner for MockRunner {
    async fn is_available(&self) -> RunnerResult<bool> {
        Ok(*self.available.read())
    }

    async fn version(&self) -> RunnerResult<String> {
        self.check_failure()?;
        Ok(self.version.read().clone())
    }

    async fn run(
        &self,
        command: &CommandConfig,
        run_config: &RunConfig,
        sink: &dyn OutputSink,
    ) -> RunnerResult<ExecutionResult> {
        self.record_call(command);
        self.check_failure()?;

        let response = self.response_for(command);
        if run_config.stream_logs {
            for line in response.stdout.lines() {
                sink.write_line(line);
            }
        }

        let started_at = Utc::now();
        let finished_at = started_at + chrono::Duration::milliseconds(response.duration_ms as i64);

        Ok(ExecutionResult {
            run_id: format!("mock-{}", uuid::Uuid::new_v4()),
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at,
            finished_at,
            duration_ms: response.duration_ms,
        })
    }
}
