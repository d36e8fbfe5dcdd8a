//! CLI-based engine runner.
//!
//! Executes the `pulumi` binary as a child process, streaming stdout to the
//! caller's sink line by line while stderr is collected in the background.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::{CommandConfig, RunConfig};
use crate::error::{RunnerError, RunnerResult};
use crate::output::OutputSink;
use crate::runner::{EngineRunner, ExecutionResult};

/// Default engine binary name, resolved through `PATH`.
pub const DEFAULT_ENGINE_BIN: &str = "pulumi";

/// CLI-based engine runner options.
#[derive(Debug, Clone)]
pub struct CliRunnerOptions {
    /// Engine binary (name or path)
    pub binary: PathBuf,
    /// Dry-run mode (log commands without executing)
    pub dry_run: bool,
    /// Turn non-zero exit codes into errors. Off by default so callers see
    /// the exit code and stderr of a failed command.
    pub fail_fast: bool,
    /// Pass `--non-interactive` to every command
    pub non_interactive: bool,
}

impl Default for CliRunnerOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_ENGINE_BIN),
            dry_run: false,
            fail_fast: false,
            non_interactive: true,
        }
    }
}

impl CliRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }
}

/// CLI-based engine runner.
pub struct CliRunner {
    options: CliRunnerOptions,
}

impl CliRunner {
    /// Create a runner, verifying that the engine binary can be executed.
    pub fn new(options: CliRunnerOptions) -> RunnerResult<Self> {
        if !options.dry_run && !Self::is_engine_available(&options.binary) {
            return Err(RunnerError::EngineNotAvailable(format!(
                "{} could not be executed; install it or set its path",
                options.binary.display()
            )));
        }
        info!("Using engine binary: {}", options.binary.display());
        Ok(Self { options })
    }

    /// Create a runner without probing the binary.
    pub fn unchecked(options: CliRunnerOptions) -> Self {
        Self { options }
    }

    fn is_engine_available(binary: &Path) -> bool {
        std::process::Command::new(binary)
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Check if dry-run mode is enabled.
    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Full argument list for a command, including runner-wide flags.
    fn build_args(&self, command: &CommandConfig) -> Vec<String> {
        let mut args = command.args.clone();
        if self.options.non_interactive && !args.iter().any(|a| a == "--non-interactive") {
            args.push("--non-interactive".to_string());
        }
        args
    }

    /// Format command for logging.
    fn format_command(&self, args: &[String]) -> String {
        let mut cmd = self.options.binary.display().to_string();
        for arg in args {
            if arg.contains(' ') {
                cmd.push_str(&format!(" '{}'", arg));
            } else {
                cmd.push_str(&format!(" {}", arg));
            }
        }
        cmd
    }

    /// Execute a command and capture output with streaming.
    async fn execute_with_streaming(
        &self,
        command: &CommandConfig,
        args: &[String],
        run_config: &RunConfig,
        sink: &dyn OutputSink,
    ) -> RunnerResult<(i64, String, String)> {
        let mut cmd = Command::new(&self.options.binary);
        cmd.args(args);
        if let Some(dir) = &command.workdir {
            cmd.current_dir(dir);
        }
        cmd.envs(&command.env);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            RunnerError::ExecutionFailed(format!(
                "Failed to spawn {}: {}",
                self.options.binary.display(),
                e
            ))
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RunnerError::ExecutionFailed("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RunnerError::ExecutionFailed("stderr was not captured".to_string()))?;

        let stderr_handle = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr);
            let mut buf = Vec::new();
            let mut output = String::new();
            while let Ok(Some(line)) = read_line_lossy(&mut reader, &mut buf).await {
                output.push_str(&line);
                output.push('\n');
            }
            output
        });

        let stream_logs = run_config.stream_logs;
        let completion = async {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            let mut output = String::new();
            while let Some(line) = read_line_lossy(&mut reader, &mut buf).await? {
                if stream_logs {
                    sink.write_line(&line);
                }
                output.push_str(&line);
                output.push('\n');
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, output))
        };

        let (status, stdout_output) = if run_config.timeout_seconds > 0 {
            let timeout = Duration::from_secs(run_config.timeout_seconds);
            match tokio::time::timeout(timeout, completion).await {
                Ok(result) => result?,
                Err(_) => {
                    stderr_handle.abort();
                    return Err(RunnerError::Timeout(run_config.timeout_seconds));
                }
            }
        } else {
            completion.await?
        };

        let stderr_output = stderr_handle.await.unwrap_or_default();
        let exit_code = status.code().unwrap_or(-1) as i64;

        Ok((exit_code, stdout_output, stderr_output))
    }
}

/// Read one line, replacing invalid UTF-8 instead of failing on it. The
/// engine echoes provider output verbatim, so bytes are not guaranteed UTF-8.
async fn read_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

#[async_trait]
impl EngineRunner for CliRunner {
    async fn is_available(&self) -> RunnerResult<bool> {
        Ok(Self::is_engine_available(&self.options.binary))
    }

    async fn version(&self) -> RunnerResult<String> {
        let output = Command::new(&self.options.binary)
            .arg("version")
            .output()
            .await
            .map_err(|e| RunnerError::ExecutionFailed(e.to_string()))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(RunnerError::ExecutionFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ))
        }
    }

    async fn run(
        &self,
        command: &CommandConfig,
        run_config: &RunConfig,
        sink: &dyn OutputSink,
    ) -> RunnerResult<ExecutionResult> {
        let args = self.build_args(command);
        let cmd_str = self.format_command(&args);

        debug!("Command: {}", cmd_str);

        if self.options.dry_run {
            info!("[DRY-RUN] Would execute: {}", cmd_str);
            return Ok(ExecutionResult {
                run_id: "dry-run".to_string(),
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
                started_at: Utc::now(),
                finished_at: Utc::now(),
                duration_ms: 0,
            });
        }

        let started_at = Utc::now();
        let (exit_code, stdout, stderr) = self
            .execute_with_streaming(command, &args, run_config, sink)
            .await?;
        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;

        if exit_code == 0 {
            debug!("Engine command completed in {}ms", duration_ms);
        } else {
            error!(
                "Engine command failed with exit code {} after {}ms",
                exit_code, duration_ms
            );
        }

        let result = ExecutionResult {
            run_id: uuid::Uuid::new_v4().to_string(),
            exit_code,
            stdout,
            stderr,
            started_at,
            finished_at,
            duration_ms,
        };

        if self.options.fail_fast && exit_code != 0 {
            warn!("{}", result.error_summary());
            return Err(RunnerError::ExecutionFailed(format!(
                "`{}` exited with code {}: {}",
                command.display_args(),
                exit_code,
                result.error_summary()
            )));
        }

        Ok(result)
    }
}
