//! Workspace: the directory, environment and runner an engine stack lives in.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pilot_runner::{CommandConfig, EngineRunner, ExecutionResult, OutputSink, RunConfig};
use tempfile::TempDir;
use tracing::{debug, error, info};

use crate::error::{AutomationError, AutomationResult};
use crate::program::ProgramContext;
use crate::project::{self, ProjectSettings};
use crate::stack::Stack;
use crate::validator::ProgramValidator;

/// Options shared by every engine call made through a workspace.
#[derive(Clone)]
pub struct WorkspaceOptions {
    pub runner: Arc<dyn EngineRunner>,
    /// Extra environment for the engine (backend URL, passphrase, ...)
    pub env: HashMap<String, String>,
    /// Per-command timeout in seconds (0 = none)
    pub timeout_seconds: u64,
}

impl WorkspaceOptions {
    pub fn new(runner: Arc<dyn EngineRunner>) -> Self {
        Self {
            runner,
            env: HashMap::new(),
            timeout_seconds: 0,
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

impl fmt::Debug for WorkspaceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceOptions")
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// A project directory plus the runner used to drive the engine in it.
///
/// For inline programs the directory is a scratch directory removed when the
/// workspace is dropped.
#[derive(Debug)]
pub struct LocalWorkspace {
    work_dir: PathBuf,
    options: WorkspaceOptions,
    _scratch: Option<TempDir>,
}

impl LocalWorkspace {
    /// Render an inline program into a scratch project and create or select
    /// `stack_name` in it.
    pub async fn create_or_select_stack<F>(
        project_name: &str,
        stack_name: &str,
        program: F,
        options: WorkspaceOptions,
    ) -> AutomationResult<Stack>
    where
        F: FnOnce(&mut ProgramContext),
    {
        let mut ctx = ProgramContext::new(project_name);
        program(&mut ctx);

        let report = ProgramValidator::new()?.validate(&ctx);
        if !report.passed {
            let failures = report.failures();
            error!("Program {} failed validation: {:?}", project_name, failures);
            return Err(AutomationError::InvalidProgram(failures.join("; ")));
        }

        let scratch = tempfile::Builder::new()
            .prefix(&format!("{}-", project_name))
            .tempdir()?;
        project::write_program(scratch.path(), &ctx)?;

        let workspace = Self {
            work_dir: scratch.path().to_path_buf(),
            options,
            _scratch: Some(scratch),
        };
        Stack::create_or_select(stack_name, workspace).await
    }

    /// Create or select `stack_name` for the project already in `work_dir`.
    pub async fn create_or_select_stack_local(
        stack_name: &str,
        work_dir: impl Into<PathBuf>,
        options: WorkspaceOptions,
    ) -> AutomationResult<Stack> {
        let work_dir = work_dir.into();
        let settings = ProjectSettings::load(&work_dir)?;
        info!(
            "Using project {} ({}) in {:?}",
            settings.name,
            settings.runtime_name().unwrap_or("unknown runtime"),
            work_dir
        );

        let workspace = Self {
            work_dir,
            options,
            _scratch: None,
        };
        Stack::create_or_select(stack_name, workspace).await
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn project_settings(&self) -> AutomationResult<ProjectSettings> {
        ProjectSettings::load(&self.work_dir)
    }

    /// Install a resource provider plugin at a pinned version.
    pub async fn install_plugin(&self, name: &str, version: &str) -> AutomationResult<()> {
        info!("Installing plugin {} {}", name, version);
        let command = CommandConfig::new(["plugin", "install", "resource", name, version]);
        self.run_engine(
            "plugin install",
            command,
            RunConfig::default().quiet(),
            &pilot_runner::NullSink,
        )
        .await?;
        Ok(())
    }

    /// Run an engine command in this workspace. A non-zero exit is an error.
    pub async fn run_engine(
        &self,
        operation: &str,
        command: CommandConfig,
        run_config: RunConfig,
        sink: &dyn OutputSink,
    ) -> AutomationResult<ExecutionResult> {
        let command = command.workdir(&self.work_dir).envs(&self.options.env);
        let run_config = if self.options.timeout_seconds > 0 {
            run_config.timeout(self.options.timeout_seconds)
        } else {
            run_config
        };
        debug!("Engine {}: {}", operation, command.display_args());

        let result = self.options.runner.run(&command, &run_config, sink).await?;
        if !result.success() {
            error!(
                "Engine {} failed with exit code {}",
                operation, result.exit_code
            );
            return Err(AutomationError::CommandFailed {
                operation: operation.to_string(),
                exit_code: result.exit_code,
                message: result.error_summary().to_string(),
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Resource;
    use pilot_runner::{CliRunner, CliRunnerOptions, MockResponse, MockRunner, NullSink};

    fn pet(ctx: &mut ProgramContext) {
        let pet = ctx.resource(Resource::new("name", "random:RandomPet"));
        ctx.export("name", pet.id());
    }

    #[tokio::test]
    async fn test_inline_stack_renders_project_and_selects() {
        let mock = Arc::new(MockRunner::new());
        let options = WorkspaceOptions::new(mock.clone()).env("PULUMI_BACKEND_URL", "file://~");

        let stack = LocalWorkspace::create_or_select_stack("inline_pet", "dev", pet, options)
            .await
            .unwrap();

        let work_dir = stack.workspace().work_dir().to_path_buf();
        assert!(work_dir.join(crate::PROJECT_FILE).is_file());
        assert_eq!(stack.workspace().project_settings().unwrap().name, "inline_pet");

        let calls = mock.get_matching_calls(&["stack", "select"]);
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].args,
            vec!["stack", "select", "--create", "--stack", "dev"]
        );
        assert_eq!(calls[0].workdir.as_deref(), Some(work_dir.as_path()));
        assert_eq!(
            calls[0].env.get("PULUMI_BACKEND_URL").map(String::as_str),
            Some("file://~")
        );

        drop(stack);
        assert!(!work_dir.exists());
    }

    #[tokio::test]
    async fn test_invalid_program_never_reaches_engine() {
        let mock = Arc::new(MockRunner::new());
        let result = LocalWorkspace::create_or_select_stack(
            "broken",
            "dev",
            |ctx: &mut ProgramContext| {
                ctx.resource(Resource::new("site", "aws:s3:BucketV2"));
                ctx.export("url", "${nowhere.url}");
            },
            WorkspaceOptions::new(mock.clone()),
        )
        .await;

        match result {
            Err(AutomationError::InvalidProgram(message)) => {
                assert!(message.contains("undeclared 'nowhere'"), "{}", message);
                assert!(!message.contains("declares no resources"));
            }
            other => panic!("unexpected result: {:?}", other.map(|s| s.name().to_string())),
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_local_stack_requires_project() {
        let dir = tempfile::tempdir().unwrap();
        let mock = Arc::new(MockRunner::new());

        let result = LocalWorkspace::create_or_select_stack_local(
            "dev",
            dir.path(),
            WorkspaceOptions::new(mock.clone()),
        )
        .await;

        assert!(matches!(result, Err(AutomationError::ProjectNotFound(_))));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_install_plugin_failure_is_command_failed() {
        let mock = Arc::new(MockRunner::new().on(
            &["plugin", "install"],
            MockResponse::failure(255, "error: could not find plugin aws v0.0.0"),
        ));
        let stack = LocalWorkspace::create_or_select_stack(
            "inline_pet",
            "dev",
            pet,
            WorkspaceOptions::new(mock.clone()),
        )
        .await
        .unwrap();

        let err = stack
            .workspace()
            .install_plugin("aws", "v0.0.0")
            .await
            .unwrap_err();
        match err {
            AutomationError::CommandFailed {
                operation,
                exit_code,
                message,
            } => {
                assert_eq!(operation, "plugin install");
                assert_eq!(exit_code, 255);
                assert!(message.contains("could not find plugin"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(mock.was_called(&["plugin", "install", "resource", "aws", "v0.0.0"]));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cli_runner_failure_is_command_failed() {
        let dir = tempfile::tempdir().unwrap();
        let runner = CliRunner::unchecked(CliRunnerOptions {
            non_interactive: false,
            ..CliRunnerOptions::new().binary("sh")
        });
        let workspace = LocalWorkspace {
            work_dir: dir.path().to_path_buf(),
            options: WorkspaceOptions::new(Arc::new(runner)),
            _scratch: None,
        };

        let command = CommandConfig::new(["-c", "echo 'error: no stack named dev' >&2; exit 255"]);
        let err = workspace
            .run_engine("refresh", command, RunConfig::default().quiet(), &NullSink)
            .await
            .unwrap_err();

        match err {
            AutomationError::CommandFailed {
                operation,
                exit_code,
                message,
            } => {
                assert_eq!(operation, "refresh");
                assert_eq!(exit_code, 255);
                assert!(message.contains("no stack named dev"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
