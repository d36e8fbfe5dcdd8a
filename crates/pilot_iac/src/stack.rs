//! Stack handle and lifecycle operations.

use std::path::PathBuf;

use pilot_runner::{CommandConfig, NullSink, OutputSink, RunConfig};
use tracing::{debug, info, warn};

use crate::error::AutomationResult;
use crate::summary::{self, OutputMap, PreviewResult, UpResult, UpdateSummary};
use crate::workspace::LocalWorkspace;

/// Plans are still gated behind the engine's experimental flag.
const EXPERIMENTAL_ENV: &str = "PULUMI_EXPERIMENTAL";

/// A configuration value for `config set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValue {
    pub value: String,
    pub secret: bool,
}

impl ConfigValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secret: false,
        }
    }

    pub fn secret(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            secret: true,
        }
    }
}

/// Options for `up`.
#[derive(Debug, Clone, Default)]
pub struct UpOptions {
    /// Apply a plan saved by an earlier preview
    pub plan: Option<PathBuf>,
}

impl UpOptions {
    pub fn plan(mut self, path: impl Into<PathBuf>) -> Self {
        self.plan = Some(path.into());
        self
    }
}

/// Options for `preview`.
#[derive(Debug, Clone, Default)]
pub struct PreviewOptions {
    /// Save the computed plan to this file
    pub plan: Option<PathBuf>,
}

impl PreviewOptions {
    pub fn plan(mut self, path: impl Into<PathBuf>) -> Self {
        self.plan = Some(path.into());
        self
    }
}

/// A selected stack. Owns its workspace, so an inline program's scratch
/// directory lives exactly as long as the handle.
#[derive(Debug)]
pub struct Stack {
    name: String,
    workspace: LocalWorkspace,
}

impl Stack {
    /// Select `name`, creating it if it does not exist.
    pub async fn create_or_select(
        name: &str,
        workspace: LocalWorkspace,
    ) -> AutomationResult<Self> {
        let command = CommandConfig::new(["stack", "select", "--create", "--stack", name]);
        workspace
            .run_engine("stack select", command, RunConfig::default().quiet(), &NullSink)
            .await?;
        info!("Selected stack {}", name);
        Ok(Self {
            name: name.to_string(),
            workspace,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workspace(&self) -> &LocalWorkspace {
        &self.workspace
    }

    pub async fn set_config(&self, key: &str, value: &ConfigValue) -> AutomationResult<()> {
        let mut command = CommandConfig::new(["config", "set", "--stack", self.name.as_str()]);
        if value.secret {
            command = command.arg("--secret");
        }
        let command = command.args([key, value.value.as_str()]);
        self.workspace
            .run_engine("config set", command, RunConfig::default().quiet(), &NullSink)
            .await?;
        debug!("Config {} set on {}", key, self.name);
        Ok(())
    }

    pub async fn refresh(&self, sink: &dyn OutputSink) -> AutomationResult<UpdateSummary> {
        let command = self.lifecycle_command("refresh");
        self.workspace
            .run_engine("refresh", command, RunConfig::default(), sink)
            .await?;
        self.last_summary().await
    }

    pub async fn up(&self, options: &UpOptions, sink: &dyn OutputSink) -> AutomationResult<UpResult> {
        let mut command = self.lifecycle_command("up");
        if let Some(plan) = &options.plan {
            command = command
                .arg("--plan")
                .arg(plan.display().to_string())
                .env(EXPERIMENTAL_ENV, "true");
        }
        let result = self
            .workspace
            .run_engine("up", command, RunConfig::default(), sink)
            .await?;

        let summary = self.last_summary().await?;
        let outputs = self.outputs().await?;
        Ok(UpResult {
            stdout: result.stdout,
            stderr: result.stderr,
            summary,
            outputs,
        })
    }

    /// Compute the changes `up` would make. Steps are written to `sink` once
    /// the engine has finished.
    pub async fn preview(
        &self,
        options: &PreviewOptions,
        sink: &dyn OutputSink,
    ) -> AutomationResult<PreviewResult> {
        let mut command = CommandConfig::new(["preview", "--json", "--stack", self.name.as_str()]);
        if let Some(plan) = &options.plan {
            command = command
                .arg("--save-plan")
                .arg(plan.display().to_string())
                .env(EXPERIMENTAL_ENV, "true");
        }
        let result = self
            .workspace
            .run_engine("preview", command, RunConfig::default().quiet(), &NullSink)
            .await?;

        let preview = PreviewResult::parse(&result.stdout)?;
        for step in &preview.steps {
            sink.write_line(&format!("    {}", step.describe()));
        }
        Ok(preview)
    }

    pub async fn destroy(&self, sink: &dyn OutputSink) -> AutomationResult<UpdateSummary> {
        let command = self.lifecycle_command("destroy");
        self.workspace
            .run_engine("destroy", command, RunConfig::default(), sink)
            .await?;
        self.last_summary().await
    }

    /// Current stack outputs, with secret values flagged.
    pub async fn outputs(&self) -> AutomationResult<OutputMap> {
        let masked = self
            .workspace
            .run_engine(
                "stack output",
                CommandConfig::new(["stack", "output", "--json", "--stack", self.name.as_str()]),
                RunConfig::default().quiet(),
                &NullSink,
            )
            .await?;
        let plain = self
            .workspace
            .run_engine(
                "stack output",
                CommandConfig::new([
                    "stack",
                    "output",
                    "--json",
                    "--show-secrets",
                    "--stack",
                    self.name.as_str(),
                ]),
                RunConfig::default().quiet(),
                &NullSink,
            )
            .await?;
        summary::parse_outputs(&masked.stdout, &plain.stdout)
    }

    /// Most recent updates, newest first.
    pub async fn history(&self, page_size: u32) -> AutomationResult<Vec<UpdateSummary>> {
        let page_size = page_size.to_string();
        let command = CommandConfig::new([
            "stack",
            "history",
            "--json",
            "--show-secrets",
            "--page-size",
            page_size.as_str(),
            "--stack",
            self.name.as_str(),
        ]);
        let result = self
            .workspace
            .run_engine("stack history", command, RunConfig::default().quiet(), &NullSink)
            .await?;
        UpdateSummary::parse_history(&result.stdout)
    }

    fn lifecycle_command(&self, operation: &str) -> CommandConfig {
        CommandConfig::new([operation, "--yes", "--skip-preview", "--stack", self.name.as_str()])
    }

    async fn last_summary(&self) -> AutomationResult<UpdateSummary> {
        let summary = self.history(1).await?.into_iter().next();
        if summary.is_none() {
            warn!("Stack {} has no recorded history", self.name);
        }
        Ok(summary.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{ProgramContext, Resource};
    use crate::workspace::WorkspaceOptions;
    use pilot_runner::{CaptureSink, MockResponse, MockRunner};
    use std::sync::Arc;

    const HISTORY: &str = r#"[{"kind":"update","result":"succeeded","resourceChanges":{"create":1}}]"#;

    fn pet(ctx: &mut ProgramContext) {
        let pet = ctx.resource(Resource::new("name", "random:RandomPet"));
        ctx.export("name", pet.id());
    }

    async fn stack(mock: &Arc<MockRunner>) -> Stack {
        LocalWorkspace::create_or_select_stack(
            "inline_pet",
            "dev",
            pet,
            WorkspaceOptions::new(mock.clone()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_set_config_plain_and_secret() {
        let mock = Arc::new(MockRunner::new());
        let stack = stack(&mock).await;

        stack
            .set_config("aws:region", &ConfigValue::new("us-west-2"))
            .await
            .unwrap();
        stack
            .set_config("dbPassword", &ConfigValue::secret("hellosql"))
            .await
            .unwrap();

        let calls = mock.get_matching_calls(&["config", "set"]);
        assert_eq!(
            calls[0].args,
            vec!["config", "set", "--stack", "dev", "aws:region", "us-west-2"]
        );
        assert_eq!(
            calls[1].args,
            vec!["config", "set", "--stack", "dev", "--secret", "dbPassword", "hellosql"]
        );
    }

    #[tokio::test]
    async fn test_up_streams_and_collects_outputs() {
        let mock = Arc::new(
            MockRunner::new()
                .on(&["up"], MockResponse::success("Updating (dev)\n + random:RandomPet name created"))
                .on(&["stack", "history"], MockResponse::success(HISTORY))
                .on(&["stack", "output", "--json"], MockResponse::success(r#"{"name":"hip-gnu"}"#))
                .on(
                    &["stack", "output", "--json", "--show-secrets"],
                    MockResponse::success(r#"{"name":"hip-gnu"}"#),
                ),
        );
        let stack = stack(&mock).await;
        let sink = CaptureSink::new();

        let result = stack.up(&UpOptions::default(), &sink).await.unwrap();

        assert_eq!(sink.lines()[0], "Updating (dev)");
        assert!(result.stdout.contains("created"));
        assert_eq!(result.summary.resource_changes.get("create"), Some(&1));
        assert_eq!(result.outputs["name"].to_string(), "hip-gnu");
        assert!(mock.was_called(&["up", "--yes", "--skip-preview", "--stack", "dev"]));
    }

    #[tokio::test]
    async fn test_preview_saves_plan_and_up_applies_it() {
        let preview_json = r#"{
            "steps": [{"op": "create", "urn": "urn:pulumi:dev::inline_pet::random:index/randomPet:RandomPet::name"}],
            "changeSummary": {"create": 1}
        }"#;
        let mock = Arc::new(
            MockRunner::new()
                .on(&["preview"], MockResponse::success(preview_json))
                .on(&["stack", "history"], MockResponse::success(HISTORY)),
        );
        let stack = stack(&mock).await;
        let sink = CaptureSink::new();

        let preview = stack
            .preview(&PreviewOptions::default().plan("plan.json"), &sink)
            .await
            .unwrap();
        assert_eq!(preview.change_summary.get("create"), Some(&1));
        assert_eq!(
            sink.lines(),
            vec!["    create random:index/randomPet:RandomPet name"]
        );

        stack
            .up(&UpOptions::default().plan("plan.json"), &sink)
            .await
            .unwrap();

        let preview_call = &mock.get_matching_calls(&["preview"])[0];
        assert!(preview_call.starts_with(&["preview", "--json", "--stack", "dev", "--save-plan", "plan.json"]));
        assert_eq!(preview_call.env.get(EXPERIMENTAL_ENV).map(String::as_str), Some("true"));

        let up_call = &mock.get_matching_calls(&["up"])[0];
        assert!(up_call.args.ends_with(&["--plan".to_string(), "plan.json".to_string()]));
        assert_eq!(up_call.env.get(EXPERIMENTAL_ENV).map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn test_destroy_without_history_returns_empty_summary() {
        let mock = Arc::new(MockRunner::new());
        let stack = stack(&mock).await;

        let summary = stack.destroy(&NullSink).await.unwrap();

        assert!(summary.resource_changes.is_empty());
        assert!(mock.was_called(&["destroy", "--yes", "--skip-preview", "--stack", "dev"]));
        assert!(!mock.was_called(&["up"]));
    }
}
