//! The refresh-then-branch sequence every driver runs.

use std::io::Write;

use pilot_runner::OutputSink;
use tracing::{info, warn};

use crate::error::{AutomationError, AutomationResult};
use crate::programs::PluginRef;
use crate::stack::{ConfigValue, Stack, UpOptions};
use crate::summary::{UpResult, UpdateSummary};

const DESTROY_ACTION: &str = "destroy";

/// Which branch to take after refreshing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Up,
    Destroy,
}

impl Mode {
    /// `Destroy` iff the first argument is exactly `destroy`. Anything else,
    /// including no argument, means `Up`.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match args.into_iter().next() {
            Some(arg) if arg.as_ref() == DESTROY_ACTION => Mode::Destroy,
            Some(arg) => {
                warn!(
                    "Unrecognised action '{}', treating it as an update",
                    arg.as_ref()
                );
                Mode::Up
            }
            None => Mode::Up,
        }
    }
}

/// What the lifecycle did.
#[derive(Debug)]
pub enum LifecycleOutcome {
    Updated(UpResult),
    Destroyed(UpdateSummary),
}

impl LifecycleOutcome {
    pub fn up_result(&self) -> Option<&UpResult> {
        match self {
            LifecycleOutcome::Updated(result) => Some(result),
            LifecycleOutcome::Destroyed(_) => None,
        }
    }
}

/// Plugins, config and reported outputs for one driver run.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    mode: Mode,
    plugins: Vec<PluginRef>,
    config: Vec<(String, ConfigValue)>,
    output_labels: Vec<(String, String)>,
}

impl Lifecycle {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            plugins: Vec::new(),
            config: Vec::new(),
            output_labels: Vec::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn output_labels(&self) -> &[(String, String)] {
        &self.output_labels
    }

    pub fn plugin(mut self, plugin: PluginRef) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.push((key.into(), ConfigValue::new(value)));
        self
    }

    pub fn secret_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.push((key.into(), ConfigValue::secret(value)));
        self
    }

    /// Print output `key` as `label: value` after an update. Without any
    /// labels every output is printed under its own key.
    pub fn output_label(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.output_labels.push((key.into(), label.into()));
        self
    }

    /// Install plugins, set config, refresh, then destroy or update.
    ///
    /// Engine output is streamed to `sink`; progress messages, the change
    /// summary and outputs go to `out`.
    pub async fn run<W: Write>(
        &self,
        stack: &Stack,
        sink: &dyn OutputSink,
        out: &mut W,
    ) -> AutomationResult<LifecycleOutcome> {
        writeln!(out, "successfully initialized stack")?;

        if !self.plugins.is_empty() {
            writeln!(out, "installing plugins...")?;
            for plugin in &self.plugins {
                stack
                    .workspace()
                    .install_plugin(plugin.name, plugin.version)
                    .await?;
            }
            writeln!(out, "plugins installed")?;
        }

        writeln!(out, "setting up config...")?;
        for (key, value) in &self.config {
            stack.set_config(key, value).await?;
        }
        writeln!(out, "config set")?;

        writeln!(out, "refreshing stack...")?;
        stack.refresh(sink).await?;
        writeln!(out, "refresh complete")?;

        match self.mode {
            Mode::Destroy => {
                info!("Destroying stack {}", stack.name());
                writeln!(out, "destroying stack...")?;
                let summary = stack.destroy(sink).await?;
                writeln!(out, "stack destroy complete")?;
                Ok(LifecycleOutcome::Destroyed(summary))
            }
            Mode::Up => {
                info!("Updating stack {}", stack.name());
                writeln!(out, "updating stack...")?;
                let result = stack.up(&UpOptions::default(), sink).await?;

                write_summary(&result.summary, out)?;
                self.write_outputs(&result, out)?;
                Ok(LifecycleOutcome::Updated(result))
            }
        }
    }

    fn write_outputs<W: Write>(&self, result: &UpResult, out: &mut W) -> AutomationResult<()> {
        if self.output_labels.is_empty() {
            for (key, value) in &result.outputs {
                writeln!(out, "{}: {}", key, value)?;
            }
            return Ok(());
        }

        for (key, label) in &self.output_labels {
            let value = result
                .outputs
                .get(key)
                .ok_or_else(|| AutomationError::MissingOutput(key.clone()))?;
            writeln!(out, "{}: {}", label, value)?;
        }
        Ok(())
    }
}

/// Print the per-operation change counts, if there are any.
pub fn write_summary<W: Write>(summary: &UpdateSummary, out: &mut W) -> std::io::Result<()> {
    if summary.resource_changes.is_empty() {
        return Ok(());
    }
    writeln!(out, "update summary:")?;
    for (op, count) in &summary.resource_changes {
        writeln!(out, "    {}: {}", op, count)?;
    }
    Ok(())
}
