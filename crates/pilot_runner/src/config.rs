//! Engine command configuration types.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single engine invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Arguments passed to the engine binary
    pub args: Vec<String>,
    /// Working directory (project directory)
    pub workdir: Option<PathBuf>,
    /// Extra environment variables
    pub env: HashMap<String, String>,
}

impl CommandConfig {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            workdir: None,
            env: HashMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, vars: &HashMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Whether the arguments start with the given prefix.
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        prefix.len() <= self.args.len()
            && self.args.iter().zip(prefix).all(|(a, p)| a == p)
    }

    /// Space-joined argument line, quoting arguments with spaces.
    pub fn display_args(&self) -> String {
        self.args
            .iter()
            .map(|arg| {
                if arg.contains(' ') || arg.is_empty() {
                    format!("'{}'", arg)
                } else {
                    arg.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Run configuration with timeout and streaming behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Timeout in seconds (0 = no timeout)
    pub timeout_seconds: u64,
    /// Whether stdout lines are forwarded to the sink as they arrive
    pub stream_logs: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 0,
            stream_logs: true,
        }
    }
}

impl RunConfig {
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Capture output without forwarding it (used for JSON queries).
    pub fn quiet(mut self) -> Self {
        self.stream_logs = false;
        self
    }

    pub fn stream_logs(mut self, enabled: bool) -> Self {
        self.stream_logs = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_config_builder() {
        let config = CommandConfig::new(["config", "set"])
            .args(["aws:region", "us-west-2"])
            .workdir("/tmp/project")
            .env("PULUMI_SKIP_UPDATE_CHECK", "true");

        assert_eq!(config.args, vec!["config", "set", "aws:region", "us-west-2"]);
        assert_eq!(config.workdir, Some(PathBuf::from("/tmp/project")));
        assert_eq!(
            config.env.get("PULUMI_SKIP_UPDATE_CHECK"),
            Some(&"true".to_string())
        );
    }

    #[test]
    fn test_starts_with() {
        let config = CommandConfig::new(["stack", "output", "--json"]);

        assert!(config.starts_with(&["stack", "output"]));
        assert!(config.starts_with(&[]));
        assert!(!config.starts_with(&["stack", "history"]));
        assert!(!config.starts_with(&["stack", "output", "--json", "--show-secrets"]));
    }

    #[test]
    fn test_display_args_quotes_spaces() {
        let config = CommandConfig::new(["config", "set", "greeting", "hello world"]);
        assert_eq!(config.display_args(), "config set greeting 'hello world'");
    }

    #[test]
    fn test_run_config_defaults() {
        let run = RunConfig::default();
        assert_eq!(run.timeout_seconds, 0);
        assert!(run.stream_logs);
        assert!(!RunConfig::default().quiet().stream_logs);
    }
}
