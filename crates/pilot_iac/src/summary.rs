//! Operation results reported by the engine.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AutomationError, AutomationResult};

/// Placeholder the engine prints for secret values when secrets are not shown.
const SECRET_SENTINEL: &str = "[secret]";

/// One entry of `stack history --json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    #[serde(default)]
    pub version: Option<u64>,
    /// `update`, `refresh`, `destroy`, ...
    #[serde(default)]
    pub kind: String,
    /// `succeeded`, `failed`, `in-progress`
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    /// Count per operation type (`create`, `update`, `delete`, `same`, ...)
    #[serde(default)]
    pub resource_changes: BTreeMap<String, u64>,
}

impl UpdateSummary {
    pub fn succeeded(&self) -> bool {
        self.result == "succeeded"
    }

    pub fn started_at(&self) -> Option<DateTime<FixedOffset>> {
        self.start_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
    }

    pub fn ended_at(&self) -> Option<DateTime<FixedOffset>> {
        self.end_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
    }

    /// Parse `stack history --json` output, newest first.
    pub fn parse_history(stdout: &str) -> AutomationResult<Vec<UpdateSummary>> {
        if stdout.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(stdout).map_err(|source| AutomationError::UnexpectedOutput {
            operation: "stack history".to_string(),
            source,
        })
    }
}

/// A stack output value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValue {
    pub value: Value,
    pub secret: bool,
}

impl OutputValue {
    pub fn plain(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            secret: false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}

impl fmt::Display for OutputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secret {
            return write!(f, "{}", SECRET_SENTINEL);
        }
        match &self.value {
            Value::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other),
        }
    }
}

/// Stack outputs by key.
pub type OutputMap = BTreeMap<String, OutputValue>;

/// Combine `stack output --json` (secrets masked) with the same command run
/// with `--show-secrets` to learn which values are secret.
pub fn parse_outputs(masked: &str, plain: &str) -> AutomationResult<OutputMap> {
    let parse = |text: &str| -> AutomationResult<BTreeMap<String, Value>> {
        if text.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(text).map_err(|source| AutomationError::UnexpectedOutput {
            operation: "stack output".to_string(),
            source,
        })
    };

    let masked = parse(masked)?;
    let plain = parse(plain)?;

    Ok(plain
        .into_iter()
        .map(|(key, value)| {
            let secret = masked
                .get(&key)
                .map_or(false, |m| m.as_str() == Some(SECRET_SENTINEL) && m != &value);
            (key, OutputValue { value, secret })
        })
        .collect())
}

/// Result of `up`.
#[derive(Debug, Clone)]
pub struct UpResult {
    pub stdout: String,
    pub stderr: String,
    pub summary: UpdateSummary,
    pub outputs: OutputMap,
}

/// A single planned step from `preview --json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewStep {
    #[serde(default)]
    pub op: String,
    #[serde(default)]
    pub urn: String,
}

impl PreviewStep {
    /// Logical name and type from the URN (`urn:pulumi:stack::project::type::name`).
    pub fn describe(&self) -> String {
        let mut parts = self.urn.rsplitn(2, "::");
        let name = parts.next().unwrap_or_default();
        let type_token = parts
            .next()
            .and_then(|rest| rest.rsplit("::").next())
            .unwrap_or_default();
        format!("{} {} {}", self.op, type_token, name)
    }
}

/// Result of `preview`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    #[serde(default)]
    pub steps: Vec<PreviewStep>,
    #[serde(default)]
    pub change_summary: BTreeMap<String, u64>,
}

impl PreviewResult {
    pub fn parse(stdout: &str) -> AutomationResult<Self> {
        if stdout.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(stdout).map_err(|source| AutomationError::UnexpectedOutput {
            operation: "preview".to_string(),
            source,
        })
    }
}
