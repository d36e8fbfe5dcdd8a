//! Error types for the orchestration client.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for automation operations.
pub type AutomationResult<T> = Result<T, AutomationError>;

/// Errors that can occur while driving the engine.
#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Engine {operation} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        operation: String,
        exit_code: i64,
        message: String,
    },

    #[error("Invalid program: {0}")]
    InvalidProgram(String),

    #[error("No project file found in {0}")]
    ProjectNotFound(PathBuf),

    #[error("Unexpected engine output from {operation}: {source}")]
    UnexpectedOutput {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stack output not found: {0}")]
    MissingOutput(String),

    #[error("Runner error: {0}")]
    Runner(#[from] pilot_runner::RunnerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
