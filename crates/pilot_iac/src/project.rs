//! Engine project files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AutomationError, AutomationResult};
use crate::program::ProgramContext;

/// Project file name the engine looks for in a working directory.
pub const PROJECT_FILE: &str = "Pulumi.yaml";

const PROJECT_FILE_ALT: &str = "Pulumi.yml";

/// The subset of project settings the drivers care about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSettings {
    pub name: String,
    /// Either a runtime name or `{ name, options }`
    pub runtime: serde_yaml::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProjectSettings {
    /// Locate the project file in `dir`.
    pub fn find(dir: &Path) -> Option<PathBuf> {
        [PROJECT_FILE, PROJECT_FILE_ALT]
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Read project settings from `dir`.
    pub fn load(dir: &Path) -> AutomationResult<Self> {
        let path =
            Self::find(dir).ok_or_else(|| AutomationError::ProjectNotFound(dir.to_path_buf()))?;
        debug!("Reading project settings from {:?}", path);
        let content = fs::read_to_string(&path)?;
        let settings: ProjectSettings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Runtime name regardless of which form the file uses.
    pub fn runtime_name(&self) -> Option<&str> {
        match &self.runtime {
            serde_yaml::Value::String(name) => Some(name),
            other => other.get("name").and_then(|v| v.as_str()),
        }
    }
}

/// Write a rendered program as the project file in `dir`.
pub fn write_program(dir: &Path, program: &ProgramContext) -> AutomationResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(PROJECT_FILE);
    fs::write(&path, program.to_yaml()?)?;
    info!(
        "Wrote project {} with {} resources to {:?}",
        program.project_name(),
        program.resources().len(),
        path
    );
    Ok(path)
}
