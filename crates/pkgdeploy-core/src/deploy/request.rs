//! The unit of work driven through one orchestration pass.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::DeployError;
use crate::types::InstanceRole;

/// One deployment request, created from the invocation and discarded after
/// the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentRequest {
    /// Package file, or directory to search
    pub package_path: PathBuf,
    /// File-name prefix; also the fallback logical name
    pub name_prefix: String,
    /// Package group, keys the reference filter list and the fallback install path
    pub group: String,
    /// Project, keys the reference filter list
    pub project: String,
    pub environment: String,
    pub role: InstanceRole,
    pub pool: String,
    /// Skip filter validation and log intended installs instead of issuing them
    pub debug: bool,
}

impl DeploymentRequest {
    /// Reject blank identifiers before any configuration lookup.
    pub fn validate(&self) -> Result<(), DeployError> {
        let fields = [
            ("name prefix", &self.name_prefix),
            ("group", &self.group),
            ("project", &self.project),
            ("environment", &self.environment),
            ("pool", &self.pool),
        ];
        for (label, value) in fields {
            if value.trim().is_empty() {
                return Err(DeployError::Config(format!("{label} must not be empty")));
            }
        }
        check_relative("group", &self.group)?;
        if self.project.contains(['/', '\\']) || matches!(self.project.as_str(), "." | "..") {
            return Err(DeployError::Config(format!(
                "project '{}' must be a single path segment",
                self.project
            )));
        }
        Ok(())
    }
}

/// Groups may nest (`acme/site`) but must stay relative and below the root
/// they are joined to.
fn check_relative(label: &str, value: &str) -> Result<(), DeployError> {
    let invalid = value.starts_with('/')
        || value.contains('\\')
        || value
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if invalid {
        return Err(DeployError::Config(format!(
            "{label} '{value}' must be a relative path without '.' or '..' segments"
        )));
    }
    Ok(())
}
