//! Deployment report returned on success.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::filter::FilterReport;
use crate::package::PackageArtifact;
use crate::types::{DeploymentTarget, InstanceRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallStatus {
    /// Install command accepted by the target
    Installed,
    /// Debug mode: install was logged, not issued
    WouldInstall,
}

/// What happened on one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOutcome {
    pub target: DeploymentTarget,
    pub install_path: String,
    /// Install path was guessed from the requested group
    pub discovery_fallback: bool,
    pub status: InstallStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub package: PackageArtifact,
    pub environment: String,
    pub pool: String,
    pub role: InstanceRole,
    pub debug: bool,
    /// `None` when validation was skipped in debug mode
    pub filter: Option<FilterReport>,
    pub targets: Vec<TargetOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DeploymentReport {
    pub fn installed_count(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| t.status == InstallStatus::Installed)
            .count()
    }

    pub fn fallback_count(&self) -> usize {
        self.targets.iter().filter(|t| t.discovery_fallback).count()
    }
}
