//! Deployment orchestration: resolve, locate, validate, then upload and
//! install on each target in order.
//!
//! Targets are visited one at a time. The first upload or install failure
//! ends the run; targets already deployed are not rolled back, and the error
//! carries their names so the partial deployment can be reconciled.

use chrono::Utc;
use tempfile::TempDir;
use tracing::{error, info, warn};

use crate::config::{Settings, reference_filter_path, resolve};
use crate::error::DeployError;
use crate::filter::{self, FilterReport};
use crate::package::{PackageArtifact, PackageLocator};
use crate::remote::{PackageManager, lookup_install_location};
use crate::types::DeploymentTarget;

use super::report::{DeploymentReport, InstallStatus, TargetOutcome};
use super::request::DeploymentRequest;

/// Runs deployment requests against a package manager
pub struct Deployer<'a> {
    settings: &'a Settings,
    manager: &'a dyn PackageManager,
}

impl std::fmt::Debug for Deployer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployer").finish_non_exhaustive()
    }
}

impl<'a> Deployer<'a> {
    pub fn new(settings: &'a Settings, manager: &'a dyn PackageManager) -> Self {
        Self { settings, manager }
    }

    /// Run one request start to finish.
    pub fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentReport, DeployError> {
        let started_at = Utc::now();
        request.validate()?;

        let resolution = resolve(
            self.settings,
            &request.environment,
            &request.pool,
            request.role,
        )?;
        if !resolution.build_allowed {
            return Err(DeployError::Config(format!(
                "deployments are not allowed for environment '{}'",
                request.environment
            )));
        }
        if resolution.targets.is_empty() {
            return Err(DeployError::Config(format!(
                "no targets resolved for environment '{}', pool '{}', role '{}'",
                request.environment, request.pool, request.role
            )));
        }
        info!(
            targets = %join_targets(&resolution.targets),
            "resolved {} target(s)",
            resolution.targets.len()
        );

        // Removed on every return path when dropped
        let workdir = self.create_workdir()?;
        let artifact = PackageLocator::new(&self.settings.package).locate(
            &request.package_path,
            &request.name_prefix,
            workdir.path(),
        )?;

        let filter = if request.debug {
            info!("debug mode: skipping filter validation, installs will only be logged");
            None
        } else {
            Some(self.validate_filters(request, &artifact)?)
        };

        let mut outcomes: Vec<TargetOutcome> = Vec::with_capacity(resolution.targets.len());
        for target in &resolution.targets {
            let outcome = self.deploy_to_target(target, &artifact, request, &outcomes)?;
            outcomes.push(outcome);
        }

        info!(
            package = %artifact.name,
            targets = outcomes.len(),
            "deployment complete"
        );

        Ok(DeploymentReport {
            package: artifact,
            environment: request.environment.clone(),
            pool: request.pool.clone(),
            role: request.role,
            debug: request.debug,
            filter,
            targets: outcomes,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn create_workdir(&self) -> Result<TempDir, DeployError> {
        let root = &self.settings.package.explode_dir;
        std::fs::create_dir_all(root).map_err(|e| DeployError::io(root, e))?;
        tempfile::Builder::new()
            .prefix("pkgdeploy-")
            .tempdir_in(root)
            .map_err(|e| DeployError::io(root, e))
    }

    fn validate_filters(
        &self,
        request: &DeploymentRequest,
        artifact: &PackageArtifact,
    ) -> Result<FilterReport, DeployError> {
        let reference = reference_filter_path(
            &self.settings.package.filter_reference_root,
            &request.group,
            &request.project,
        );
        match filter::validate_against_file(
            &artifact.filter_roots,
            &reference,
            &request.group,
            &request.project,
        ) {
            Ok(report) => {
                if report.roots.is_empty() {
                    warn!(
                        package = %artifact.name,
                        "package declares no filter roots, nothing to validate"
                    );
                }
                info!(
                    reference = %reference.display(),
                    roots = report.roots.len(),
                    "filter validation passed"
                );
                Ok(report)
            }
            Err(e) => {
                error!("{e}");
                Err(e)
            }
        }
    }

    fn deploy_to_target(
        &self,
        target: &DeploymentTarget,
        artifact: &PackageArtifact,
        request: &DeploymentRequest,
        done: &[TargetOutcome],
    ) -> Result<TargetOutcome, DeployError> {
        let pm = &self.settings.package_manager;
        let completed = || -> Vec<String> { done.iter().map(|o| o.target.to_string()).collect() };

        info!(host = %target, role = %target.role, "uploading {}", artifact.file_name());
        let uploaded = self
            .manager
            .upload(target, artifact)
            .map_err(|e| format!("{e:#}"))
            .and_then(|response| {
                if response.is_success(&pm.success_markers) {
                    Ok(())
                } else {
                    Err(response.summary())
                }
            });
        if let Err(reason) = uploaded {
            error!(host = %target, "upload failed: {reason}");
            return Err(DeployError::Upload {
                target: target.to_string(),
                reason,
                completed: completed(),
            });
        }

        let lookup = lookup_install_location(
            self.manager,
            target,
            &artifact.name,
            &pm.package_base_path,
            &request.group,
        );
        let install_path = lookup.location.install_path();

        let status = if request.debug {
            info!(host = %target, path = %install_path, "would install (debug mode)");
            InstallStatus::WouldInstall
        } else {
            info!(host = %target, path = %install_path, "installing");
            let installed = self
                .manager
                .install(target, &install_path)
                .map_err(|e| format!("{e:#}"))
                .and_then(|response| {
                    if response.is_success(&pm.success_markers) {
                        Ok(())
                    } else {
                        Err(response.summary())
                    }
                });
            if let Err(reason) = installed {
                error!(host = %target, path = %install_path, "install failed: {reason}");
                if !done.is_empty() {
                    warn!(
                        "partial deployment: already installed on {}",
                        completed().join(", ")
                    );
                }
                return Err(DeployError::Install {
                    target: target.to_string(),
                    reason,
                    completed: completed(),
                });
            }
            info!(host = %target, "installed");
            InstallStatus::Installed
        };

        Ok(TargetOutcome {
            target: target.clone(),
            install_path,
            discovery_fallback: lookup.fallback_used,
            status,
        })
    }
}

fn join_targets(targets: &[DeploymentTarget]) -> String {
    targets
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
