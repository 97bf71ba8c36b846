//! Resolve (environment, pool, role) to concrete deployment targets.

use tracing::debug;

use crate::error::DeployError;
use crate::types::{DeploymentTarget, InstanceRole};

use super::servers::ServerTable;
use super::settings::Settings;

/// Result of resolving a deployment request against configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Targets in deployment order
    pub targets: Vec<DeploymentTarget>,
    /// Whether the environment permits deployments
    pub build_allowed: bool,
}

/// Resolve the ordered target list and the build-permission flag.
///
/// For [`InstanceRole::Both`] the author list comes first, then the publish
/// list. Duplicate hosts are kept, so a host listed twice is deployed to twice.
pub fn resolve(
    settings: &Settings,
    environment: &str,
    pool: &str,
    role: InstanceRole,
) -> Result<Resolution, DeployError> {
    let env = settings.environment(environment).ok_or_else(|| {
        DeployError::Config(format!(
            "unknown environment '{environment}' (no [environments.{environment}] entry)"
        ))
    })?;
    let pool = pool.to_ascii_lowercase();
    let table = settings.servers();

    if !table.has_pool(&env.token, &pool) {
        return Err(DeployError::Config(format!(
            "no server lists for key servers.{}.{pool}",
            env.token
        )));
    }

    let mut targets = Vec::new();
    for &r in role.roles() {
        let entries = table.lookup(&env.token, &pool, r).ok_or_else(|| {
            DeployError::Config(format!(
                "missing key {}",
                ServerTable::key(&env.token, &pool, r)
            ))
        })?;
        targets.extend(entries.iter().map(|e| e.to_target(r, &settings.ports)));
    }

    debug!(
        environment,
        pool = %pool,
        role = %role,
        targets = targets.len(),
        "resolved deployment targets"
    );

    Ok(Resolution {
        targets,
        build_allowed: env.build_allowed,
    })
}
