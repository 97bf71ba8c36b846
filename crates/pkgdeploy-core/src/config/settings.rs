//! Validated, immutable settings passed by reference into every component.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::DeployError;
use crate::types::Role;

use super::schema::RawSettings;
use super::servers::ServerTable;

/// Basic-auth credentials for the package-manager service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Parse a combined `username:password` string. The password may contain `:`.
    pub fn parse(combined: &str) -> Result<Self, DeployError> {
        let (username, password) = combined.split_once(':').ok_or_else(|| {
            DeployError::Config(
                "package_manager.credentials must have the form username:password".to_string(),
            )
        })?;
        if username.is_empty() {
            return Err(DeployError::Config(
                "package_manager.credentials has an empty username".to_string(),
            ));
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PackageManagerSettings {
    pub list_path: String,
    pub upload_path: String,
    pub install_path_prefix: String,
    pub package_base_path: String,
    pub credentials: Credentials,
    pub timeout: Duration,
    pub success_markers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortDefaults {
    pub author: u16,
    pub publish: u16,
}

impl PortDefaults {
    pub fn for_role(&self, role: Role) -> u16 {
        match role {
            Role::Author => self.author,
            Role::Publish => self.publish,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PackageSettings {
    pub explode_dir: PathBuf,
    pub max_size_mb: Option<u64>,
    pub filter_reference_root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSettings {
    pub token: String,
    pub build_allowed: bool,
}

/// Complete validated configuration for a run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub package_manager: PackageManagerSettings,
    pub ports: PortDefaults,
    pub package: PackageSettings,
    environments: BTreeMap<String, EnvironmentSettings>,
    servers: ServerTable,
}

impl Settings {
    /// Validate raw settings. Every problem names the offending key.
    pub fn from_raw(raw: RawSettings) -> Result<Self, DeployError> {
        let pm = raw.package_manager;
        let credentials = Credentials::parse(&pm.credentials)?;
        if pm.timeout_secs == 0 {
            return Err(DeployError::Config(
                "package_manager.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if pm.success_markers.iter().all(|m| m.trim().is_empty()) {
            return Err(DeployError::Config(
                "package_manager.success_markers must contain at least one marker".to_string(),
            ));
        }

        let servers = ServerTable::from_raw(&raw.servers)?;

        let mut environments = BTreeMap::new();
        for (name, entry) in raw.environments {
            let build_allowed = entry.build_allowed.as_bool().ok_or_else(|| {
                DeployError::Config(format!(
                    "environments.{name}.build_allowed: expected true/false/1/0/yes/no"
                ))
            })?;
            let token = entry.token.trim().to_string();
            if token.is_empty() {
                return Err(DeployError::Config(format!(
                    "environments.{name}.token is empty"
                )));
            }
            if !servers.has_token(&token) {
                return Err(DeployError::Config(format!(
                    "environments.{name}.token = '{token}' but no [servers.{token}] table exists"
                )));
            }
            environments.insert(
                name,
                EnvironmentSettings {
                    token,
                    build_allowed,
                },
            );
        }

        let explode_dir = raw.package.explode_dir.unwrap_or_else(std::env::temp_dir);

        Ok(Self {
            package_manager: PackageManagerSettings {
                list_path: pm.list_path,
                upload_path: pm.upload_path,
                install_path_prefix: pm.install_path_prefix,
                package_base_path: pm.package_base_path,
                credentials,
                timeout: Duration::from_secs(pm.timeout_secs),
                success_markers: pm
                    .success_markers
                    .into_iter()
                    .filter(|m| !m.trim().is_empty())
                    .collect(),
            },
            ports: PortDefaults {
                author: raw.ports.author,
                publish: raw.ports.publish,
            },
            package: PackageSettings {
                explode_dir,
                max_size_mb: raw.package.max_size_mb,
                filter_reference_root: raw.package.filter_reference_root,
            },
            environments,
            servers,
        })
    }

    pub fn environment(&self, name: &str) -> Option<&EnvironmentSettings> {
        self.environments.get(name)
    }

    pub fn servers(&self) -> &ServerTable {
        &self.servers
    }
}
