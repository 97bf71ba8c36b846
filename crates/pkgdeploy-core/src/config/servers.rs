//! Server-list table keyed by (environment token, pool).

use std::collections::BTreeMap;

use crate::error::DeployError;
use crate::types::{DeploymentTarget, Role};

use super::schema::PoolEntry;
use super::settings::PortDefaults;

/// One `host[:port]` entry from a server list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    pub host: String,
    pub port: Option<u16>,
}

impl ServerEntry {
    /// Turn the entry into a target, filling a missing port from the role default.
    pub fn to_target(&self, role: Role, ports: &PortDefaults) -> DeploymentTarget {
        let port = self.port.unwrap_or_else(|| ports.for_role(role));
        DeploymentTarget::new(self.host.clone(), port, role)
    }
}

/// Parse a comma-separated `host[:port]` list. Empty entries are dropped,
/// duplicates are kept.
pub fn parse_server_list(key: &str, value: &str) -> Result<Vec<ServerEntry>, DeployError> {
    let mut entries = Vec::new();
    for raw in value.split(',') {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let (host, port) = match raw.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.trim().parse::<u16>().map_err(|_| {
                    DeployError::Config(format!("{key}: invalid port in server entry '{raw}'"))
                })?;
                (host.trim(), Some(port))
            }
            None => (raw, None),
        };
        if host.is_empty() {
            return Err(DeployError::Config(format!(
                "{key}: empty host in server entry '{raw}'"
            )));
        }
        entries.push(ServerEntry {
            host: host.to_string(),
            port,
        });
    }
    Ok(entries)
}

#[derive(Debug, Clone, Default)]
struct PoolServers {
    author: Option<Vec<ServerEntry>>,
    publish: Option<Vec<ServerEntry>>,
}

/// Typed replacement for string-built `<token>.<pool>.<role>` lookups.
#[derive(Debug, Clone, Default)]
pub struct ServerTable {
    pools: BTreeMap<(String, String), PoolServers>,
}

impl ServerTable {
    pub(crate) fn from_raw(
        raw: &BTreeMap<String, BTreeMap<String, PoolEntry>>,
    ) -> Result<Self, DeployError> {
        let mut pools = BTreeMap::new();
        for (token, by_pool) in raw {
            for (pool, entry) in by_pool {
                let pool = pool.to_ascii_lowercase();
                let parse = |role: Role, value: &Option<String>| {
                    value
                        .as_deref()
                        .map(|v| parse_server_list(&Self::key(token, &pool, role), v))
                        .transpose()
                };
                let servers = PoolServers {
                    author: parse(Role::Author, &entry.author)?,
                    publish: parse(Role::Publish, &entry.publish)?,
                };
                pools.insert((token.clone(), pool), servers);
            }
        }
        Ok(Self { pools })
    }

    /// Configuration key naming a server list, used in error messages.
    pub fn key(token: &str, pool: &str, role: Role) -> String {
        format!("servers.{token}.{pool}.{role}")
    }

    /// Whether any pool is configured for the token.
    pub fn has_token(&self, token: &str) -> bool {
        self.pools.keys().any(|(t, _)| t == token)
    }

    /// Whether the (token, pool) pair has an entry at all.
    pub fn has_pool(&self, token: &str, pool: &str) -> bool {
        self.pools
            .contains_key(&(token.to_string(), pool.to_ascii_lowercase()))
    }

    /// Look up the server list for a role. The pool is matched lower-cased.
    pub fn lookup(&self, token: &str, pool: &str, role: Role) -> Option<&[ServerEntry]> {
        let servers = self
            .pools
            .get(&(token.to_string(), pool.to_ascii_lowercase()))?;
        match role {
            Role::Author => servers.author.as_deref(),
            Role::Publish => servers.publish.as_deref(),
        }
    }
}
