//! Configuration schema for deploy.toml
//!
//! These are the raw, as-written shapes. [`super::Settings`] is built from
//! them after validation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Root structure of deploy.toml
#[derive(Debug, Clone, Deserialize)]
pub struct RawSettings {
    /// Package-manager endpoints and credentials
    pub package_manager: PackageManagerSection,

    /// Default ports per role
    #[serde(default)]
    pub ports: PortsSection,

    /// Local package handling
    pub package: PackageSection,

    /// Environments keyed by name (e.g. "dev", "qa")
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentEntry>,

    /// Server lists keyed by environment token, then pool
    #[serde(default)]
    pub servers: BTreeMap<String, BTreeMap<String, PoolEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageManagerSection {
    /// Listing endpoint, including its query string
    #[serde(default = "default_list_path")]
    pub list_path: String,

    /// Multipart upload endpoint
    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Prefix prepended to the repository install path
    #[serde(default = "default_install_path_prefix")]
    pub install_path_prefix: String,

    /// Repository folder holding uploaded packages
    #[serde(default = "default_package_base_path")]
    pub package_base_path: String,

    /// Basic-auth pair as `username:password`
    pub credentials: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Response fragments that mark an upload or install as successful
    #[serde(default = "default_success_markers")]
    pub success_markers: Vec<String>,
}

fn default_list_path() -> String {
    "/crx/packmgr/service.jsp?cmd=ls".to_string()
}

fn default_upload_path() -> String {
    "/crx/packmgr/service.jsp".to_string()
}

fn default_install_path_prefix() -> String {
    "/crx/packmgr/service/.json".to_string()
}

fn default_package_base_path() -> String {
    "/etc/packages".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_success_markers() -> Vec<String> {
    vec![
        "\"success\":true".to_string(),
        "<status code=\"200\">ok</status>".to_string(),
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortsSection {
    #[serde(default = "default_author_port")]
    pub author: u16,
    #[serde(default = "default_publish_port")]
    pub publish: u16,
}

fn default_author_port() -> u16 {
    4502
}

fn default_publish_port() -> u16 {
    4503
}

impl Default for PortsSection {
    fn default() -> Self {
        Self {
            author: default_author_port(),
            publish: default_publish_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageSection {
    /// Root for temporary extraction directories (system temp dir if unset)
    #[serde(default)]
    pub explode_dir: Option<PathBuf>,

    /// Packages must be strictly smaller than this many megabytes
    #[serde(default)]
    pub max_size_mb: Option<u64>,

    /// Root of the `<group>/<project>/filter.txt` reference lists
    pub filter_reference_root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentEntry {
    /// Token used as the first component of server-list keys
    pub token: String,

    /// Whether packages may be deployed to this environment
    pub build_allowed: FlagValue,
}

/// A flag as it may be written in TOML: `true`, `1` or `"yes"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl FlagValue {
    /// Interpret the flag, accepting `true/false/1/0/yes/no` case-insensitively.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            FlagValue::Int(1) => Some(true),
            FlagValue::Int(0) => Some(false),
            FlagValue::Int(_) => None,
            FlagValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
        }
    }
}

/// Server lists for one (token, pool) pair.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolEntry {
    /// Comma-separated `host[:port]` list
    #[serde(default)]
    pub author: Option<String>,

    /// Comma-separated `host[:port]` list
    #[serde(default)]
    pub publish: Option<String>,
}
