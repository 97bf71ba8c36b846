//! Shared core types used across configuration, packaging and deployment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Class of repository server a target belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Authoring instance
    Author,
    /// Publishing instance
    Publish,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Author => "author",
            Role::Publish => "publish",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instance role requested for a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceRole {
    Author,
    Publish,
    /// Author list followed by publish list
    Both,
}

impl InstanceRole {
    /// Concrete roles in deployment order.
    pub fn roles(self) -> &'static [Role] {
        match self {
            InstanceRole::Author => &[Role::Author],
            InstanceRole::Publish => &[Role::Publish],
            InstanceRole::Both => &[Role::Author, Role::Publish],
        }
    }
}

impl FromStr for InstanceRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "author" => Ok(InstanceRole::Author),
            "publish" => Ok(InstanceRole::Publish),
            "both" => Ok(InstanceRole::Both),
            other => Err(format!(
                "unknown instance role '{other}' (expected author, publish or both)"
            )),
        }
    }
}

impl fmt::Display for InstanceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstanceRole::Author => "author",
            InstanceRole::Publish => "publish",
            InstanceRole::Both => "both",
        };
        f.write_str(s)
    }
}

/// One package-manager endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    pub host: String,
    pub port: u16,
    pub role: Role,
}

impl DeploymentTarget {
    pub fn new(host: impl Into<String>, port: u16, role: Role) -> Self {
        Self {
            host: host.into(),
            port,
            role,
        }
    }

    /// Base URL of the target's HTTP service.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Archive flavour, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    Zip,
    Jar,
}

impl ArchiveKind {
    /// Map a file extension to an archive kind (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "zip" => Some(ArchiveKind::Zip),
            "jar" => Some(ArchiveKind::Jar),
            _ => None,
        }
    }
}
