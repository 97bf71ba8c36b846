//! Pkgdeploy Core Library
//!
//! Decides which repository servers receive a content package, gates the
//! package on its declared filter roots, and drives upload and install
//! against each server's package manager.

pub mod config;
pub mod deploy;
pub mod error;
pub mod filter;
pub mod package;
pub mod remote;
pub mod types;

pub use error::DeployError;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{Resolution, Settings, load_settings, resolve};

    // Package
    pub use crate::package::{PackageArtifact, PackageLocator};

    // Filter
    pub use crate::filter::{FilterReport, ReferenceFilterSet};

    // Remote
    pub use crate::remote::{HttpPackageManager, PackageManager, RemotePackageLocation};

    // Deploy
    pub use crate::deploy::{DeploymentReport, DeploymentRequest, Deployer};

    // Types
    pub use crate::error::DeployError;
    pub use crate::types::{ArchiveKind, DeploymentTarget, InstanceRole, Role};
}
