//! Config path resolution helpers.

use std::path::{Path, PathBuf};

/// Default location of deploy.toml: `<config dir>/pkgdeploy/deploy.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pkgdeploy").join("deploy.toml"))
}

/// Location of the reference filter list for a (group, project) pair.
pub fn reference_filter_path(root: &Path, group: &str, project: &str) -> PathBuf {
    root.join(group).join(project).join("filter.txt")
}
