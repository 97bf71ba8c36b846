//! Single-entry extraction from package archives.
//!
//! Both `.zip` and `.jar` packages are zip containers, so one reader serves
//! both kinds.

use std::fs::File;
use std::path::{Path, PathBuf};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::DeployError;

/// Package descriptor carrying the logical name, group and version
pub const PROPERTIES_ENTRY: &str = "META-INF/vault/properties.xml";

/// Filter declaration listing the content roots the package manages
pub const FILTER_ENTRY: &str = "META-INF/vault/filter.xml";

/// An opened package archive
pub struct PackageArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl std::fmt::Debug for PackageArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageArchive")
            .field("path", &self.path)
            .field("entries", &self.archive.len())
            .finish()
    }
}

impl PackageArchive {
    pub fn open(path: &Path) -> Result<Self, DeployError> {
        let file = File::open(path).map_err(|e| DeployError::io(path, e))?;
        let archive = ZipArchive::new(file).map_err(|e| DeployError::Archive {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// Extract `entry` below `dest`, keeping its relative path.
    ///
    /// Returns `Ok(None)` when the archive has no such entry.
    pub fn extract(&mut self, entry: &str, dest: &Path) -> Result<Option<PathBuf>, DeployError> {
        let mut file = match self.archive.by_name(entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(DeployError::Archive {
                    path: self.path.clone(),
                    reason: format!("{entry}: {e}"),
                });
            }
        };

        // Reject entries that would escape the destination
        let relative = file.enclosed_name().ok_or_else(|| DeployError::Archive {
            path: self.path.clone(),
            reason: format!("{entry}: unsafe entry path"),
        })?;
        let outpath = dest.join(relative);

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DeployError::io(parent, e))?;
        }
        let mut outfile = File::create(&outpath).map_err(|e| DeployError::io(&outpath, e))?;
        std::io::copy(&mut file, &mut outfile).map_err(|e| DeployError::Archive {
            path: self.path.clone(),
            reason: format!("{entry}: {e}"),
        })?;

        Ok(Some(outpath))
    }
}
