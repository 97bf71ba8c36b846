//! Locate the package artifact to deploy and read its metadata.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PackageSettings;
use crate::error::DeployError;
use crate::types::ArchiveKind;

use super::archive::{FILTER_ENTRY, PROPERTIES_ENTRY, PackageArchive};
use super::metadata::{PackageProperties, parse_filter_roots, parse_properties};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// The package chosen for a run. Immutable once located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageArtifact {
    pub path: PathBuf,
    /// Logical name from the descriptor, or the requested name prefix
    pub name: String,
    /// Group declared by the descriptor, if any
    pub group: Option<String>,
    /// Version declared by the descriptor, if any
    pub version: Option<String>,
    /// Declared filter roots in document order
    pub filter_roots: Vec<String>,
    pub size_bytes: u64,
    pub kind: ArchiveKind,
}

impl PackageArtifact {
    /// File name used for the multipart upload.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.zip", self.name))
    }

    /// Size in whole megabytes, truncated.
    pub fn size_mb(&self) -> u64 {
        self.size_bytes / BYTES_PER_MB
    }
}

/// Finds and inspects package archives
#[derive(Debug)]
pub struct PackageLocator<'a> {
    settings: &'a PackageSettings,
}

impl<'a> PackageLocator<'a> {
    pub fn new(settings: &'a PackageSettings) -> Self {
        Self { settings }
    }

    /// Locate the artifact for `path`, which is either the package file itself
    /// or a directory searched for the newest file starting with `name_prefix`.
    ///
    /// Metadata entries are extracted below `workdir`; the caller owns and
    /// removes it.
    pub fn locate(
        &self,
        path: &Path,
        name_prefix: &str,
        workdir: &Path,
    ) -> Result<PackageArtifact, DeployError> {
        let file = if path.is_dir() {
            select_newest(path, name_prefix)?
        } else if path.is_file() {
            path.to_path_buf()
        } else {
            return Err(DeployError::NotFound {
                dir: path.to_path_buf(),
                prefix: name_prefix.to_string(),
            });
        };

        let kind = file
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ArchiveKind::from_extension)
            .ok_or_else(|| DeployError::UnsupportedType { path: file.clone() })?;

        let size_bytes = std::fs::metadata(&file)
            .map_err(|e| DeployError::io(&file, e))?
            .len();
        check_size(&file, size_bytes, self.settings.max_size_mb)?;

        let mut archive = PackageArchive::open(&file)?;
        let properties = read_properties(&mut archive, workdir);
        let name = properties.name.clone().unwrap_or_else(|| {
            debug!(
                package = %file.display(),
                "no name in package descriptor, using prefix '{name_prefix}'"
            );
            name_prefix.to_string()
        });
        let filter_roots = read_filter_roots(&mut archive, &file, workdir)?;

        info!(
            package = %file.display(),
            name = %name,
            size_bytes,
            roots = ?filter_roots,
            "located package"
        );

        Ok(PackageArtifact {
            path: file,
            name,
            group: properties.group,
            version: properties.version,
            filter_roots,
            size_bytes,
            kind,
        })
    }
}

/// Pick the most recently modified file in `dir` whose name starts with
/// `prefix`. Equal modification times keep directory listing order.
pub fn select_newest(dir: &Path, prefix: &str) -> Result<PathBuf, DeployError> {
    let entries = std::fs::read_dir(dir).map_err(|e| DeployError::io(dir, e))?;

    let mut candidates: Vec<(PathBuf, SystemTime)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DeployError::io(dir, e))?;
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(prefix) {
            continue;
        }
        let metadata = entry.metadata().map_err(|e| DeployError::io(entry.path(), e))?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata
            .modified()
            .map_err(|e| DeployError::io(entry.path(), e))?;
        candidates.push((entry.path(), modified));
    }

    // Stable sort, newest first
    candidates.sort_by(|a, b| b.1.cmp(&a.1));

    candidates
        .into_iter()
        .next()
        .map(|(path, _)| path)
        .ok_or_else(|| DeployError::NotFound {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
        })
}

/// Reject packages whose whole-megabyte size is at or above the limit.
/// No limit configured means no check.
pub fn check_size(path: &Path, size_bytes: u64, max_mb: Option<u64>) -> Result<(), DeployError> {
    let Some(max_mb) = max_mb else {
        return Ok(());
    };
    let size_mb = size_bytes / BYTES_PER_MB;
    if size_mb >= max_mb {
        return Err(DeployError::SizeExceeded {
            path: path.to_path_buf(),
            size_mb,
            max_mb,
        });
    }
    Ok(())
}

fn read_properties(archive: &mut PackageArchive, workdir: &Path) -> PackageProperties {
    let extracted = match archive.extract(PROPERTIES_ENTRY, workdir) {
        Ok(Some(path)) => path,
        Ok(None) => return PackageProperties::default(),
        Err(e) => {
            warn!("cannot extract {PROPERTIES_ENTRY}: {e}");
            return PackageProperties::default();
        }
    };
    let parsed = std::fs::read_to_string(&extracted)
        .map_err(|e| e.to_string())
        .and_then(|content| parse_properties(&content).map_err(|e| e.to_string()));
    match parsed {
        Ok(props) => props,
        Err(e) => {
            warn!("ignoring unreadable {PROPERTIES_ENTRY}: {e}");
            PackageProperties::default()
        }
    }
}

fn read_filter_roots(
    archive: &mut PackageArchive,
    file: &Path,
    workdir: &Path,
) -> Result<Vec<String>, DeployError> {
    let Some(extracted) = archive.extract(FILTER_ENTRY, workdir)? else {
        warn!(package = %file.display(), "package declares no {FILTER_ENTRY}");
        return Ok(Vec::new());
    };
    let content =
        std::fs::read_to_string(&extracted).map_err(|e| DeployError::io(&extracted, e))?;
    parse_filter_roots(&content).map_err(|e| DeployError::Archive {
        path: file.to_path_buf(),
        reason: format!("{FILTER_ENTRY}: {e}"),
    })
}
