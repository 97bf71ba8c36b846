//! Error taxonomy for a deployment run.
//!
//! Every variant is fatal to the run. The only non-fatal condition, a remote
//! discovery fallback, is reported through [`crate::remote::RemoteLookup`]
//! instead of an error.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a deployment run
#[derive(Debug, Error)]
pub enum DeployError {
    /// Missing or invalid configuration, build disallowed, or no targets
    #[error("configuration error: {0}")]
    Config(String),

    /// No package file matches the requested name prefix
    #[error("no package starting with '{prefix}' found in {}", dir.display())]
    NotFound {
        /// Directory that was searched
        dir: PathBuf,
        /// Requested name prefix
        prefix: String,
    },

    /// Package file extension is neither `.zip` nor `.jar`
    #[error("unsupported package type: {}", path.display())]
    UnsupportedType {
        /// Offending package file
        path: PathBuf,
    },

    /// Package is at or above the configured size limit
    #[error("package {} is {size_mb} MB, limit is below {max_mb} MB", path.display())]
    SizeExceeded {
        /// Offending package file
        path: PathBuf,
        /// Package size in whole megabytes
        size_mb: u64,
        /// Configured maximum in megabytes
        max_mb: u64,
    },

    /// Declared filter roots are not covered by the approved reference list
    #[error("filter check failed for {group}/{project}: {detail}")]
    FilterMismatch {
        /// Requested package group
        group: String,
        /// Requested project
        project: String,
        /// Unmatched roots or the reason the reference list was unusable
        detail: String,
    },

    /// Upload to a target failed
    #[error("upload to {target} failed: {reason}")]
    Upload {
        /// Target in `host:port` form
        target: String,
        /// Transport error or rejected response
        reason: String,
        /// Targets finished before this failure (upload only in debug mode)
        completed: Vec<String>,
    },

    /// Install on a target failed or returned no success marker
    #[error("install on {target} failed: {reason}")]
    Install {
        /// Target in `host:port` form
        target: String,
        /// Transport error or rejected response
        reason: String,
        /// Targets that were fully deployed before this failure
        completed: Vec<String>,
    },

    /// Package archive could not be read
    #[error("cannot read package archive {}: {reason}", path.display())]
    Archive {
        /// Offending archive
        path: PathBuf,
        /// Underlying archive or metadata error
        reason: String,
    },

    /// Local filesystem failure
    #[error("{}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::NotFound { .. }
            | Self::UnsupportedType { .. }
            | Self::SizeExceeded { .. }
            | Self::Archive { .. }
            | Self::Io { .. } => 3,
            Self::FilterMismatch { .. } => 4,
            Self::Upload { .. } | Self::Install { .. } => 5,
        }
    }

    /// Whether this failure needs a content-scope review rather than an
    /// infrastructure fix.
    pub fn is_filter_mismatch(&self) -> bool {
        matches!(self, Self::FilterMismatch { .. })
    }

    /// Targets deployed before a per-target failure.
    pub fn completed_targets(&self) -> &[String] {
        match self {
            Self::Upload { completed, .. } | Self::Install { completed, .. } => completed,
            _ => &[],
        }
    }
}
