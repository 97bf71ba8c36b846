//! Local package handling: selection, size limits and metadata.

pub mod archive;
pub mod locator;
pub mod metadata;

pub use archive::{FILTER_ENTRY, PROPERTIES_ENTRY, PackageArchive};
pub use locator::{PackageArtifact, PackageLocator, check_size, select_newest};
pub use metadata::{MetadataError, PackageProperties, parse_filter_roots, parse_properties};
