//! Package-manager service access and remote package discovery.

pub mod client;
pub mod discovery;

pub use client::{HttpPackageManager, PackageManager, RemoteResponse};
pub use discovery::{
    ListedPackage, RemoteLookup, RemotePackageLocation, WINDOW_LINES, discover, find_in_listing,
    lookup_install_location, parse_listing, scan_window,
};
