//! Remote package discovery.
//!
//! The listing is parsed as XML (`<package>` elements with `<group>`,
//! `<name>` and `<version>` children). When the document is not well formed,
//! a line scan looks for the `<name>` line and takes the nearest group and
//! version lines within [`WINDOW_LINES`] on either side.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::DeploymentTarget;

use super::client::PackageManager;

/// Lines inspected on each side of the name line by the fallback scan
pub const WINDOW_LINES: usize = 5;

/// Where a package lives, or will live, on a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemotePackageLocation {
    /// Group reported by the listing
    pub group: Option<String>,
    /// Version reported by the listing
    pub version: Option<String>,
    /// `<package base>/<group>/`
    pub install_dir: String,
    /// `<name>-<version>.zip` or `<name>.zip`
    pub file_name: String,
}

impl RemotePackageLocation {
    /// Build a location, using `requested_group` when the listing had no group.
    pub fn new(
        package_base_path: &str,
        logical_name: &str,
        group: Option<String>,
        version: Option<String>,
        requested_group: &str,
    ) -> Self {
        let base = package_base_path.trim_end_matches('/');
        let install_dir = format!("{base}/{}/", group.as_deref().unwrap_or(requested_group));
        let file_name = match version.as_deref() {
            Some(v) => format!("{logical_name}-{v}.zip"),
            None => format!("{logical_name}.zip"),
        };
        Self {
            group,
            version,
            install_dir,
            file_name,
        }
    }

    /// Best-guess location built only from the requested group.
    pub fn fallback(package_base_path: &str, logical_name: &str, requested_group: &str) -> Self {
        Self::new(package_base_path, logical_name, None, None, requested_group)
    }

    /// Repository path of the package file.
    pub fn install_path(&self) -> String {
        format!("{}{}", self.install_dir, self.file_name)
    }
}

/// One `<package>` entry of a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListedPackage {
    pub name: String,
    pub group: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Group,
    Name,
    Version,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"group" => Some(Field::Group),
            b"name" => Some(Field::Name),
            b"version" => Some(Field::Version),
            _ => None,
        }
    }
}

/// Parse every `<package>` element of a listing document.
pub fn parse_listing(xml: &str) -> Result<Vec<ListedPackage>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut packages = Vec::new();
    let mut current: Option<ListedPackage> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let tag = e.name();
                if tag.as_ref() == b"package" {
                    current = Some(ListedPackage::default());
                } else if current.is_some() {
                    field = Field::from_tag(tag.as_ref());
                    text.clear();
                }
            }
            Event::Text(t) if field.is_some() => text.push_str(&t.unescape()?),
            Event::End(e) => {
                let tag = e.name();
                if tag.as_ref() == b"package" {
                    if let Some(pkg) = current.take() {
                        if !pkg.name.is_empty() {
                            packages.push(pkg);
                        }
                    }
                } else if let (Some(pkg), Some(f)) = (current.as_mut(), field) {
                    if Field::from_tag(tag.as_ref()) == Some(f) {
                        let value = text.trim().to_string();
                        match f {
                            Field::Name => pkg.name = value,
                            Field::Group if !value.is_empty() => pkg.group = Some(value),
                            Field::Version if !value.is_empty() => pkg.version = Some(value),
                            _ => {}
                        }
                        field = None;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(packages)
}

/// Proximity scan used when the listing cannot be parsed as XML.
pub fn scan_window(listing: &str, logical_name: &str, window: usize) -> Option<ListedPackage> {
    let lines: Vec<&str> = listing.lines().collect();
    let idx = lines
        .iter()
        .position(|line| tag_value(line, "name") == Some(logical_name))?;

    let nearest = |tag: &str| -> Option<String> {
        (1..=window).find_map(|d| {
            let before = idx.checked_sub(d).and_then(|i| lines.get(i));
            let after = lines.get(idx + d);
            before
                .and_then(|l| tag_value(l, tag))
                .or_else(|| after.and_then(|l| tag_value(l, tag)))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
    };

    Some(ListedPackage {
        name: logical_name.to_string(),
        group: nearest("group"),
        version: nearest("version"),
    })
}

/// Text between `<tag>` and `</tag>` on a single line.
fn tag_value<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = line.find(&open)? + open.len();
    let end = line[start..].find(&close)? + start;
    Some(line[start..end].trim())
}

/// Find the first listing entry named `logical_name`.
pub fn find_in_listing(listing: &str, logical_name: &str) -> Option<ListedPackage> {
    match parse_listing(listing) {
        Ok(packages) => packages.into_iter().find(|p| p.name == logical_name),
        Err(e) => {
            warn!("package listing is not well-formed XML ({e}), scanning by line proximity");
            scan_window(listing, logical_name, WINDOW_LINES)
        }
    }
}

/// Query `target` for `logical_name` and compute its install location.
///
/// Returns `Ok(None)` when the listing has no such package.
pub fn discover(
    manager: &dyn PackageManager,
    target: &DeploymentTarget,
    logical_name: &str,
    package_base_path: &str,
    requested_group: &str,
) -> anyhow::Result<Option<RemotePackageLocation>> {
    let response = manager.list_packages(target)?;
    if !response.is_http_success() {
        anyhow::bail!("package listing rejected: {}", response.summary());
    }

    let found = find_in_listing(&response.body, logical_name).map(|pkg| {
        RemotePackageLocation::new(
            package_base_path,
            logical_name,
            pkg.group,
            pkg.version,
            requested_group,
        )
    });

    if let Some(location) = &found {
        debug!(
            host = %target,
            package = logical_name,
            path = %location.install_path(),
            "discovered remote package"
        );
    }
    Ok(found)
}

/// Discovery result with the fallback decision already applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLookup {
    pub location: RemotePackageLocation,
    /// The listing did not yield the package and a best guess was used
    pub fallback_used: bool,
}

/// Discover the install location, falling back to the requested group when
/// the listing fails or lacks the package. Never fails.
pub fn lookup_install_location(
    manager: &dyn PackageManager,
    target: &DeploymentTarget,
    logical_name: &str,
    package_base_path: &str,
    requested_group: &str,
) -> RemoteLookup {
    let reason = match discover(
        manager,
        target,
        logical_name,
        package_base_path,
        requested_group,
    ) {
        Ok(Some(location)) => {
            return RemoteLookup {
                location,
                fallback_used: false,
            };
        }
        Ok(None) => "package not present in listing".to_string(),
        Err(e) => format!("{e:#}"),
    };

    let location = RemotePackageLocation::fallback(package_base_path, logical_name, requested_group);
    warn!(
        host = %target,
        package = logical_name,
        path = %location.install_path(),
        "remote discovery ambiguous ({reason}), using requested group"
    );
    RemoteLookup {
        location,
        fallback_used: true,
    }
}
