#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};

use pkgdeploy_core::config::{Settings, parse_settings_str};
use pkgdeploy_core::package::PackageArtifact;
use pkgdeploy_core::remote::{PackageManager, RemoteResponse};
use pkgdeploy_core::types::DeploymentTarget;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const OK_JSON: &str = r#"{"success":true,"msg":"ok"}"#;
pub const FAIL_JSON: &str = r#"{"success":false,"msg":"Package not installed"}"#;

/// Write a zip with the given `(entry, contents)` pairs.
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (name, contents) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

pub fn properties_xml(name: &str, group: &str, version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>
<!DOCTYPE properties SYSTEM "http://java.sun.com/dtd/properties.dtd">
<properties>
<entry key="name">{name}</entry>
<entry key="group">{group}</entry>
<entry key="version">{version}</entry>
</properties>"#
    )
}

pub fn filter_xml(roots: &[&str]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<workspaceFilter version=\"1.0\">\n");
    for root in roots {
        xml.push_str(&format!("    <filter root=\"{root}\"/>\n"));
    }
    xml.push_str("</workspaceFilter>\n");
    xml
}

/// A complete content package with descriptor and filter entries.
pub fn write_package(path: &Path, name: &str, group: &str, version: &str, roots: &[&str]) {
    write_zip(
        path,
        &[
            ("META-INF/vault/properties.xml", &properties_xml(name, group, version)),
            ("META-INF/vault/filter.xml", &filter_xml(roots)),
            ("jcr_root/.content.xml", "<jcr:root/>"),
        ],
    );
}

/// Write `root/<group>/<project>/filter.txt`.
pub fn write_reference(root: &Path, group: &str, project: &str, lines: &[&str]) -> PathBuf {
    let dir = root.join(group).join(project);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("filter.txt");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

/// Settings for a `dev` environment with token `d` and pool `kstl`.
pub fn settings(workspace: &Path, explode_dir: &Path, extra: &str) -> Settings {
    let content = format!(
        r#"
[package_manager]
credentials = "admin:admin"

[package]
explode_dir = "{explode}"
filter_reference_root = "{workspace}"

[environments.dev]
token = "d"
build_allowed = "true"

[environments.prod]
token = "p"
build_allowed = false

[servers.d.kstl]
author = "author1:4502,author2"
publish = "publish1"

[servers.p.kstl]
author = "prod-author"
publish = "prod-publish"
{extra}
"#,
        explode = explode_dir.display(),
        workspace = workspace.display(),
    );
    parse_settings_str(&content).unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Upload(String, String),
    Install(String, String),
}

/// Records every call and answers from scripted queues. Empty queues answer
/// with success.
#[derive(Default)]
pub struct FakeManager {
    pub calls: RefCell<Vec<Call>>,
    pub listing: RefCell<Option<String>>,
    pub uploads: RefCell<VecDeque<anyhow::Result<RemoteResponse>>>,
    pub installs: RefCell<VecDeque<anyhow::Result<RemoteResponse>>>,
}

impl FakeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(listing: &str) -> Self {
        let fake = Self::new();
        *fake.listing.borrow_mut() = Some(listing.to_string());
        fake
    }

    pub fn push_install(&self, response: anyhow::Result<RemoteResponse>) {
        self.installs.borrow_mut().push_back(response);
    }

    pub fn push_upload(&self, response: anyhow::Result<RemoteResponse>) {
        self.uploads.borrow_mut().push_back(response);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn install_calls(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Install(host, path) => Some((host, path)),
                _ => None,
            })
            .collect()
    }

    pub fn upload_hosts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Upload(host, _) => Some(host),
                _ => None,
            })
            .collect()
    }
}

impl PackageManager for FakeManager {
    fn list_packages(&self, target: &DeploymentTarget) -> anyhow::Result<RemoteResponse> {
        self.calls.borrow_mut().push(Call::List(target.to_string()));
        match self.listing.borrow().as_ref() {
            Some(body) => Ok(RemoteResponse::new(200, body.clone())),
            None => anyhow::bail!("connection refused"),
        }
    }

    fn upload(
        &self,
        target: &DeploymentTarget,
        artifact: &PackageArtifact,
    ) -> anyhow::Result<RemoteResponse> {
        self.calls
            .borrow_mut()
            .push(Call::Upload(target.to_string(), artifact.file_name()));
        self.uploads
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(RemoteResponse::new(200, OK_JSON)))
    }

    fn install(
        &self,
        target: &DeploymentTarget,
        install_path: &str,
    ) -> anyhow::Result<RemoteResponse> {
        self.calls
            .borrow_mut()
            .push(Call::Install(target.to_string(), install_path.to_string()));
        self.installs
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(RemoteResponse::new(200, OK_JSON)))
    }
}

pub fn listing(entries: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<crx version=\"1.4.1\">\n<response>\n<data>\n<packages>\n",
    );
    for (group, name, version) in entries {
        xml.push_str(&format!(
            "<package>\n<group>{group}</group>\n<name>{name}</name>\n<version>{version}</version>\n</package>\n"
        ));
    }
    xml.push_str("</packages>\n</data>\n<status code=\"200\">ok</status>\n</response>\n</crx>\n");
    xml
}
