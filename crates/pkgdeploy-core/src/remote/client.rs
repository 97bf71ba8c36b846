//! Package-manager HTTP service.
//!
//! [`PackageManager`] is the seam between the orchestrator and the network;
//! [`HttpPackageManager`] is the blocking basic-auth implementation.

use anyhow::Context;
use reqwest::blocking::{Client, RequestBuilder, multipart::Form};
use url::Url;

use crate::config::PackageManagerSettings;
use crate::package::PackageArtifact;
use crate::types::DeploymentTarget;

/// Status and body of a package-manager call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_http_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 2xx status and at least one success marker in the body.
    pub fn is_success(&self, markers: &[String]) -> bool {
        self.is_http_success() && markers.iter().any(|m| self.body.contains(m.as_str()))
    }

    /// Short description for error messages.
    pub fn summary(&self) -> String {
        const MAX: usize = 200;
        let body = self.body.trim();
        let body = match body.char_indices().nth(MAX) {
            Some((idx, _)) => format!("{}...", &body[..idx]),
            None => body.to_string(),
        };
        format!("HTTP {}: {}", self.status, body)
    }
}

/// Operations the orchestrator needs from a target's package manager
pub trait PackageManager {
    /// Fetch the installed-package listing document.
    fn list_packages(&self, target: &DeploymentTarget) -> anyhow::Result<RemoteResponse>;

    /// Upload the artifact without installing it.
    fn upload(
        &self,
        target: &DeploymentTarget,
        artifact: &PackageArtifact,
    ) -> anyhow::Result<RemoteResponse>;

    /// Install an uploaded package, recursively and overwriting existing content.
    fn install(
        &self,
        target: &DeploymentTarget,
        install_path: &str,
    ) -> anyhow::Result<RemoteResponse>;
}

/// Blocking HTTP client with basic auth and a per-request timeout
#[derive(Debug)]
pub struct HttpPackageManager {
    client: Client,
    settings: PackageManagerSettings,
}

impl HttpPackageManager {
    pub fn new(settings: &PackageManagerSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("pkgdeploy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    /// Absolute URL for `path` on `target`.
    pub fn endpoint(target: &DeploymentTarget, path: &str) -> anyhow::Result<Url> {
        let base = Url::parse(&target.base_url())
            .with_context(|| format!("Invalid target address: {target}"))?;
        base.join(path)
            .with_context(|| format!("Invalid package-manager path: {path}"))
    }

    fn send(&self, request: RequestBuilder, url: &Url) -> anyhow::Result<RemoteResponse> {
        let creds = &self.settings.credentials;
        let response = request
            .basic_auth(&creds.username, Some(&creds.password))
            .send()
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .with_context(|| format!("Failed to read response body from {url}"))?;

        Ok(RemoteResponse { status, body })
    }
}

impl PackageManager for HttpPackageManager {
    fn list_packages(&self, target: &DeploymentTarget) -> anyhow::Result<RemoteResponse> {
        let url = Self::endpoint(target, &self.settings.list_path)?;
        self.send(self.client.get(url.clone()), &url)
    }

    fn upload(
        &self,
        target: &DeploymentTarget,
        artifact: &PackageArtifact,
    ) -> anyhow::Result<RemoteResponse> {
        let url = Self::endpoint(target, &self.settings.upload_path)?;
        let form = Form::new()
            .text("name", artifact.name.clone())
            .text("force", "true")
            .text("install", "false")
            .file("file", &artifact.path)
            .with_context(|| format!("Failed to read {}", artifact.path.display()))?;

        self.send(self.client.post(url.clone()).multipart(form), &url)
    }

    fn install(
        &self,
        target: &DeploymentTarget,
        install_path: &str,
    ) -> anyhow::Result<RemoteResponse> {
        let path = format!("{}{}", self.settings.install_path_prefix, install_path);
        let url = Self::endpoint(target, &path)?;
        let params = [("cmd", "install"), ("recursive", "true"), ("force", "true")];

        self.send(self.client.post(url.clone()).form(&params), &url)
    }
}
