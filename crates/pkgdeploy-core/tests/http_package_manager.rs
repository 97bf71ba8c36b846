//! The blocking HTTP client against a local package-manager stand-in.

mod support;

use std::io::Read;
use std::sync::mpsc;
use std::thread;

use pkgdeploy_core::config::PackageManagerSettings;
use pkgdeploy_core::package::PackageArtifact;
use pkgdeploy_core::remote::{HttpPackageManager, PackageManager};
use pkgdeploy_core::types::{ArchiveKind, DeploymentTarget, Role};
use tempfile::TempDir;
use tiny_http::{Method, Response, Server};

#[derive(Debug)]
struct Captured {
    method: Method,
    url: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: String,
}

/// Serve `replies` in order, then stop. Each request is sent back on the channel.
fn serve(replies: Vec<(u16, &'static str)>) -> (u16, mpsc::Receiver<Captured>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in replies {
            let mut request = server.recv().unwrap();
            let header = |name: &'static str| {
                request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv(name))
                    .map(|h| h.value.as_str().to_string())
            };
            let authorization = header("Authorization");
            let content_type = header("Content-Type");
            let mut payload = Vec::new();
            request.as_reader().read_to_end(&mut payload).unwrap();
            tx.send(Captured {
                method: request.method().clone(),
                url: request.url().to_string(),
                authorization,
                content_type,
                body: String::from_utf8_lossy(&payload).into_owned(),
            })
            .unwrap();
            request
                .respond(Response::from_string(body).with_status_code(status))
                .unwrap();
        }
    });

    (port, rx)
}

fn manager_settings() -> PackageManagerSettings {
    let temp = TempDir::new().unwrap();
    support::settings(temp.path(), temp.path(), "")
        .package_manager
        .clone()
}

#[test]
fn listing_is_fetched_with_basic_auth() {
    let (port, rx) = serve(vec![(200, "<crx><packages/></crx>")]);
    let manager = HttpPackageManager::new(&manager_settings()).unwrap();
    let target = DeploymentTarget::new("127.0.0.1", port, Role::Author);

    let response = manager.list_packages(&target).unwrap();
    assert_eq!(response.status, 200);
    assert!(response.body.contains("<packages/>"));

    let seen = rx.recv().unwrap();
    assert_eq!(seen.method, Method::Get);
    assert_eq!(seen.url, "/crx/packmgr/service.jsp?cmd=ls");
    // admin:admin
    assert_eq!(seen.authorization.as_deref(), Some("Basic YWRtaW46YWRtaW4="));
}

#[test]
fn upload_sends_multipart_without_install() {
    let (port, rx) = serve(vec![(200, support::OK_JSON)]);
    let manager = HttpPackageManager::new(&manager_settings()).unwrap();
    let target = DeploymentTarget::new("127.0.0.1", port, Role::Publish);

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("site-content-1.0.zip");
    support::write_package(&path, "site-content", "g", "1.0", &["/content/site"]);
    let artifact = PackageArtifact {
        size_bytes: std::fs::metadata(&path).unwrap().len(),
        path,
        name: "site-content".to_string(),
        group: Some("g".to_string()),
        version: Some("1.0".to_string()),
        filter_roots: vec!["/content/site".to_string()],
        kind: ArchiveKind::Zip,
    };

    let response = manager.upload(&target, &artifact).unwrap();
    assert!(response.is_success(&manager_settings().success_markers));

    let seen = rx.recv().unwrap();
    assert_eq!(seen.method, Method::Post);
    assert_eq!(seen.url, "/crx/packmgr/service.jsp");
    assert!(
        seen.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("multipart/form-data"))
    );
    assert!(seen.body.contains("name=\"install\"\r\n\r\nfalse"));
    assert!(seen.body.contains("name=\"force\"\r\n\r\ntrue"));
    assert!(seen.body.contains("filename=\"site-content-1.0.zip\""));
}

#[test]
fn install_posts_to_prefixed_repository_path() {
    let (port, rx) = serve(vec![(200, support::FAIL_JSON)]);
    let manager = HttpPackageManager::new(&manager_settings()).unwrap();
    let target = DeploymentTarget::new("127.0.0.1", port, Role::Author);

    let response = manager
        .install(&target, "/etc/packages/g/site-content-1.0.zip")
        .unwrap();
    // Transport succeeded; the body carries the refusal
    assert_eq!(response.status, 200);
    assert!(!response.is_success(&manager_settings().success_markers));

    let seen = rx.recv().unwrap();
    assert_eq!(seen.method, Method::Post);
    assert_eq!(
        seen.url,
        "/crx/packmgr/service/.json/etc/packages/g/site-content-1.0.zip"
    );
    assert!(seen.body.contains("cmd=install"));
    assert!(seen.body.contains("recursive=true"));
    assert!(seen.body.contains("force=true"));
}

#[test]
fn unreachable_target_is_an_error() {
    // Bind and drop to get a port nothing listens on
    let port = {
        let server = Server::http("127.0.0.1:0").unwrap();
        server.server_addr().to_ip().unwrap().port()
    };
    let manager = HttpPackageManager::new(&manager_settings()).unwrap();
    let target = DeploymentTarget::new("127.0.0.1", port, Role::Author);

    let err = manager.list_packages(&target).unwrap_err();
    assert!(format!("{err:#}").contains("127.0.0.1"), "{err:#}");
}
