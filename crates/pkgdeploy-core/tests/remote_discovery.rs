//! Tests for discovering install locations through the package listing.

mod support;

use pkgdeploy_core::remote::{RemoteResponse, discover, lookup_install_location};
use pkgdeploy_core::types::{DeploymentTarget, Role};
use support::{Call, FakeManager};

fn target() -> DeploymentTarget {
    DeploymentTarget::new("author1", 4502, Role::Author)
}

#[test]
fn listed_package_uses_listing_group_and_version() {
    let listing = support::listing(&[
        ("adobe/granite", "platform", "1.0"),
        ("site_group", "site-content", "2.3.1"),
    ]);
    let fake = FakeManager::with_listing(&listing);

    let location = discover(&fake, &target(), "site-content", "/etc/packages", "requested")
        .unwrap()
        .unwrap();
    assert_eq!(
        location.install_path(),
        "/etc/packages/site_group/site-content-2.3.1.zip"
    );
    assert_eq!(fake.calls(), [Call::List("author1:4502".to_string())]);
}

#[test]
fn absent_package_is_none() {
    let fake = FakeManager::with_listing(&support::listing(&[("g", "other", "1")]));
    let found = discover(&fake, &target(), "site-content", "/etc/packages", "g").unwrap();
    assert!(found.is_none());
}

#[test]
fn absent_package_falls_back_to_requested_group() {
    let fake = FakeManager::with_listing(&support::listing(&[]));
    let lookup = lookup_install_location(&fake, &target(), "site-content", "/etc/packages", "req");

    assert!(lookup.fallback_used);
    assert_eq!(
        lookup.location.install_path(),
        "/etc/packages/req/site-content.zip"
    );
}

#[test]
fn listing_failure_falls_back_without_error() {
    let fake = FakeManager::new();
    let lookup = lookup_install_location(&fake, &target(), "site-content", "/etc/packages", "req");
    assert!(lookup.fallback_used);
    assert_eq!(lookup.location.group, None);
}

#[test]
fn rejected_listing_is_an_error_for_discover() {
    struct Denied;
    impl pkgdeploy_core::remote::PackageManager for Denied {
        fn list_packages(&self, _: &DeploymentTarget) -> anyhow::Result<RemoteResponse> {
            Ok(RemoteResponse::new(401, "Unauthorized"))
        }
        fn upload(
            &self,
            _: &DeploymentTarget,
            _: &pkgdeploy_core::package::PackageArtifact,
        ) -> anyhow::Result<RemoteResponse> {
            unreachable!()
        }
        fn install(&self, _: &DeploymentTarget, _: &str) -> anyhow::Result<RemoteResponse> {
            unreachable!()
        }
    }

    let err = discover(&Denied, &target(), "site-content", "/etc/packages", "g").unwrap_err();
    assert!(err.to_string().contains("401"), "{err}");

    let lookup = lookup_install_location(&Denied, &target(), "site-content", "/etc/packages", "g");
    assert!(lookup.fallback_used);
}

#[test]
fn malformed_listing_is_scanned_by_proximity() {
    let broken = "<packages>\n<package>\n<group>scanned</group>\n<name>site-content</name>\n<version>4.0</version>\n<package>\n</oops>";
    let fake = FakeManager::with_listing(broken);

    let lookup = lookup_install_location(&fake, &target(), "site-content", "/etc/packages", "req");
    assert!(!lookup.fallback_used);
    assert_eq!(
        lookup.location.install_path(),
        "/etc/packages/scanned/site-content-4.0.zip"
    );
}
