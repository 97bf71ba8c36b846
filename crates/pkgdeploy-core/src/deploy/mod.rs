//! Deploy coordination: request, orchestration and report.

pub mod orchestrator;
pub mod report;
pub mod request;

pub use orchestrator::Deployer;
pub use report::{DeploymentReport, InstallStatus, TargetOutcome};
pub use request::DeploymentRequest;
