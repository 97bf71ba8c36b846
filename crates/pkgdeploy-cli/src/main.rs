//! Pkgdeploy - content-package deployment to repository servers
//!
//! Usage:
//!   pkgdeploy <package> <name-prefix> <group> <project> <environment> <role> <pool> [--debug]

mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pkgdeploy_core::DeployError;
use pkgdeploy_core::config::{default_config_path, load_settings};
use pkgdeploy_core::deploy::{DeploymentRequest, Deployer};
use pkgdeploy_core::remote::HttpPackageManager;
use pkgdeploy_core::types::InstanceRole;

#[derive(Parser, Debug)]
#[command(name = "pkgdeploy", version)]
#[command(about = "Validate and deploy a content package to repository servers", long_about = None)]
struct Cli {
    /// Package file, or directory holding built packages
    package: PathBuf,

    /// Package file-name prefix (also the fallback package name)
    name_prefix: String,

    /// Package group
    group: String,

    /// Project whose approved filter list applies
    project: String,

    /// Target environment (e.g. dev, qa, prod)
    environment: String,

    /// Instance role: author, publish or both
    role: InstanceRole,

    /// Server pool within the environment
    pool: String,

    /// Skip filter validation and log installs instead of issuing them
    #[arg(long, short)]
    debug: bool,

    /// Path to deploy.toml
    #[arg(long, short, env = "PKGDEPLOY_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "text")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum, Default, Debug)]
enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Machine-readable JSON report
    Json,
}

/// Exit status for usage errors and `--help`
const USAGE_EXIT: u8 = 1;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(USAGE_EXIT),
            };
        }
    };

    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = match e.downcast_ref::<DeployError>() {
                Some(deploy) => {
                    render::print_failure(deploy, cli.debug);
                    deploy.exit_code()
                }
                None => {
                    error!("{e:#}");
                    1
                }
            };
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "pkgdeploy_core=debug,pkgdeploy=debug,info"
    } else {
        "pkgdeploy_core=info,pkgdeploy=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
    };
    let settings = load_settings(&config_path)?;

    let manager = HttpPackageManager::new(&settings.package_manager)
        .context("Failed to set up package-manager client")?;

    let request = DeploymentRequest {
        package_path: cli.package.clone(),
        name_prefix: cli.name_prefix.clone(),
        group: cli.group.clone(),
        project: cli.project.clone(),
        environment: cli.environment.clone(),
        role: cli.role,
        pool: cli.pool.clone(),
        debug: cli.debug,
    };

    let report = Deployer::new(&settings, &manager).deploy(&request)?;

    match cli.format {
        OutputFormat::Text => render::print_report(&report),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        ),
    }
    Ok(())
}
