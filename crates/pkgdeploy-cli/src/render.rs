//! Human-readable output for deployment reports and failures.

use console::style;
use pkgdeploy_core::DeployError;
use pkgdeploy_core::deploy::{DeploymentReport, InstallStatus};

pub fn print_report(report: &DeploymentReport) {
    let pkg = &report.package;
    println!(
        "Package: {} ({}, {} MB)",
        pkg.name,
        pkg.path.display(),
        pkg.size_mb()
    );
    println!(
        "Environment: {}  Pool: {}  Role: {}",
        report.environment, report.pool, report.role
    );

    match &report.filter {
        Some(filter) if filter.roots.is_empty() => {
            println!("Filters: none declared (nothing to validate)");
        }
        Some(filter) => {
            println!("Filters: {} root(s) approved", filter.roots.len());
            for root in &filter.roots {
                if let Some(line) = &root.matched_by {
                    println!("  {}  <- {}", root.root, line);
                }
            }
        }
        None => println!("Filters: validation skipped (debug mode)"),
    }

    println!();
    println!("{:<40} {:<8} {:<14} PATH", "TARGET", "ROLE", "STATUS");
    println!("{}", "-".repeat(90));
    for outcome in &report.targets {
        let status = match outcome.status {
            InstallStatus::Installed => style(format!("{:<14}", "installed")).green(),
            InstallStatus::WouldInstall => style(format!("{:<14}", "would install")).yellow(),
        };
        let note = if outcome.discovery_fallback {
            " (guessed)"
        } else {
            ""
        };
        println!(
            "{:<40} {:<8} {} {}{}",
            outcome.target.to_string(),
            outcome.target.role.as_str(),
            status,
            outcome.install_path,
            note
        );
    }
    println!();

    let elapsed = report.finished_at - report.started_at;
    if report.debug {
        println!(
            "Debug run finished: {} upload(s), no installs issued ({:.1}s)",
            report.targets.len(),
            elapsed.num_milliseconds() as f64 / 1000.0
        );
    } else {
        println!(
            "Deployed to {} target(s) ({:.1}s)",
            report.installed_count(),
            elapsed.num_milliseconds() as f64 / 1000.0
        );
    }
    if report.fallback_count() > 0 {
        println!(
            "{} {} install path(s) were guessed from the requested group",
            style("Warning:").yellow().bold(),
            report.fallback_count()
        );
    }
}

/// `debug` runs only upload, so completed targets hold an uploaded package
/// that was never installed.
pub fn print_failure(err: &DeployError, debug: bool) {
    if err.is_filter_mismatch() {
        eprintln!("{} {err}", style("FILTER MISMATCH:").for_stderr().red().bold());
        eprintln!("The package declares content outside its approved scope.");
        eprintln!("No server was touched. Review the package filters or the approved list.");
        return;
    }

    eprintln!("{} {err}", style("error:").for_stderr().red().bold());
    if let Some(note) = partial_note(err.completed_targets(), debug) {
        eprintln!(
            "{} {note}",
            style("Partial deployment:").for_stderr().yellow().bold()
        );
    }
}

fn partial_note(completed: &[String], debug: bool) -> Option<String> {
    if completed.is_empty() {
        return None;
    }
    let hosts = completed.join(", ");
    Some(if debug {
        format!("uploaded but not installed on {hosts} (debug mode).")
    } else {
        format!("already installed on {hosts}. Reconcile manually.")
    })
}
