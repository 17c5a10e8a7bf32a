// hinst/src/cli/summary.rs
// Human-readable end-of-run output.

use std::path::Path;

use colored::Colorize;
use hinst_common::model::{PathConfigLocation, PathOutcome};
use hinst_common::pipeline::InstallReport;

pub fn print_report(report: &InstallReport, bin_name: &str) {
    let verb = if report.replaced_existing {
        "Replaced"
    } else {
        "Installed"
    };
    println!(
        "{}{} {} {} ({})",
        "==> ".bold().blue(),
        verb.bold(),
        bin_name.cyan(),
        report.tag.green(),
        report.platform
    );
    println!("    {} {}", "Location:".bold(), report.installed_path.display());
    println!("    {} {}", "SHA-256:".bold(), report.sha256.dimmed());

    let install_dir = report
        .installed_path
        .parent()
        .unwrap_or_else(|| Path::new(""));
    if let Some(note) = path_note(&report.path_outcome, install_dir) {
        println!("{}{}", "==> ".bold().blue(), note);
    }
    if let PathOutcome::ManualActionRequired { instructions } = &report.path_outcome {
        println!("\n{} {}", "Action Required:".yellow().bold(), instructions);
    }

    for warning in &report.warnings {
        eprintln!("{} {}", "Warning:".yellow(), warning);
    }
}

/// One-line note on what happened to PATH. Manual instructions and failures
/// are reported separately.
fn path_note(outcome: &PathOutcome, install_dir: &Path) -> Option<String> {
    match outcome {
        PathOutcome::AlreadyOnPath => {
            Some(format!("{} is already on PATH.", install_dir.display()))
        }
        PathOutcome::AlreadyConfigured(_) => Some(
            "PATH is already configured; open a new shell if the command is not found."
                .to_string(),
        ),
        PathOutcome::Updated(configuration) => {
            let place = match &configuration.location {
                PathConfigLocation::ShellProfile { profile, .. } => {
                    profile.display().to_string()
                }
                PathConfigLocation::UserEnvironment => "your user PATH".to_string(),
            };
            Some(format!(
                "Added {} to {}. Open a new terminal to pick it up.",
                configuration.install_dir.display().to_string().cyan(),
                place
            ))
        }
        PathOutcome::ManualActionRequired { .. } | PathOutcome::Failed => None,
    }
}
