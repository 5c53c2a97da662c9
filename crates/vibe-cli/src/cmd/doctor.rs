use crate::cmd::Outcome;
use crate::output::print_json;
use clap::Args;
use std::path::Path;
use vibe_core::config::Config;
use vibe_core::doctor::{self, ChangeKind, CheckStatus, DoctorMode, HealthReport, StoreChange};
use vibe_core::process::ProcessRunner;

#[derive(Args)]
pub struct DoctorArgs {
    /// Drop stale records and adopt orphaned worktrees
    #[arg(long, conflicts_with = "dry_run")]
    pub repair: bool,

    /// Report only; do not touch the state file
    #[arg(long)]
    pub dry_run: bool,
}

impl DoctorArgs {
    fn mode(&self) -> DoctorMode {
        if self.repair {
            DoctorMode::Repair
        } else if self.dry_run {
            DoctorMode::DryRun
        } else {
            DoctorMode::Relabel
        }
    }
}

pub fn run(root: &Path, args: DoctorArgs, json: bool) -> anyhow::Result<Outcome> {
    // A broken config is one of the things doctor reports, so it must not
    // stop the run here.
    let runner = match Config::load(root) {
        Ok(config) => ProcessRunner::from_config(&config.process),
        Err(e) => {
            tracing::debug!(error = %e, "config unreadable; using default process settings");
            ProcessRunner::default()
        }
    };

    let report = doctor::reconcile(root, &runner, args.mode())?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    Ok(match report.exit_code() {
        0 => Outcome::Clean,
        1 => Outcome::Warnings,
        _ => Outcome::NeedsAction,
    })
}

fn print_report(report: &HealthReport) {
    let width = report.checks.iter().map(|c| c.name.len()).max().unwrap_or(0);
    for check in &report.checks {
        println!(
            "[{:<4}] {:<width$}  {}",
            check.status.as_str(),
            check.name,
            check.message
        );
        if let Some(hint) = &check.fix_hint {
            if check.status >= CheckStatus::Warn {
                println!("       {:<width$}  fix: {hint}", "");
            }
        }
    }

    if !report.changes.is_empty() {
        println!();
        println!("State file changes:");
        for change in &report.changes {
            println!("  {}", describe(change));
        }
    }

    println!();
    println!(
        "{} passed, {} warning(s), {} failed, {} skipped",
        report.count(CheckStatus::Pass),
        report.count(CheckStatus::Warn),
        report.count(CheckStatus::Fail),
        report.count(CheckStatus::Skip),
    );
    if report.mode == DoctorMode::DryRun && !report.changes.is_empty() {
        println!("Dry run: nothing was written.");
    }
}

fn describe(change: &StoreChange) -> String {
    let what = match change.kind {
        ChangeKind::Relabeled => format!(
            "relabel {} {} -> {}",
            change.ticket_id,
            label(change.from),
            label(change.to)
        ),
        ChangeKind::Removed => format!("remove stale record {}", change.ticket_id),
        ChangeKind::Adopted => format!("adopt {}", change.ticket_id),
    };
    let state = if change.applied { "done" } else { "pending" };
    format!("{what} ({}) [{state}]", change.path.display())
}

fn label(status: Option<vibe_core::store::RecordStatus>) -> String {
    status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
}
