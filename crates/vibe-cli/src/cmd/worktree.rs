use crate::cmd::{Outcome, Project};
use crate::output::{or_dash, print_json, print_table, print_warnings};
use clap::Subcommand;
use std::path::Path;
use vibe_core::collab::{GhCli, GitHub, NoGitHub, NullTracker};
use vibe_core::worktree::{CreateOutcome, WorktreeOrchestrator, WorktreeView};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum WorktreeSubcommand {
    /// Create (or re-attach) the worktree for a ticket
    Create {
        /// Ticket id, e.g. PROJ-123
        ticket: String,
    },

    /// Remove a ticket's worktree and its record
    Remove {
        /// Ticket id, e.g. PROJ-123
        ticket: String,
        /// Remove even with uncommitted changes
        #[arg(long)]
        force: bool,
    },

    /// List tracked worktrees alongside live git state
    List,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: WorktreeSubcommand, json: bool) -> anyhow::Result<Outcome> {
    let project = Project::open(root)?;
    let github: Box<dyn GitHub> = match GhCli::detect(&project.git) {
        Some(gh) => Box::new(gh),
        None => {
            tracing::debug!("no usable gh; skipping open pull request checks");
            Box::new(NoGitHub)
        }
    };
    let orch = WorktreeOrchestrator::new(
        &project.git,
        &project.config,
        &NullTracker,
        github.as_ref(),
    )?;

    match subcmd {
        WorktreeSubcommand::Create { ticket } => create(&orch, &ticket, json),
        WorktreeSubcommand::Remove { ticket, force } => remove(&orch, &ticket, force, json),
        WorktreeSubcommand::List => list(&orch, json),
    }
}

// ---------------------------------------------------------------------------
// create
// ---------------------------------------------------------------------------

fn create(orch: &WorktreeOrchestrator<'_>, ticket: &str, json: bool) -> anyhow::Result<Outcome> {
    let out = orch.create_for_ticket(ticket)?;

    if json {
        print_json(&out)?;
    } else {
        print_created(&out);
    }
    print_warnings(&out.warnings);
    Ok(Outcome::warn_if(!out.warnings.is_empty()))
}

fn print_created(out: &CreateOutcome) {
    if out.created {
        println!("Created worktree for {}", out.ticket_id);
    } else {
        println!("Worktree for {} already exists", out.ticket_id);
    }
    println!("  branch: {}", out.branch);
    println!("  path:   {}", out.path.display());

    if !out.changes_elsewhere.is_empty() {
        println!("\nChanged in other worktrees:");
        for other in &out.changes_elsewhere {
            println!("  {} ({}):", other.ticket_id, other.branch);
            for file in &other.files {
                println!("    {file}");
            }
        }
    }

    println!("\ncd {}", out.path.display());
}

// ---------------------------------------------------------------------------
// remove
// ---------------------------------------------------------------------------

fn remove(
    orch: &WorktreeOrchestrator<'_>,
    ticket: &str,
    force: bool,
    json: bool,
) -> anyhow::Result<Outcome> {
    let out = orch.remove_for_ticket(ticket, force)?;
    if json {
        print_json(&out)?;
    } else {
        println!("Removed worktree for {} at {}", out.ticket_id, out.path.display());
        println!("  branch '{}' was kept", out.branch);
    }
    Ok(Outcome::Clean)
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn list(orch: &WorktreeOrchestrator<'_>, json: bool) -> anyhow::Result<Outcome> {
    let views = orch.list()?;
    let drifted = views.iter().any(WorktreeView::has_drift);

    if json {
        print_json(&views)?;
    } else if views.is_empty() {
        println!("No worktrees.");
    } else {
        let rows: Vec<Vec<String>> = views
            .iter()
            .map(|v| {
                vec![
                    v.ticket_id.clone(),
                    v.status.to_string(),
                    v.recorded_status
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    or_dash(v.branch.as_deref()),
                    v.path.display().to_string(),
                ]
            })
            .collect();
        print_table(&["TICKET", "STATUS", "RECORDED", "BRANCH", "PATH"], &rows);
        if drifted {
            println!("\nRecorded state has drifted; run 'vibe doctor --repair' to reconcile.");
        }
    }
    Ok(Outcome::warn_if(drifted))
}
