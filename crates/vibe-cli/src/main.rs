mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{doctor::DoctorArgs, reconcile::ReconcileArgs, worktree::WorktreeSubcommand, Outcome};
use std::path::PathBuf;
use vibe_core::VibeError;

#[derive(Parser)]
#[command(
    name = "vibe",
    about = "Ticket worktrees and convention reconciliation for git repositories",
    version,
    propagate_version = true
)]
struct Cli {
    /// Repository root (default: auto-detect from .vibe/ or .git)
    #[arg(long, global = true, env = "VIBE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect repository conventions and compare them with .vibe/config.yaml
    Reconcile(ReconcileArgs),

    /// Manage per-ticket worktrees
    Worktree {
        #[command(subcommand)]
        subcommand: WorktreeSubcommand,
    },

    /// Check project health and reconcile the state file with live worktrees
    Doctor(DoctorArgs),
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Reconcile(args) => cmd::reconcile::run(&root, args, cli.json),
        Commands::Worktree { subcommand } => cmd::worktree::run(&root, subcommand, cli.json),
        Commands::Doctor(args) => cmd::doctor::run(&root, args, cli.json),
    };

    let code = match result {
        Ok(Outcome::Clean) => 0,
        Ok(Outcome::Warnings) => 1,
        Ok(Outcome::NeedsAction) => 2,
        Err(e) => {
            // Print the full error chain (anyhow's alternate Display)
            eprintln!("error: {e:#}");
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

/// 2 when a human has to act, 3 for internal failures.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    let vibe = err.chain().find_map(|e| e.downcast_ref::<VibeError>());
    match vibe {
        Some(e) if e.kind().needs_user_action() => 2,
        _ => 3,
    }
}
