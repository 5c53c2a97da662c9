use crate::cmd::{Outcome, Project};
use crate::output::{or_dash, print_json, print_table, print_warnings};
use anyhow::Context;
use clap::Args;
use std::path::Path;
use vibe_core::classifier::{self, Action, ActionKind};
use vibe_core::config::ConfigField;
use vibe_core::detector;
use vibe_core::io::ensure_gitignore_entry;
use vibe_core::paths;
use vibe_core::store::StateStore;

#[derive(Args)]
pub struct ReconcileArgs {
    /// Show what would change without writing anything
    #[arg(long, conflicts_with = "apply")]
    pub dry_run: bool,

    /// Write every auto-applicable ADOPT into .vibe/config.yaml
    #[arg(long)]
    pub apply: bool,
}

pub fn run(root: &Path, args: ReconcileArgs, json: bool) -> anyhow::Result<Outcome> {
    let mut project = Project::open(root)?;
    let mut warnings = Vec::new();

    let signals = detector::detect(&project.git)?;
    let actions = classifier::classify(&signals, &project.config);

    if !args.dry_run {
        let mut store = StateStore::open(&project.root).context("failed to open state file")?;
        if let Some(backup) = store.recovered_from() {
            warnings.push(format!(
                "state file was corrupt and was moved to {}",
                backup.display()
            ));
        }
        store.set_signals(signals.clone());
        store.save().context("failed to save state file")?;
    }

    let mut applied: Vec<ConfigField> = Vec::new();
    if args.apply {
        applied = classifier::apply(&actions, &mut project.config);
        if !applied.is_empty() {
            project
                .config
                .save(&project.root)
                .context("failed to save config")?;
        }
        ensure_gitignore_entry(&project.root, paths::STATE_FILE)?;
    }

    if json {
        let value = serde_json::json!({
            "signals": signals,
            "actions": actions,
            "applied": applied,
        });
        print_json(&value)?;
    } else {
        print_actions(&actions);
        if args.apply {
            if applied.is_empty() {
                println!("\nNothing to apply.");
            } else {
                let keys: Vec<&str> = applied.iter().map(|f| f.key()).collect();
                println!("\nUpdated {}: {}", paths::CONFIG_FILE, keys.join(", "));
            }
        } else if actions.iter().any(|a| a.kind == ActionKind::Adopt && a.auto_applicable) {
            println!("\nRun 'vibe reconcile --apply' to adopt the detected values.");
        }
    }
    print_warnings(&warnings);

    // The first conflict (fields are sorted) is the one reported.
    if let Some(err) = actions.iter().find_map(Action::conflict_error) {
        return Err(err.into());
    }

    let needs_configuring = actions.iter().any(|a| a.kind == ActionKind::Configure);
    Ok(Outcome::warn_if(needs_configuring || !warnings.is_empty()))
}

fn print_actions(actions: &[Action]) {
    let rows: Vec<Vec<String>> = actions
        .iter()
        .map(|a| {
            vec![
                a.target_field.key().to_string(),
                a.kind.to_string(),
                or_dash(a.current_value.as_deref()),
                or_dash(a.suggested_value.as_deref()),
                a.confidence
                    .map(|c| format!("{c:.2}"))
                    .unwrap_or_else(|| "-".to_string()),
                a.note.clone(),
            ]
        })
        .collect();
    print_table(
        &["FIELD", "ACTION", "CURRENT", "SUGGESTED", "CONFIDENCE", "NOTE"],
        &rows,
    );
}
