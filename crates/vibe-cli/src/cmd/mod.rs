pub mod doctor;
pub mod reconcile;
pub mod worktree;

use anyhow::Context;
use std::path::{Path, PathBuf};
use vibe_core::config::Config;
use vibe_core::git::Git;
use vibe_core::process::ProcessRunner;

/// How a command finished; `main` maps this to the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    Warnings,
    /// Finished, but left something a human must decide.
    NeedsAction,
}

impl Outcome {
    pub fn warn_if(warned: bool) -> Self {
        if warned {
            Outcome::Warnings
        } else {
            Outcome::Clean
        }
    }
}

/// A repository resolved to its primary checkout, with config loaded.
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
    pub git: Git,
}

impl Project {
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let probe = Git::new(ProcessRunner::default(), root);
        probe.ensure_ready()?;
        let primary = probe.primary_root()?;
        let config = Config::load(&primary)
            .with_context(|| format!("failed to load {}", vibe_core::paths::CONFIG_FILE))?;
        let runner = ProcessRunner::from_config(&config.process);
        tracing::debug!(root = %primary.display(), "project opened");
        Ok(Self {
            git: Git::new(runner, &primary),
            root: primary,
            config,
        })
    }
}
