//! Convention detection: infer how a project already works from its git
//! history and a few well-known files.
//!
//! Detection is read-only and produces fresh [`Signal`]s on every run. It
//! refuses to run on a directory that is not a repository or has no commits,
//! because "no evidence" would otherwise be indistinguishable from "nothing
//! to detect".

use crate::branch::{self, BranchShape};
use crate::config::ConfigField;
use crate::error::Result;
use crate::git::Git;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const REMOTE: &str = "origin";
const MAIN_CANDIDATES: &[&str] = &["main", "master"];
const CERTAIN: f64 = 1.0;
const FALLBACK_MAIN_CONFIDENCE: f64 = 0.6;

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    BranchPattern,
    MainBranch,
    WorktreeUsage,
    Framework,
    DeploymentTarget,
    Database,
}

impl SignalCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalCategory::BranchPattern => "branch_pattern",
            SignalCategory::MainBranch => "main_branch",
            SignalCategory::WorktreeUsage => "worktree_usage",
            SignalCategory::Framework => "framework",
            SignalCategory::DeploymentTarget => "deployment_target",
            SignalCategory::Database => "database",
        }
    }

    /// The config field this category informs, if reconciliation acts on it.
    pub fn field(self) -> Option<ConfigField> {
        match self {
            SignalCategory::BranchPattern => Some(ConfigField::BranchPattern),
            SignalCategory::MainBranch => Some(ConfigField::MainBranch),
            SignalCategory::WorktreeUsage => Some(ConfigField::WorktreesEnabled),
            _ => None,
        }
    }
}

impl std::fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One piece of evidence about a project convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub category: SignalCategory,
    pub value: String,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// What the evidence was, for humans.
    #[serde(default)]
    pub detail: String,
}

impl Signal {
    fn new(
        category: SignalCategory,
        value: impl Into<String>,
        confidence: f64,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            category,
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            detail: detail.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// detect
// ---------------------------------------------------------------------------

/// Run every detector against the repository behind `git`.
pub fn detect(git: &Git) -> Result<Vec<Signal>> {
    git.ensure_ready()?;

    let mut signals = Vec::new();
    let main = detect_main_branch(git)?;
    let main_name = main.as_ref().map(|s| s.value.clone());
    signals.extend(main);
    signals.extend(detect_branch_pattern(git, main_name.as_deref())?);
    signals.push(detect_worktree_usage(git)?);
    signals.extend(detect_files(git.repo()));

    tracing::debug!(count = signals.len(), "detection finished");
    Ok(signals)
}

fn detect_main_branch(git: &Git) -> Result<Option<Signal>> {
    if let Some(head) = git.remote_head(REMOTE)? {
        return Ok(Some(Signal::new(
            SignalCategory::MainBranch,
            head.clone(),
            CERTAIN,
            format!("{REMOTE}/HEAD points at {head}"),
        )));
    }

    // Most recently committed-to of main/master, local or remote-tracking.
    let branches = git.branches()?;
    let mut best: Option<(&str, i64)> = None;
    for candidate in MAIN_CANDIDATES {
        let newest = branches
            .iter()
            .filter(|b| b.name == *candidate && b.remote.as_deref().map_or(true, |r| r == REMOTE))
            .map(|b| b.committed_at)
            .max();
        if let Some(ts) = newest {
            if best.map_or(true, |(_, t)| ts > t) {
                best = Some((*candidate, ts));
            }
        }
    }
    Ok(best.map(|(name, _)| {
        Signal::new(
            SignalCategory::MainBranch,
            name,
            FALLBACK_MAIN_CONFIDENCE,
            format!("no {REMOTE}/HEAD; '{name}' has the most recent commit"),
        )
    }))
}

/// Plurality vote over branch-name shapes.
pub fn infer_branch_pattern<'a, I>(names: I, main: Option<&str>) -> Option<Signal>
where
    I: IntoIterator<Item = &'a str>,
{
    let examined: BTreeSet<&str> = names
        .into_iter()
        .filter(|n| !n.ends_with("HEAD"))
        .filter(|n| match main {
            Some(m) => *n != m,
            None => !MAIN_CANDIDATES.contains(n),
        })
        .collect();
    let total = examined.len();
    if total == 0 {
        return None;
    }

    let mut counts: BTreeMap<u8, (BranchShape, usize)> = BTreeMap::new();
    for name in &examined {
        let shape = branch::branch_shape(name);
        counts.entry(shape.rank()).or_insert((shape, 0)).1 += 1;
    }

    // Free text only wins when nothing is ticket-shaped.
    let any_structured = counts.values().any(|(s, _)| s.is_structured());
    let (shape, count) = counts
        .values()
        .filter(|(s, _)| s.is_structured() || !any_structured)
        // max_by_key keeps the last maximum; walking ranks in reverse makes
        // the lowest rank win ties.
        .rev()
        .max_by_key(|(_, c)| *c)
        .copied()?;

    Some(Signal::new(
        SignalCategory::BranchPattern,
        shape.pattern(),
        count as f64 / total as f64,
        format!("{count}/{total} branches match {}", shape.pattern()),
    ))
}

fn detect_branch_pattern(git: &Git, main: Option<&str>) -> Result<Option<Signal>> {
    let branches = git.branches()?;
    Ok(infer_branch_pattern(
        branches.iter().map(|b| b.name.as_str()),
        main,
    ))
}

fn detect_worktree_usage(git: &Git) -> Result<Signal> {
    let live = git.worktrees()?.iter().filter(|w| w.is_live()).count();
    let used = live > 1;
    Ok(Signal::new(
        SignalCategory::WorktreeUsage,
        used.to_string(),
        CERTAIN,
        format!("{live} live worktree(s)"),
    ))
}

// ---------------------------------------------------------------------------
// File-based detectors
// ---------------------------------------------------------------------------

const JS_FRAMEWORKS: &[(&str, &str)] = &[
    ("next", "nextjs"),
    ("nuxt", "nuxt"),
    ("astro", "astro"),
    ("@sveltejs/kit", "sveltekit"),
    ("svelte", "svelte"),
    ("vue", "vue"),
    ("react", "react"),
    ("@angular/core", "angular"),
    ("express", "express"),
    ("fastify", "fastify"),
    ("hono", "hono"),
];

const PY_FRAMEWORKS: &[&str] = &["fastapi", "django", "flask"];

const ENV_FILES: &[&str] = &[".env", ".env.local", ".env.development", ".env.example"];

/// Framework, deployment and database signals from files in `root`.
pub fn detect_files(root: &Path) -> Vec<Signal> {
    let mut signals = Vec::new();
    signals.extend(detect_js_framework(root));
    signals.extend(detect_python_framework(root));
    if root.join("Cargo.toml").is_file() {
        signals.push(file_signal(SignalCategory::Framework, "rust", "Cargo.toml"));
    }
    signals.extend(detect_deployment(root));
    signals.extend(detect_database(root));
    signals
}

fn file_signal(category: SignalCategory, value: &str, evidence: &str) -> Signal {
    Signal::new(category, value, CERTAIN, format!("found {evidence}"))
}

fn detect_js_framework(root: &Path) -> Option<Signal> {
    let data = std::fs::read_to_string(root.join("package.json")).ok()?;
    let manifest: serde_json::Value = match serde_json::from_str(&data) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "package.json is not valid JSON");
            return None;
        }
    };
    let has_dep = |name: &str| {
        ["dependencies", "devDependencies"]
            .iter()
            .any(|section| manifest.get(section).and_then(|d| d.get(name)).is_some())
    };
    JS_FRAMEWORKS
        .iter()
        .find(|(dep, _)| has_dep(dep))
        .map(|(dep, value)| {
            file_signal(
                SignalCategory::Framework,
                value,
                &format!("'{dep}' in package.json"),
            )
        })
}

fn detect_python_framework(root: &Path) -> Option<Signal> {
    let mut manifests = String::new();
    for file in ["pyproject.toml", "requirements.txt"] {
        if let Ok(data) = std::fs::read_to_string(root.join(file)) {
            manifests.push_str(&data.to_ascii_lowercase());
            manifests.push('\n');
        }
    }
    PY_FRAMEWORKS
        .iter()
        .find(|fw| manifests.contains(*fw))
        .map(|fw| file_signal(SignalCategory::Framework, fw, &format!("'{fw}' in Python manifests")))
}

fn detect_deployment(root: &Path) -> Vec<Signal> {
    let mut out = Vec::new();
    if root.join("vercel.json").is_file() {
        out.push(file_signal(SignalCategory::DeploymentTarget, "vercel", "vercel.json"));
    } else if root.join(".vercel").is_dir() {
        out.push(file_signal(SignalCategory::DeploymentTarget, "vercel", ".vercel/"));
    }
    if root.join("fly.toml").is_file() {
        out.push(file_signal(SignalCategory::DeploymentTarget, "fly", "fly.toml"));
    }
    if let Some(file) = ["Dockerfile", "docker-compose.yml", "docker-compose.yaml", "compose.yaml"]
        .into_iter()
        .find(|f| root.join(f).is_file())
    {
        out.push(file_signal(SignalCategory::DeploymentTarget, "docker", file));
    }
    out
}

fn detect_database(root: &Path) -> Vec<Signal> {
    let mut out = Vec::new();
    let env: String = ENV_FILES
        .iter()
        .filter_map(|f| std::fs::read_to_string(root.join(f)).ok())
        .collect::<Vec<_>>()
        .join("\n")
        .to_ascii_lowercase();

    if root.join("supabase").join("config.toml").is_file() {
        out.push(file_signal(SignalCategory::Database, "supabase", "supabase/config.toml"));
    } else if env.contains("supabase_url") {
        out.push(file_signal(SignalCategory::Database, "supabase", "SUPABASE_URL in .env files"));
    }
    if env.contains("neon.tech") {
        out.push(file_signal(SignalCategory::Database, "neon", "neon.tech in .env files"));
    }
    // Supabase and Neon are both Postgres; only report bare Postgres otherwise.
    if out.is_empty() && env.contains("postgres") {
        out.push(file_signal(SignalCategory::Database, "postgres", "postgres URL in .env files"));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
