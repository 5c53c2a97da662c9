//! Health checks and drift repair.
//!
//! The doctor compares the state file with `git worktree list` and reports
//! what disagrees. It only ever rewrites the state file: git metadata and
//! worktree directories are never touched.

use crate::branch;
use crate::config::{Config, WarnLevel};
use crate::error::{Result, VibeError};
use crate::git::{Git, LiveWorktree};
use crate::io;
use crate::paths;
use crate::process::ProcessRunner;
use crate::store::{RecordStatus, StateStore, WorktreeRecord};
use crate::worktree::{reconcile_records, WorktreeView};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DoctorMode {
    /// Report only; nothing is written.
    DryRun,
    /// Persist status relabels; never delete or add records.
    Relabel,
    /// Drop stale records, adopt orphans, and record the run.
    Repair,
}

impl DoctorMode {
    fn writes(self) -> bool {
        !matches!(self, DoctorMode::DryRun)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Pass,
    Skip,
    Warn,
    Fail,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Skip => "SKIP",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_hint: Option<String>,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            fix_hint: None,
        }
    }

    fn pass(name: &str, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Pass, message)
    }

    fn skip(name: &str, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Skip, message)
    }

    fn warn(name: &str, message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            fix_hint: Some(hint.into()),
            ..Self::new(name, CheckStatus::Warn, message)
        }
    }

    fn fail(name: &str, message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            fix_hint: Some(hint.into()),
            ..Self::new(name, CheckStatus::Fail, message)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Relabeled,
    Removed,
    Adopted,
}

/// One change to the state file, planned or made.
#[derive(Debug, Clone, Serialize)]
pub struct StoreChange {
    pub ticket_id: String,
    pub path: PathBuf,
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<RecordStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<RecordStatus>,
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub mode: DoctorMode,
    pub checks: Vec<CheckResult>,
    pub worktrees: Vec<WorktreeView>,
    pub changes: Vec<StoreChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_doctor_run: Option<DateTime<Utc>>,
}

impl HealthReport {
    pub fn worst(&self) -> CheckStatus {
        self.checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(CheckStatus::Pass)
    }

    /// 0 all good, 1 warnings only, 2 something needs a human.
    pub fn exit_code(&self) -> i32 {
        match self.worst() {
            CheckStatus::Fail => 2,
            CheckStatus::Warn => 1,
            _ => 0,
        }
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}

// ---------------------------------------------------------------------------
// Check names
// ---------------------------------------------------------------------------

const CHECK_GIT: &str = "Git";
const CHECK_REPO: &str = "Repository";
const CHECK_CONFIG: &str = "Config file";
const CHECK_PATTERN: &str = "Branch pattern";
const CHECK_MAIN: &str = "Main branch";
const CHECK_STATE: &str = "State file";
const CHECK_GITIGNORE: &str = "Gitignore";
const CHECK_DRIFT: &str = "Worktree drift";
const CHECK_PRUNABLE: &str = "Worktree metadata";

const REPO_CHECKS: &[&str] = &[
    CHECK_CONFIG,
    CHECK_PATTERN,
    CHECK_MAIN,
    CHECK_STATE,
    CHECK_GITIGNORE,
    CHECK_DRIFT,
    CHECK_PRUNABLE,
];

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

/// Run every check against the repository at `root` and reconcile the state
/// file according to `mode`.
///
/// Problems with the project are reported as failed checks; `Err` is
/// reserved for the doctor itself being unable to proceed.
pub fn reconcile(root: &Path, runner: &ProcessRunner, mode: DoctorMode) -> Result<HealthReport> {
    let mut report = HealthReport {
        mode,
        checks: Vec::new(),
        worktrees: Vec::new(),
        changes: Vec::new(),
        last_doctor_run: None,
    };

    if which::which("git").is_err() {
        report.checks.push(CheckResult::fail(
            CHECK_GIT,
            "git not found on PATH",
            "install git",
        ));
        skip_rest(&mut report, "git is not available");
        return Ok(report);
    }
    report.checks.push(CheckResult::pass(CHECK_GIT, "git found on PATH"));

    let probe = Git::new(runner.clone(), root);
    match probe.ensure_ready() {
        Ok(()) => {}
        Err(e @ (VibeError::NotARepository(_) | VibeError::EmptyRepository(_))) => {
            let hint = match &e {
                VibeError::NotARepository(_) => "run 'git init' or pass --root <repo>",
                _ => "create an initial commit",
            };
            let message = e.to_string().lines().next().unwrap_or_default().to_string();
            report.checks.push(CheckResult::fail(CHECK_REPO, message, hint));
            skip_rest(&mut report, "no usable repository");
            return Ok(report);
        }
        Err(e) => return Err(e),
    }
    let root = probe.primary_root()?;
    let git = Git::new(runner.clone(), &root);
    report.checks.push(CheckResult::pass(
        CHECK_REPO,
        format!("primary checkout at {}", root.display()),
    ));

    let config = check_config(&root, &mut report);
    check_pattern(&config, &mut report);
    check_main_branch(&git, &config, &mut report)?;

    let Some(mut store) = check_state(&root, mode, &mut report)? else {
        for name in [CHECK_GITIGNORE, CHECK_DRIFT, CHECK_PRUNABLE] {
            report.checks.push(CheckResult::skip(name, "state file unreadable"));
        }
        return Ok(report);
    };
    check_gitignore(&root, &mut report)?;

    let live = git.worktrees()?;
    check_drift(&mut store, &live, mode, &mut report);
    check_prunable(&live, &mut report);

    if mode == DoctorMode::Repair {
        store.mark_doctor_run(Utc::now());
    }
    let dirty = report.changes.iter().any(|c| c.applied);
    if mode == DoctorMode::Repair || (mode.writes() && dirty) {
        store.save()?;
        tracing::info!(path = %store.path().display(), changes = report.changes.len(), "state file written");
    }
    report.last_doctor_run = store.last_doctor_run();
    Ok(report)
}

fn skip_rest(report: &mut HealthReport, why: &str) {
    let done: Vec<String> = report.checks.iter().map(|c| c.name.clone()).collect();
    for name in std::iter::once(CHECK_REPO).chain(REPO_CHECKS.iter().copied()) {
        if !done.iter().any(|d| d == name) {
            report.checks.push(CheckResult::skip(name, why));
        }
    }
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

fn check_config(root: &Path, report: &mut HealthReport) -> Config {
    if !Config::exists(root) {
        report.checks.push(CheckResult::warn(
            CHECK_CONFIG,
            format!("{} not found; defaults in use", paths::CONFIG_FILE),
            "run 'vibe reconcile --apply' to record detected conventions",
        ));
        return Config::default();
    }
    let config = match Config::load(root) {
        Ok(c) => c,
        Err(e) => {
            report.checks.push(CheckResult::fail(
                CHECK_CONFIG,
                format!("{} does not parse: {e}", paths::CONFIG_FILE),
                format!("fix the YAML in {}", paths::CONFIG_FILE),
            ));
            return Config::default();
        }
    };

    let issues = config.validate();
    let check = match issues.iter().find(|w| w.level == WarnLevel::Error) {
        Some(err) => CheckResult::fail(CHECK_CONFIG, err.message.clone(), format!("edit {}", paths::CONFIG_FILE)),
        None if !issues.is_empty() => CheckResult::warn(
            CHECK_CONFIG,
            issues
                .iter()
                .map(|w| w.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            format!("edit {}", paths::CONFIG_FILE),
        ),
        None => CheckResult::pass(CHECK_CONFIG, format!("{} is valid", paths::CONFIG_FILE)),
    };
    report.checks.push(check);
    config
}

fn check_pattern(config: &Config, report: &mut HealthReport) {
    let pattern = config.effective_pattern();
    let check = match branch::validate_pattern(pattern) {
        Ok(()) => CheckResult::pass(CHECK_PATTERN, format!("using '{pattern}'")),
        Err(VibeError::InvalidBranchPattern { reason, .. }) => CheckResult::fail(
            CHECK_PATTERN,
            format!("'{pattern}' is not usable: {reason}"),
            "set branching.pattern, e.g. '{PROJ}-{num}'",
        ),
        Err(e) => CheckResult::fail(CHECK_PATTERN, e.to_string(), "set branching.pattern"),
    };
    report.checks.push(check);
}

fn check_main_branch(git: &Git, config: &Config, report: &mut HealthReport) -> Result<()> {
    let main = config.effective_main_branch();
    let remote = format!("origin/{main}");
    let check = if git.resolves(main)? {
        CheckResult::pass(CHECK_MAIN, format!("'{main}' resolves"))
    } else if git.resolves(&remote)? {
        CheckResult::pass(CHECK_MAIN, format!("'{remote}' resolves"))
    } else {
        CheckResult::fail(
            CHECK_MAIN,
            format!("neither '{main}' nor '{remote}' exists"),
            "set branching.main_branch, or run 'vibe reconcile --apply'",
        )
    };
    report.checks.push(check);
    Ok(())
}

fn check_state(root: &Path, mode: DoctorMode, report: &mut HealthReport) -> Result<Option<StateStore>> {
    let opened = if mode.writes() {
        StateStore::open(root)
    } else {
        StateStore::open_strict(root)
    };
    let store = match opened {
        Ok(store) => store,
        Err(VibeError::StateStoreCorrupt { reason, .. }) => {
            report.checks.push(CheckResult::warn(
                CHECK_STATE,
                format!("{} is corrupt: {reason}", paths::STATE_FILE),
                "run 'vibe doctor' to move it aside and rebuild from live worktrees",
            ));
            return Ok(None);
        }
        Err(e) => {
            report.checks.push(CheckResult::fail(
                CHECK_STATE,
                format!("{} cannot be read: {e}", paths::STATE_FILE),
                "check file permissions",
            ));
            return Ok(None);
        }
    };

    let check = match store.recovered_from() {
        Some(backup) => CheckResult::warn(
            CHECK_STATE,
            format!("state file was corrupt; moved to {}", backup.display()),
            "inspect the backup; 'vibe doctor --repair' rebuilds records from live worktrees",
        ),
        None if !store.exists() => CheckResult::pass(CHECK_STATE, "no state file yet"),
        None => CheckResult::pass(
            CHECK_STATE,
            format!("{} record(s)", store.records().len()),
        ),
    };
    report.checks.push(check);
    Ok(Some(store))
}

fn check_gitignore(root: &Path, report: &mut HealthReport) -> Result<()> {
    let check = if io::gitignore_has_entry(root, paths::STATE_FILE)? {
        CheckResult::pass(CHECK_GITIGNORE, format!("{} is ignored", paths::STATE_FILE))
    } else {
        CheckResult::warn(
            CHECK_GITIGNORE,
            format!("{} is not listed in .gitignore", paths::STATE_FILE),
            format!("add '{}' to .gitignore", paths::STATE_FILE),
        )
    };
    report.checks.push(check);
    Ok(())
}

fn check_drift(
    store: &mut StateStore,
    live: &[LiveWorktree],
    mode: DoctorMode,
    report: &mut HealthReport,
) {
    let views = reconcile_records(store.records(), live);
    let writes = mode.writes();
    let mut unresolved = Vec::new();

    for view in &views {
        match (view.recorded_status, view.status) {
            (Some(recorded), RecordStatus::Stale) if mode == DoctorMode::Repair => {
                store.remove(&view.ticket_id);
                report.changes.push(change(view, ChangeKind::Removed, Some(recorded), None, true));
            }
            (Some(recorded), actual) if recorded != actual => {
                if writes {
                    store.set_status(&view.ticket_id, actual);
                }
                report
                    .changes
                    .push(change(view, ChangeKind::Relabeled, Some(recorded), Some(actual), writes));
                if actual == RecordStatus::Stale {
                    unresolved.push(format!("{} is stale", view.ticket_id));
                }
            }
            (Some(_), RecordStatus::Stale) => {
                unresolved.push(format!("{} is stale", view.ticket_id));
            }
            (None, _) => {
                if mode == DoctorMode::Repair {
                    match adopt(store, view) {
                        Ok(()) => report.changes.push(change(
                            view,
                            ChangeKind::Adopted,
                            None,
                            Some(RecordStatus::Active),
                            true,
                        )),
                        Err(why) => unresolved.push(format!("{} not adopted: {why}", view.path.display())),
                    }
                } else {
                    report.changes.push(change(
                        view,
                        ChangeKind::Adopted,
                        None,
                        Some(RecordStatus::Active),
                        false,
                    ));
                    unresolved.push(format!("{} is orphaned", view.ticket_id));
                }
            }
            _ => {}
        }
    }

    let check = if unresolved.is_empty() {
        let fixed = report.changes.iter().filter(|c| c.applied).count();
        let planned = report.changes.len();
        if fixed > 0 {
            CheckResult::pass(CHECK_DRIFT, format!("{fixed} record(s) reconciled"))
        } else if planned > 0 {
            CheckResult::warn(
                CHECK_DRIFT,
                format!("{planned} record(s) out of date"),
                "run 'vibe doctor' to relabel them",
            )
        } else {
            CheckResult::pass(CHECK_DRIFT, format!("{} worktree(s) in sync", views.len()))
        }
    } else {
        let hint = if mode == DoctorMode::Repair {
            "resolve the listed worktrees by hand"
        } else {
            "run 'vibe doctor --repair'"
        };
        CheckResult::warn(CHECK_DRIFT, unresolved.join("; "), hint)
    };
    report.checks.push(check);
    // As found, before any change above.
    report.worktrees = views;
}

fn change(
    view: &WorktreeView,
    kind: ChangeKind,
    from: Option<RecordStatus>,
    to: Option<RecordStatus>,
    applied: bool,
) -> StoreChange {
    StoreChange {
        ticket_id: view.ticket_id.clone(),
        path: view.path.clone(),
        kind,
        from,
        to,
        applied,
    }
}

/// Record a live worktree the state file did not know about.
fn adopt(store: &mut StateStore, view: &WorktreeView) -> std::result::Result<(), String> {
    let Some(branch) = view.branch.clone() else {
        return Err("detached HEAD".to_string());
    };
    if let Some(existing) = store.get(&view.ticket_id) {
        return Err(format!(
            "ticket {} is already recorded at {}",
            view.ticket_id,
            existing.path.display()
        ));
    }
    store.upsert(WorktreeRecord::new(view.ticket_id.clone(), branch, view.path.clone()));
    Ok(())
}

fn check_prunable(live: &[LiveWorktree], report: &mut HealthReport) {
    let prunable: Vec<String> = live
        .iter()
        .filter(|w| w.prunable || (!w.bare && !w.path.exists()))
        .map(|w| w.path.display().to_string())
        .collect();
    let check = if prunable.is_empty() {
        CheckResult::pass(CHECK_PRUNABLE, "no prunable worktree metadata")
    } else {
        CheckResult::warn(
            CHECK_PRUNABLE,
            format!("git still lists missing worktrees: {}", prunable.join(", ")),
            "run 'git worktree prune'",
        )
    };
    report.checks.push(check);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{NoGitHub, NullTracker};
    use crate::testutil::TestRepo;
    use crate::worktree::WorktreeOrchestrator;
    use tempfile::TempDir;

    fn check<'r>(report: &'r HealthReport, name: &str) -> &'r CheckResult {
        report.checks.iter().find(|c| c.name == name).unwrap()
    }

    fn setup(tickets: &[&str]) -> (TestRepo, Vec<PathBuf>) {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let git = Git::new(ProcessRunner::default(), &repo.root);
        let orch = WorktreeOrchestrator::new(&git, &cfg, &NullTracker, &NoGitHub).unwrap();
        let paths = tickets
            .iter()
            .map(|t| orch.create_for_ticket(t).unwrap().path)
            .collect();
        (repo, paths)
    }

    #[test]
    fn not_a_repository_fails_and_skips_the_rest() {
        let dir = TempDir::new().unwrap();
        let report = reconcile(dir.path(), &ProcessRunner::default(), DoctorMode::Relabel).unwrap();
        assert_eq!(check(&report, CHECK_REPO).status, CheckStatus::Fail);
        assert_eq!(check(&report, CHECK_DRIFT).status, CheckStatus::Skip);
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn healthy_repository() {
        let (repo, _) = setup(&["PROJ-1"]);
        std::fs::write(repo.root.join(".gitignore"), ".vibe/local_state.json\n").unwrap();
        Config::default().save(&repo.root).unwrap();

        let report = reconcile(&repo.root, &ProcessRunner::default(), DoctorMode::Relabel).unwrap();
        for c in &report.checks {
            assert_eq!(c.status, CheckStatus::Pass, "{c:?}");
        }
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.worktrees.len(), 1);
    }

    #[test]
    fn repair_drops_stale_and_keeps_active() {
        let (repo, paths) = setup(&["PROJ-1", "PROJ-2"]);
        std::fs::remove_dir_all(&paths[0]).unwrap();

        let report = reconcile(&repo.root, &ProcessRunner::default(), DoctorMode::Repair).unwrap();
        assert!(report
            .changes
            .iter()
            .any(|c| c.ticket_id == "PROJ-1" && c.kind == ChangeKind::Removed && c.applied));

        let store = StateStore::open(&repo.root).unwrap();
        assert!(store.get("PROJ-1").is_none());
        assert_eq!(store.get("PROJ-2").unwrap().status, RecordStatus::Active);
        assert!(store.last_doctor_run().is_some());
        // Git's own metadata is left alone.
        assert_eq!(check(&report, CHECK_PRUNABLE).status, CheckStatus::Warn);
    }

    #[test]
    fn relabel_marks_stale_without_deleting() {
        let (repo, paths) = setup(&["PROJ-1"]);
        std::fs::remove_dir_all(&paths[0]).unwrap();

        let report = reconcile(&repo.root, &ProcessRunner::default(), DoctorMode::Relabel).unwrap();
        assert_eq!(check(&report, CHECK_DRIFT).status, CheckStatus::Warn);
        let store = StateStore::open(&repo.root).unwrap();
        assert_eq!(store.get("PROJ-1").unwrap().status, RecordStatus::Stale);
        assert!(store.last_doctor_run().is_none());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let (repo, paths) = setup(&["PROJ-1"]);
        std::fs::remove_dir_all(&paths[0]).unwrap();
        let before = std::fs::read(paths::state_path(&repo.root)).unwrap();

        let report = reconcile(&repo.root, &ProcessRunner::default(), DoctorMode::DryRun).unwrap();
        assert!(report.changes.iter().all(|c| !c.applied));
        assert_eq!(report.changes.len(), 1);
        assert_eq!(std::fs::read(paths::state_path(&repo.root)).unwrap(), before);
    }

    #[test]
    fn repair_adopts_orphans_as_active() {
        let repo = TestRepo::new();
        let side = repo.base.join("spikes").join("exp");
        repo.git(&["worktree", "add", "-b", "feature/ENG-4-spike", &side.to_string_lossy()]);

        let report = reconcile(&repo.root, &ProcessRunner::default(), DoctorMode::Relabel).unwrap();
        assert_eq!(check(&report, CHECK_DRIFT).status, CheckStatus::Warn);
        assert!(StateStore::open(&repo.root).unwrap().records().is_empty());

        let report = reconcile(&repo.root, &ProcessRunner::default(), DoctorMode::Repair).unwrap();
        assert_eq!(check(&report, CHECK_DRIFT).status, CheckStatus::Pass);
        let store = StateStore::open(&repo.root).unwrap();
        let rec = store.get("ENG-4").unwrap();
        assert_eq!(rec.status, RecordStatus::Active);
        assert_eq!(rec.branch_name, "feature/ENG-4-spike");
        assert!(side.exists());
    }

    #[test]
    fn live_record_labeled_stale_is_relabeled_active() {
        let (repo, _) = setup(&["PROJ-3"]);
        let mut store = StateStore::open(&repo.root).unwrap();
        store.set_status("PROJ-3", RecordStatus::Stale);
        store.save().unwrap();

        reconcile(&repo.root, &ProcessRunner::default(), DoctorMode::Relabel).unwrap();
        let store = StateStore::open(&repo.root).unwrap();
        assert_eq!(store.get("PROJ-3").unwrap().status, RecordStatus::Active);
    }

    #[test]
    fn corrupt_state_is_backed_up_and_reported() {
        let repo = TestRepo::new();
        std::fs::create_dir_all(repo.root.join(".vibe")).unwrap();
        std::fs::write(paths::state_path(&repo.root), "[[[").unwrap();

        let dry = reconcile(&repo.root, &ProcessRunner::default(), DoctorMode::DryRun).unwrap();
        assert_eq!(check(&dry, CHECK_STATE).status, CheckStatus::Warn);
        assert!(paths::state_path(&repo.root).exists());

        let report = reconcile(&repo.root, &ProcessRunner::default(), DoctorMode::Relabel).unwrap();
        let state = check(&report, CHECK_STATE);
        assert_eq!(state.status, CheckStatus::Warn);
        assert!(state.message.contains("corrupt-"));
        let backups = std::fs::read_dir(repo.root.join(".vibe"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn bad_pattern_and_missing_main_fail() {
        let repo = TestRepo::new();
        let mut cfg = Config::default();
        cfg.branching.pattern = Some("{PROJ}-{nmu}".into());
        cfg.branching.main_branch = Some("trunk".into());
        cfg.save(&repo.root).unwrap();

        let report = reconcile(&repo.root, &ProcessRunner::default(), DoctorMode::DryRun).unwrap();
        assert_eq!(check(&report, CHECK_PATTERN).status, CheckStatus::Fail);
        assert_eq!(check(&report, CHECK_MAIN).status, CheckStatus::Fail);
        assert_eq!(check(&report, CHECK_CONFIG).status, CheckStatus::Pass);
        assert_eq!(report.exit_code(), 2);
    }
}
