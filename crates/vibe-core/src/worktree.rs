//! Per-ticket worktrees: create, remove, list.
//!
//! Every operation reconciles the state file against `git worktree list`
//! before deciding anything, and writes the state file only after git has
//! done its part. A create that dies halfway is finished by running it again.

use crate::branch;
use crate::collab::{GitHub, Tracker};
use crate::config::Config;
use crate::error::{Result, VibeError};
use crate::git::{Git, LiveWorktree};
use crate::paths;
use crate::store::{RecordStatus, StateStore, WorktreeRecord};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const REMOTE: &str = "origin";
const IN_PROGRESS: &str = "In Progress";

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Requested,
    Created,
    Active,
    Removed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal worktree lifecycle transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    pub from: Lifecycle,
    pub to: Lifecycle,
}

impl Lifecycle {
    pub fn can_transition(self, to: Lifecycle) -> bool {
        use Lifecycle::*;
        matches!(
            (self, to),
            (Requested, Created)
                | (Created, Active)
                | (Active, Removed)
                | (Requested, Failed)
                | (Created, Failed)
        )
    }

    pub fn transition(self, to: Lifecycle) -> std::result::Result<Lifecycle, IllegalTransition> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(IllegalTransition { from: self, to })
        }
    }
}

/// Tracks one ticket's lifecycle within a single operation.
struct Progress<'t> {
    ticket: &'t str,
    state: Lifecycle,
}

impl<'t> Progress<'t> {
    fn new(ticket: &'t str, state: Lifecycle) -> Self {
        Self { ticket, state }
    }

    fn advance(&mut self, to: Lifecycle) {
        match self.state.transition(to) {
            Ok(next) => {
                tracing::debug!(ticket = self.ticket, from = ?self.state, to = ?next, "lifecycle");
                self.state = next;
            }
            Err(e) => tracing::error!(ticket = self.ticket, "{e}"),
        }
    }

    /// Record failure and hand the error back.
    fn fail(&mut self, err: VibeError) -> VibeError {
        self.advance(Lifecycle::Failed);
        err
    }
}

// ---------------------------------------------------------------------------
// Reconciled view
// ---------------------------------------------------------------------------

/// A worktree as seen after joining the state file with live git state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorktreeView {
    pub ticket_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub path: PathBuf,
    /// Status according to live git state.
    pub status: RecordStatus,
    /// Status as written in the state file; `None` when not recorded.
    pub recorded_status: Option<RecordStatus>,
}

impl WorktreeView {
    /// Recorded status disagrees with live state.
    pub fn has_drift(&self) -> bool {
        self.recorded_status != Some(self.status)
    }
}

/// Ticket id for a worktree this tool did not create.
pub fn guess_ticket_id(wt: &LiveWorktree) -> String {
    wt.branch
        .as_deref()
        .and_then(branch::ticket_from_branch)
        .or_else(|| {
            wt.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| wt.path.to_string_lossy().into_owned())
}

/// Join records with live worktrees by path. Records come first in ticket
/// order, then live linked worktrees the state file does not know.
pub fn reconcile_records(records: &[WorktreeRecord], live: &[LiveWorktree]) -> Vec<WorktreeView> {
    let live: Vec<&LiveWorktree> = live.iter().filter(|w| w.is_live()).collect();
    let mut views = Vec::with_capacity(records.len());

    for rec in records {
        let found = live.iter().find(|w| w.same_path(&rec.path));
        views.push(WorktreeView {
            ticket_id: rec.ticket_id.clone(),
            branch: found
                .and_then(|w| w.branch.clone())
                .or_else(|| Some(rec.branch_name.clone())),
            path: rec.path.clone(),
            status: if found.is_some() {
                RecordStatus::Active
            } else {
                RecordStatus::Stale
            },
            recorded_status: Some(rec.status),
        });
    }

    for wt in live.iter().filter(|w| !w.is_primary && !w.bare) {
        if records.iter().any(|r| wt.same_path(&r.path)) {
            continue;
        }
        views.push(WorktreeView {
            ticket_id: guess_ticket_id(wt),
            branch: wt.branch.clone(),
            path: wt.path.clone(),
            status: RecordStatus::Orphaned,
            recorded_status: None,
        });
    }
    views
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Files another live worktree has changed relative to the main branch.
#[derive(Debug, Clone, Serialize)]
pub struct WorktreeChanges {
    pub ticket_id: String,
    pub branch: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
    pub ticket_id: String,
    pub branch: String,
    pub path: PathBuf,
    /// False when the worktree already existed and only the record was written.
    pub created: bool,
    pub lifecycle: Lifecycle,
    pub changes_elsewhere: Vec<WorktreeChanges>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveOutcome {
    pub ticket_id: String,
    pub branch: String,
    pub path: PathBuf,
    pub lifecycle: Lifecycle,
}

// ---------------------------------------------------------------------------
// WorktreeOrchestrator
// ---------------------------------------------------------------------------

pub struct WorktreeOrchestrator<'a> {
    git: Git,
    root: PathBuf,
    config: &'a Config,
    tracker: &'a dyn Tracker,
    github: &'a dyn GitHub,
}

impl<'a> WorktreeOrchestrator<'a> {
    /// Bind to the primary checkout of the repository behind `git`, so paths
    /// and state are the same whichever worktree the command runs from.
    pub fn new(
        git: &Git,
        config: &'a Config,
        tracker: &'a dyn Tracker,
        github: &'a dyn GitHub,
    ) -> Result<Self> {
        git.ensure_ready()?;
        let root = git.primary_root()?;
        Ok(Self {
            git: Git::new(git.runner().clone(), root.clone()),
            root,
            config,
            tracker,
            github,
        })
    }

    pub fn primary_root(&self) -> &Path {
        &self.root
    }

    /// Deterministic worktree location for `ticket_id`.
    pub fn path_for(&self, ticket_id: &str) -> PathBuf {
        paths::worktree_path(&self.root, &self.config.worktrees.base_path, ticket_id)
    }

    /// Branch name for `ticket_id` under the configured pattern.
    pub fn branch_for(&self, ticket_id: &str, title: Option<&str>) -> Result<String> {
        let pattern = self.config.effective_pattern();
        branch::validate_pattern(pattern)?;
        branch::format_branch_name(pattern, ticket_id, title)
    }

    // -----------------------------------------------------------------------
    // create
    // -----------------------------------------------------------------------

    pub fn create_for_ticket(&self, ticket_id: &str) -> Result<CreateOutcome> {
        paths::validate_ticket_id(ticket_id)?;
        let mut progress = Progress::new(ticket_id, Lifecycle::Requested);
        let mut warnings = Vec::new();
        if self.config.worktrees.enabled == Some(false) {
            warnings.push(format!(
                "{} sets worktrees.enabled: false; creating the worktree anyway",
                paths::CONFIG_FILE
            ));
        }

        let title = match self.tracker.get_ticket(ticket_id) {
            Ok(ticket) => ticket.map(|t| t.title),
            Err(e) => {
                warnings.push(format!("{} lookup failed: {e}", self.tracker.name()));
                None
            }
        };
        let branch = self
            .branch_for(ticket_id, title.as_deref())
            .map_err(|e| progress.fail(e))?;
        let path = self.path_for(ticket_id);
        let mut store = StateStore::open(&self.root).map_err(|e| progress.fail(e))?;
        if let Some(backup) = store.recovered_from() {
            warnings.push(format!(
                "state file was corrupt and was moved to {}",
                backup.display()
            ));
        }

        let live = self.git.worktrees().map_err(|e| progress.fail(e))?;

        // Already there: rewrite the record from live state and stop.
        if let Some(existing) = live.iter().find(|w| w.is_live() && w.same_path(&path)) {
            let branch = existing.branch.clone().unwrap_or(branch);
            let mut record = store
                .get(ticket_id)
                .cloned()
                .unwrap_or_else(|| WorktreeRecord::new(ticket_id, branch.clone(), path.clone()));
            record.branch_name = branch.clone();
            record.path = path.clone();
            record.status = RecordStatus::Active;
            store.upsert(record);
            store.save().map_err(|e| progress.fail(e))?;
            progress.advance(Lifecycle::Created);
            progress.advance(Lifecycle::Active);
            tracing::info!(ticket = ticket_id, path = %path.display(), "worktree already present");
            return Ok(CreateOutcome {
                ticket_id: ticket_id.to_string(),
                branch,
                path,
                created: false,
                lifecycle: progress.state,
                changes_elsewhere: Vec::new(),
                warnings,
            });
        }

        let main = self.config.effective_main_branch();
        self.git.fetch(REMOTE, main).map_err(|e| progress.fail(e))?;
        let base = format!("{REMOTE}/{main}");

        // Same branch live elsewhere is the one conflict we can pre-empt.
        if let Some(holder) = live
            .iter()
            .find(|w| w.is_live() && w.branch.as_deref() == Some(branch.as_str()))
        {
            return Err(progress.fail(VibeError::BranchAlreadyCheckedOut {
                branch,
                path: holder.path.clone(),
            }));
        }

        let views = reconcile_records(store.records(), &live);
        let changes_elsewhere = self.changes_elsewhere(&views, &base, &mut warnings);
        for wt in live.iter().filter(|w| w.is_live()) {
            if let Some(other) = wt.branch.as_deref() {
                if branch::is_prefix_collision(&branch, other) {
                    warnings.push(format!(
                        "branch '{branch}' overlaps '{other}' checked out at {}",
                        wt.path.display()
                    ));
                }
            }
        }
        match self.github.list_open_pull_requests() {
            Ok(prs) => {
                for pr in prs.iter().filter(|pr| pr.branch == branch) {
                    warnings.push(format!("an open pull request already uses '{branch}': {}", pr.url));
                }
            }
            Err(e) => warnings.push(format!("could not check open pull requests: {e}")),
        }

        // A directory deleted by hand stays registered and blocks `worktree add`.
        if live.iter().any(|w| {
            !w.is_primary
                && !w.is_live()
                && (w.same_path(&path) || w.branch.as_deref() == Some(branch.as_str()))
        }) {
            tracing::info!(ticket = ticket_id, "pruning stale worktree registration");
            self.git.prune_worktrees().map_err(|e| progress.fail(e))?;
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| progress.fail(e.into()))?;
        }
        let reuse = self
            .git
            .local_branch_exists(&branch)
            .map_err(|e| progress.fail(e))?;
        let added = if reuse {
            self.git.add_worktree_existing_branch(&path, &branch)
        } else {
            self.git.add_worktree_new_branch(&path, &branch, &base)
        };
        added.map_err(|e| progress.fail(e))?;
        progress.advance(Lifecycle::Created);
        tracing::info!(
            ticket = ticket_id,
            branch = %branch,
            path = %path.display(),
            reused_branch = reuse,
            "worktree created"
        );

        store.upsert(WorktreeRecord::new(ticket_id, branch.clone(), path.clone()));
        store.save().map_err(|e| progress.fail(e))?;
        progress.advance(Lifecycle::Active);

        if let Err(e) = self.tracker.set_status(ticket_id, IN_PROGRESS) {
            warnings.push(format!("could not mark {ticket_id} '{IN_PROGRESS}': {e}"));
        }

        Ok(CreateOutcome {
            ticket_id: ticket_id.to_string(),
            branch,
            path,
            created: true,
            lifecycle: progress.state,
            changes_elsewhere,
            warnings,
        })
    }

    fn changes_elsewhere(
        &self,
        views: &[WorktreeView],
        base: &str,
        warnings: &mut Vec<String>,
    ) -> Vec<WorktreeChanges> {
        let mut out = Vec::new();
        for view in views.iter().filter(|v| v.status == RecordStatus::Active) {
            let Some(other) = view.branch.as_deref() else {
                continue;
            };
            match self.git.changed_files(base, other) {
                Ok(files) if files.is_empty() => {}
                Ok(files) => out.push(WorktreeChanges {
                    ticket_id: view.ticket_id.clone(),
                    branch: other.to_string(),
                    files,
                }),
                Err(e) => warnings.push(format!("could not diff '{other}' against {base}: {e}")),
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // remove
    // -----------------------------------------------------------------------

    pub fn remove_for_ticket(&self, ticket_id: &str, force: bool) -> Result<RemoveOutcome> {
        let mut store = StateStore::open(&self.root)?;
        let record = store
            .get(ticket_id)
            .cloned()
            .ok_or_else(|| VibeError::WorktreeNotTracked(ticket_id.to_string()))?;

        let live = self.git.worktrees()?;
        if !live.iter().any(|w| w.is_live() && w.same_path(&record.path)) {
            return Err(VibeError::WorktreeMissing {
                ticket: ticket_id.to_string(),
                path: record.path,
            });
        }

        if !force && !self.git.status_porcelain(&record.path)?.trim().is_empty() {
            return Err(VibeError::WorktreeDirty {
                ticket: ticket_id.to_string(),
                path: record.path,
            });
        }

        self.git.remove_worktree(&record.path, force)?;
        store.remove(ticket_id);
        store.save()?;
        tracing::info!(ticket = ticket_id, path = %record.path.display(), force, "worktree removed");

        Ok(RemoveOutcome {
            ticket_id: record.ticket_id,
            branch: record.branch_name,
            path: record.path,
            lifecycle: Lifecycle::Removed,
        })
    }

    // -----------------------------------------------------------------------
    // list
    // -----------------------------------------------------------------------

    /// Every record with its live status, plus live worktrees not recorded.
    /// Read-only: a corrupt state file is reported, not moved.
    pub fn list(&self) -> Result<Vec<WorktreeView>> {
        let store = StateStore::open_strict(&self.root)?;
        let live = self.git.worktrees()?;
        Ok(reconcile_records(store.records(), &live))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{NoGitHub, NullTracker, PullRequest, Ticket};
    use crate::process::ProcessRunner;
    use crate::testutil::TestRepo;
    use std::cell::RefCell;

    struct FakeTracker {
        title: Option<String>,
        statuses: RefCell<Vec<(String, String)>>,
        fail_updates: bool,
    }

    impl FakeTracker {
        fn new(title: Option<&str>) -> Self {
            Self {
                title: title.map(str::to_string),
                statuses: RefCell::new(Vec::new()),
                fail_updates: false,
            }
        }
    }

    impl Tracker for FakeTracker {
        fn name(&self) -> &str {
            "fake"
        }

        fn get_ticket(&self, ticket_id: &str) -> Result<Option<Ticket>> {
            Ok(self.title.as_ref().map(|title| Ticket {
                id: ticket_id.to_string(),
                title: title.clone(),
                status: "Todo".to_string(),
            }))
        }

        fn set_status(&self, ticket_id: &str, status: &str) -> Result<()> {
            if self.fail_updates {
                return Err(VibeError::Collaborator("tracker is down".into()));
            }
            self.statuses
                .borrow_mut()
                .push((ticket_id.to_string(), status.to_string()));
            Ok(())
        }
    }

    struct FakeGitHub(std::result::Result<Vec<PullRequest>, String>);

    impl GitHub for FakeGitHub {
        fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>> {
            self.0.clone().map_err(VibeError::Collaborator)
        }
    }

    fn git(repo: &TestRepo) -> Git {
        Git::new(ProcessRunner::default(), &repo.root)
    }

    fn store_bytes(repo: &TestRepo) -> Option<Vec<u8>> {
        std::fs::read(paths::state_path(&repo.root)).ok()
    }

    #[test]
    fn lifecycle_transitions() {
        use Lifecycle::*;
        assert!(Requested.can_transition(Created));
        assert!(Created.can_transition(Failed));
        assert!(Active.can_transition(Removed));
        assert!(Requested.transition(Active).is_err());
        assert!(Active.transition(Failed).is_err());
        assert!(Removed.transition(Active).is_err());
    }

    #[test]
    fn create_makes_worktree_and_record() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let tracker = FakeTracker::new(None);
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &tracker, &NoGitHub).unwrap();

        let out = orch.create_for_ticket("PROJ-12").unwrap();
        assert!(out.created);
        assert_eq!(out.lifecycle, Lifecycle::Active);
        assert_eq!(out.branch, "PROJ-12");
        assert_eq!(out.path, repo.worktree_base().join("PROJ-12"));
        assert!(out.path.join("README.md").exists());

        let store = StateStore::open(&repo.root).unwrap();
        let rec = store.get("PROJ-12").unwrap();
        assert_eq!(rec.status, RecordStatus::Active);
        assert_eq!(rec.branch_name, "PROJ-12");
        assert_eq!(
            tracker.statuses.borrow().as_slice(),
            &[("PROJ-12".to_string(), "In Progress".to_string())]
        );
    }

    #[test]
    fn create_is_idempotent() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &NoGitHub).unwrap();

        let first = orch.create_for_ticket("PROJ-3").unwrap();
        let created_at = StateStore::open(&repo.root).unwrap().get("PROJ-3").unwrap().created_at;
        let second = orch.create_for_ticket("PROJ-3").unwrap();

        assert!(!second.created);
        assert_eq!(first.path, second.path);
        assert_eq!(first.branch, second.branch);
        let store = StateStore::open(&repo.root).unwrap();
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.get("PROJ-3").unwrap().created_at, created_at);
        assert_eq!(git(&repo).worktrees().unwrap().len(), 2);
    }

    #[test]
    fn retry_after_lost_record_restores_it() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &NoGitHub).unwrap();
        orch.create_for_ticket("PROJ-4").unwrap();
        std::fs::remove_file(paths::state_path(&repo.root)).unwrap();

        let again = orch.create_for_ticket("PROJ-4").unwrap();
        assert!(!again.created);
        assert!(StateStore::open(&repo.root).unwrap().get("PROJ-4").is_some());
    }

    #[test]
    fn branch_checked_out_elsewhere_is_refused() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &NoGitHub).unwrap();
        orch.create_for_ticket("PROJ-5").unwrap();

        // A second ticket id that renders to the same branch.
        let before = store_bytes(&repo);
        let err = orch.create_for_ticket("proj_5").unwrap_err();
        match err {
            VibeError::BranchAlreadyCheckedOut { branch, path } => {
                assert_eq!(branch, "PROJ-5");
                assert_eq!(path, repo.worktree_base().join("PROJ-5"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(store_bytes(&repo), before);
    }

    #[test]
    fn title_pattern_and_existing_branch() {
        let repo = TestRepo::new();
        repo.git(&["branch", "ENG-7-add-login"]);
        let mut cfg = Config::default();
        cfg.branching.pattern = Some("{PROJ}-{num}-{title}".to_string());
        let tracker = FakeTracker::new(Some("Add login"));
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &tracker, &NoGitHub).unwrap();

        let out = orch.create_for_ticket("ENG-7").unwrap();
        assert_eq!(out.branch, "ENG-7-add-login");
        let wts = git(&repo).worktrees().unwrap();
        assert!(wts
            .iter()
            .any(|w| w.branch.as_deref() == Some("ENG-7-add-login")));
    }

    #[test]
    fn warnings_for_prefix_collision_and_open_pr() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &NoGitHub).unwrap();
        orch.create_for_ticket("PROJ-1").unwrap();

        // Someone else has PROJ-1-extra checked out outside vibe.
        let extra = repo.base.join("elsewhere");
        repo.git(&[
            "worktree",
            "add",
            "-b",
            "PROJ-2-extra",
            &extra.to_string_lossy(),
        ]);

        let github = FakeGitHub(Ok(vec![PullRequest {
            branch: "PROJ-2".into(),
            url: "https://github.com/o/r/pull/9".into(),
        }]));
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &github).unwrap();
        let out = orch.create_for_ticket("PROJ-2").unwrap();
        assert!(out.created);
        assert!(out.warnings.iter().any(|w| w.contains("PROJ-2-extra")));
        assert!(out.warnings.iter().any(|w| w.contains("pull/9")));
    }

    #[test]
    fn github_failure_is_only_a_warning() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let github = FakeGitHub(Err("gh: not logged in".into()));
        let mut tracker = FakeTracker::new(None);
        tracker.fail_updates = true;
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &tracker, &github).unwrap();
        let out = orch.create_for_ticket("PROJ-6").unwrap();
        assert!(out.created);
        assert!(out.warnings.iter().any(|w| w.contains("not logged in")));
        assert!(out.warnings.iter().any(|w| w.contains("tracker is down")));
    }

    #[test]
    fn disabled_worktrees_still_create_with_warning() {
        let repo = TestRepo::new();
        let mut cfg = Config::default();
        cfg.worktrees.enabled = Some(false);
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &NoGitHub).unwrap();

        let out = orch.create_for_ticket("PROJ-8").unwrap();
        assert!(out.created);
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("worktrees.enabled: false")));
    }

    #[test]
    fn changes_in_other_worktrees_are_reported() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &NoGitHub).unwrap();
        let first = orch.create_for_ticket("PROJ-1").unwrap();
        std::fs::write(first.path.join("api.rs"), "fn api() {}\n").unwrap();
        crate::testutil::git(&first.path, &["add", "api.rs"]);
        crate::testutil::git(&first.path, &["commit", "-q", "-m", "api"]);

        let second = orch.create_for_ticket("PROJ-2").unwrap();
        assert_eq!(second.changes_elsewhere.len(), 1);
        assert_eq!(second.changes_elsewhere[0].ticket_id, "PROJ-1");
        assert_eq!(second.changes_elsewhere[0].files, vec!["api.rs".to_string()]);
    }

    #[test]
    fn invalid_ticket_id_is_rejected() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &NoGitHub).unwrap();
        assert!(matches!(
            orch.create_for_ticket("../oops"),
            Err(VibeError::InvalidTicketId(_))
        ));
    }

    #[test]
    fn remove_paths() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &NoGitHub).unwrap();

        assert!(matches!(
            orch.remove_for_ticket("PROJ-9", false),
            Err(VibeError::WorktreeNotTracked(_))
        ));

        let out = orch.create_for_ticket("PROJ-9").unwrap();
        std::fs::write(out.path.join("scratch.txt"), "wip").unwrap();
        assert!(matches!(
            orch.remove_for_ticket("PROJ-9", false),
            Err(VibeError::WorktreeDirty { .. })
        ));
        assert!(out.path.exists());
        assert!(StateStore::open(&repo.root).unwrap().get("PROJ-9").is_some());

        let removed = orch.remove_for_ticket("PROJ-9", true).unwrap();
        assert_eq!(removed.lifecycle, Lifecycle::Removed);
        assert!(!out.path.exists());
        assert!(StateStore::open(&repo.root).unwrap().get("PROJ-9").is_none());
    }

    #[test]
    fn remove_of_deleted_worktree_is_missing() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &NoGitHub).unwrap();
        let out = orch.create_for_ticket("PROJ-10").unwrap();
        std::fs::remove_dir_all(&out.path).unwrap();

        let err = orch.remove_for_ticket("PROJ-10", false).unwrap_err();
        assert!(matches!(err, VibeError::WorktreeMissing { .. }));
        assert!(err.to_string().contains("doctor --repair"));
        assert!(StateStore::open(&repo.root).unwrap().get("PROJ-10").is_some());
    }

    #[test]
    fn create_after_directory_deleted_by_hand() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &NoGitHub).unwrap();
        let first = orch.create_for_ticket("PROJ-11").unwrap();
        std::fs::remove_dir_all(&first.path).unwrap();
        crate::doctor::reconcile(
            &repo.root,
            &ProcessRunner::default(),
            crate::doctor::DoctorMode::Repair,
        )
        .unwrap();

        let again = orch.create_for_ticket("PROJ-11").unwrap();
        assert!(again.created);
        assert_eq!(again.branch, "PROJ-11");
        assert!(again.path.join("README.md").exists());
        let store = StateStore::open(&repo.root).unwrap();
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.get("PROJ-11").unwrap().status, RecordStatus::Active);
    }

    #[test]
    fn create_after_directory_deleted_without_repair() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &NoGitHub).unwrap();
        let first = orch.create_for_ticket("PROJ-13").unwrap();
        std::fs::remove_dir_all(&first.path).unwrap();

        let again = orch.create_for_ticket("PROJ-13").unwrap();
        assert!(again.created);
        assert_eq!(StateStore::open(&repo.root).unwrap().records().len(), 1);
        assert_eq!(git(&repo).worktrees().unwrap().len(), 2);
    }

    #[test]
    fn works_from_inside_a_linked_worktree() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &NoGitHub).unwrap();
        let first = orch.create_for_ticket("PROJ-20").unwrap();

        let inner = Git::new(ProcessRunner::default(), &first.path);
        let orch = WorktreeOrchestrator::new(&inner, &cfg, &NullTracker, &NoGitHub).unwrap();
        assert_eq!(orch.primary_root(), repo.root.as_path());
        let second = orch.create_for_ticket("PROJ-21").unwrap();
        assert_eq!(second.path, repo.worktree_base().join("PROJ-21"));
    }

    #[test]
    fn list_joins_records_with_live_state() {
        let repo = TestRepo::new();
        let cfg = Config::default();
        let orch = WorktreeOrchestrator::new(&git(&repo), &cfg, &NullTracker, &NoGitHub).unwrap();
        let gone = orch.create_for_ticket("PROJ-1").unwrap();
        orch.create_for_ticket("PROJ-2").unwrap();
        std::fs::remove_dir_all(&gone.path).unwrap();
        let outside = repo.base.join("side");
        repo.git(&["worktree", "add", "-b", "PROJ-30-spike", &outside.to_string_lossy()]);

        let views = orch.list().unwrap();
        let status = |t: &str| views.iter().find(|v| v.ticket_id == t).map(|v| v.status);
        assert_eq!(status("PROJ-1"), Some(RecordStatus::Stale));
        assert_eq!(status("PROJ-2"), Some(RecordStatus::Active));
        assert_eq!(status("PROJ-30"), Some(RecordStatus::Orphaned));
    }
}
