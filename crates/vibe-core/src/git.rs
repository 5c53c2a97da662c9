//! Typed access to the handful of git plumbing commands vibe relies on.
//!
//! Everything goes through [`ProcessRunner`], so every call inherits the
//! timeout and lock-contention retry policy. Parsing of porcelain output is
//! kept in free functions so it can be tested without a repository.

use crate::error::{Result, VibeError};
use crate::paths;
use crate::process::ProcessRunner;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// LiveWorktree
// ---------------------------------------------------------------------------

/// One entry of `git worktree list --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveWorktree {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    /// Short branch name; `None` when detached or bare.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub bare: bool,
    pub detached: bool,
    pub locked: bool,
    pub prunable: bool,
    /// The first entry git reports is the main checkout.
    pub is_primary: bool,
}

impl LiveWorktree {
    fn new(path: PathBuf, is_primary: bool) -> Self {
        Self {
            path,
            head: None,
            branch: None,
            bare: false,
            detached: false,
            locked: false,
            prunable: false,
            is_primary,
        }
    }

    /// Git still lists worktrees whose directory was deleted by hand; those
    /// are marked prunable and are not live.
    pub fn is_live(&self) -> bool {
        !self.prunable && self.path.exists()
    }

    pub fn same_path(&self, other: &Path) -> bool {
        paths::canonical(&self.path) == paths::canonical(other)
    }
}

/// Parse the blank-line separated records of `git worktree list --porcelain`.
pub fn parse_worktree_porcelain(text: &str) -> Vec<LiveWorktree> {
    let mut out: Vec<LiveWorktree> = Vec::new();
    let mut current: Option<LiveWorktree> = None;

    for line in text.lines() {
        if line.trim().is_empty() {
            if let Some(wt) = current.take() {
                out.push(wt);
            }
            continue;
        }
        let (key, value) = match line.split_once(' ') {
            Some((k, v)) => (k, v),
            None => (line, ""),
        };
        if key == "worktree" {
            if let Some(wt) = current.take() {
                out.push(wt);
            }
            let is_primary = out.is_empty();
            current = Some(LiveWorktree::new(PathBuf::from(value), is_primary));
            continue;
        }
        let Some(wt) = current.as_mut() else {
            continue;
        };
        match key {
            "HEAD" => wt.head = Some(value.to_string()),
            "branch" => {
                wt.branch = Some(value.strip_prefix("refs/heads/").unwrap_or(value).to_string())
            }
            "bare" => wt.bare = true,
            "detached" => wt.detached = true,
            "locked" => wt.locked = true,
            "prunable" => wt.prunable = true,
            _ => {}
        }
    }
    if let Some(wt) = current {
        out.push(wt);
    }
    out
}

// ---------------------------------------------------------------------------
// BranchRef
// ---------------------------------------------------------------------------

/// A local or remote-tracking branch with its tip's committer time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    /// Short name with any `<remote>/` prefix removed.
    pub name: String,
    pub remote: Option<String>,
    /// Unix seconds of the tip commit.
    pub committed_at: i64,
}

/// Parse `for-each-ref --format=%(refname)%09%(committerdate:unix)` output.
pub fn parse_branch_refs(text: &str) -> Vec<BranchRef> {
    text.lines()
        .filter_map(|line| {
            let (refname, stamp) = line.split_once('\t')?;
            let committed_at = stamp.trim().parse().unwrap_or(0);
            if let Some(name) = refname.strip_prefix("refs/heads/") {
                return Some(BranchRef {
                    name: name.to_string(),
                    remote: None,
                    committed_at,
                });
            }
            let rest = refname.strip_prefix("refs/remotes/")?;
            let (remote, name) = rest.split_once('/')?;
            Some(BranchRef {
                name: name.to_string(),
                remote: Some(remote.to_string()),
                committed_at,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Git {
    runner: ProcessRunner,
    repo: PathBuf,
}

impl Git {
    pub fn new(runner: ProcessRunner, repo: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            repo: repo.into(),
        }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        Ok(self.runner.git(&self.repo, args)?.stdout)
    }

    fn probe(&self, args: &[&str]) -> Result<bool> {
        Ok(self.runner.git_probe(&self.repo, args)?.success())
    }

    // -----------------------------------------------------------------------
    // Repository state
    // -----------------------------------------------------------------------

    pub fn is_repository(&self) -> Result<bool> {
        if !self.repo.is_dir() {
            return Ok(false);
        }
        self.probe(&["rev-parse", "--git-dir"])
    }

    pub fn has_commits(&self) -> Result<bool> {
        self.probe(&["rev-parse", "--verify", "--quiet", "HEAD"])
    }

    /// Fail with `NOT_A_REPOSITORY` / `EMPTY_REPOSITORY` before any inference.
    pub fn ensure_ready(&self) -> Result<()> {
        if !self.is_repository()? {
            return Err(VibeError::NotARepository(self.repo.clone()));
        }
        if !self.has_commits()? {
            return Err(VibeError::EmptyRepository(self.repo.clone()));
        }
        Ok(())
    }

    /// Root of the main checkout, also when `repo` is a linked worktree.
    pub fn primary_root(&self) -> Result<PathBuf> {
        if let Some(primary) = self.worktrees()?.into_iter().find(|w| w.is_primary && !w.bare) {
            return Ok(primary.path);
        }
        let common = self.run(&["rev-parse", "--git-common-dir"])?;
        let common = self.repo.join(common.trim());
        let common = paths::canonical(&common);
        match (common.file_name(), common.parent()) {
            (Some(name), Some(parent)) if name == ".git" => Ok(parent.to_path_buf()),
            _ => Ok(common),
        }
    }

    // -----------------------------------------------------------------------
    // Refs
    // -----------------------------------------------------------------------

    /// The branch `refs/remotes/<remote>/HEAD` points at, without the remote prefix.
    pub fn remote_head(&self, remote: &str) -> Result<Option<String>> {
        let symref = format!("refs/remotes/{remote}/HEAD");
        let out = self
            .runner
            .git_probe(&self.repo, &["symbolic-ref", "--quiet", &symref])?;
        if !out.success() {
            return Ok(None);
        }
        let target = out.stdout.trim();
        let prefix = format!("refs/remotes/{remote}/");
        Ok(target
            .strip_prefix(&prefix)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }

    pub fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        let out = self
            .runner
            .git_probe(&self.repo, &["remote", "get-url", remote])?;
        Ok(Some(out.stdout.trim().to_string()).filter(|u| out.success() && !u.is_empty()))
    }

    /// Every local and remote-tracking branch.
    pub fn branches(&self) -> Result<Vec<BranchRef>> {
        let out = self.run(&[
            "for-each-ref",
            "--format=%(refname)\t%(committerdate:unix)",
            "refs/heads",
            "refs/remotes",
        ])?;
        Ok(parse_branch_refs(&out))
    }

    pub fn local_branch_exists(&self, name: &str) -> Result<bool> {
        let refname = format!("refs/heads/{name}");
        self.probe(&["show-ref", "--verify", "--quiet", &refname])
    }

    /// True if `rev` names a commit (`main`, `origin/main`, a sha).
    pub fn resolves(&self, rev: &str) -> Result<bool> {
        let spec = format!("{rev}^{{commit}}");
        self.probe(&["rev-parse", "--verify", "--quiet", &spec])
    }

    pub fn fetch(&self, remote: &str, branch: &str) -> Result<()> {
        self.run(&["fetch", remote, branch])?;
        Ok(())
    }

    /// Files changed on `branch` since it diverged from `base`.
    pub fn changed_files(&self, base: &str, branch: &str) -> Result<Vec<String>> {
        let range = format!("{base}...{branch}");
        let out = self.run(&["diff", "--name-only", &range])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    // -----------------------------------------------------------------------
    // Worktrees
    // -----------------------------------------------------------------------

    pub fn worktrees(&self) -> Result<Vec<LiveWorktree>> {
        let out = self.run(&["worktree", "list", "--porcelain"])?;
        Ok(parse_worktree_porcelain(&out))
    }

    /// Create `branch` from `start_point` and check it out at `path`.
    pub fn add_worktree_new_branch(&self, path: &Path, branch: &str, start_point: &str) -> Result<()> {
        let path = path.to_string_lossy();
        self.run(&["worktree", "add", "-b", branch, &path, start_point])?;
        Ok(())
    }

    /// Check out an existing local branch at `path`.
    pub fn add_worktree_existing_branch(&self, path: &Path, branch: &str) -> Result<()> {
        let path = path.to_string_lossy();
        self.run(&["worktree", "add", &path, branch])?;
        Ok(())
    }

    pub fn remove_worktree(&self, path: &Path, force: bool) -> Result<()> {
        let path = path.to_string_lossy();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&path);
        self.run(&args)?;
        Ok(())
    }

    /// Drop registrations whose worktree directory no longer exists.
    pub fn prune_worktrees(&self) -> Result<()> {
        self.run(&["worktree", "prune"])?;
        Ok(())
    }

    /// `git status --porcelain` inside `worktree`; empty means clean.
    pub fn status_porcelain(&self, worktree: &Path) -> Result<String> {
        Ok(self.runner.git(worktree, &["status", "--porcelain"])?.stdout)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestRepo;
    use tempfile::TempDir;

    const PORCELAIN: &str = "\
worktree /work/shop
HEAD 1111111111111111111111111111111111111111
branch refs/heads/main

worktree /work/shop-worktrees/PROJ-1
HEAD 2222222222222222222222222222222222222222
branch refs/heads/PROJ-1

worktree /work/shop-worktrees/gone
HEAD 3333333333333333333333333333333333333333
branch refs/heads/PROJ-2
prunable gitdir file points to non-existent location

worktree /work/shop-worktrees/probe
HEAD 4444444444444444444444444444444444444444
detached
locked reason here
";

    #[test]
    fn parses_porcelain_entries() {
        let wts = parse_worktree_porcelain(PORCELAIN);
        assert_eq!(wts.len(), 4);
        assert!(wts[0].is_primary);
        assert_eq!(wts[0].branch.as_deref(), Some("main"));
        assert!(!wts[1].is_primary);
        assert_eq!(wts[1].path, PathBuf::from("/work/shop-worktrees/PROJ-1"));
        assert!(wts[2].prunable);
        assert!(wts[3].detached && wts[3].locked);
        assert_eq!(wts[3].branch, None);
    }

    #[test]
    fn parses_bare_primary() {
        let wts = parse_worktree_porcelain("worktree /srv/repo.git\nbare\n");
        assert_eq!(wts.len(), 1);
        assert!(wts[0].bare && wts[0].is_primary);
    }

    #[test]
    fn parses_branch_refs() {
        let refs = parse_branch_refs(
            "refs/heads/main\t1700000000\nrefs/remotes/origin/PROJ-1\t1700000100\nrefs/remotes/origin/HEAD\t1700000000\n",
        );
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].remote, None);
        assert_eq!(refs[1].name, "PROJ-1");
        assert_eq!(refs[1].remote.as_deref(), Some("origin"));
        assert_eq!(refs[1].committed_at, 1_700_000_100);
        assert_eq!(refs[2].name, "HEAD");
    }

    #[test]
    fn plain_directory_is_not_a_repository() {
        let dir = TempDir::new().unwrap();
        let git = Git::new(ProcessRunner::default(), dir.path());
        let err = git.ensure_ready().unwrap_err();
        assert!(matches!(err, VibeError::NotARepository(_)));
    }

    #[test]
    fn fresh_init_is_empty_repository() {
        let dir = TempDir::new().unwrap();
        crate::testutil::git(dir.path(), &["init", "-q", "-b", "main"]);
        let git = Git::new(ProcessRunner::default(), dir.path());
        let err = git.ensure_ready().unwrap_err();
        assert!(matches!(err, VibeError::EmptyRepository(_)));
    }

    #[test]
    fn remote_head_and_branches() {
        let repo = TestRepo::new();
        let git = Git::new(ProcessRunner::default(), &repo.root);
        git.ensure_ready().unwrap();
        assert_eq!(git.remote_head("origin").unwrap().as_deref(), Some("main"));
        assert!(git.resolves("origin/main").unwrap());
        assert!(!git.resolves("origin/nope").unwrap());
        assert!(git.local_branch_exists("main").unwrap());
        assert_eq!(
            git.remote_url("origin").unwrap(),
            Some(repo.origin.to_string_lossy().into_owned())
        );
        assert_eq!(git.remote_url("upstream").unwrap(), None);

        let names: Vec<_> = git.branches().unwrap().into_iter().map(|b| b.name).collect();
        assert!(names.contains(&"main".to_string()));
    }

    #[test]
    fn worktree_add_list_remove() {
        let repo = TestRepo::new();
        let git = Git::new(ProcessRunner::default(), &repo.root);
        let path = repo.base.join("wt").join("PROJ-5");
        git.add_worktree_new_branch(&path, "PROJ-5", "origin/main").unwrap();

        let wts = git.worktrees().unwrap();
        assert_eq!(wts.len(), 2);
        let linked = wts.iter().find(|w| !w.is_primary).unwrap();
        assert!(linked.same_path(&path));
        assert!(linked.is_live());
        assert_eq!(linked.branch.as_deref(), Some("PROJ-5"));

        // Primary root is found from inside the linked worktree too.
        let from_linked = Git::new(ProcessRunner::default(), &path);
        assert_eq!(
            paths::canonical(&from_linked.primary_root().unwrap()),
            paths::canonical(&repo.root)
        );

        assert!(git.status_porcelain(&path).unwrap().trim().is_empty());
        git.remove_worktree(&path, false).unwrap();
        assert_eq!(git.worktrees().unwrap().len(), 1);
    }

    #[test]
    fn changed_files_lists_branch_diff() {
        let repo = TestRepo::new();
        repo.git(&["checkout", "-q", "-b", "PROJ-8"]);
        repo.commit("src/lib.rs", "pub fn x() {}\n", "add lib");
        repo.git(&["checkout", "-q", "main"]);
        let git = Git::new(ProcessRunner::default(), &repo.root);
        assert_eq!(
            git.changed_files("origin/main", "PROJ-8").unwrap(),
            vec!["src/lib.rs".to_string()]
        );
    }
}
