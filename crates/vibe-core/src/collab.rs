//! Narrow interfaces to the outside world: a ticket tracker and GitHub.
//!
//! Both are best-effort from the orchestrator's point of view. A failure
//! here becomes a warning, never an aborted worktree.

use crate::error::{Result, VibeError};
use crate::git::Git;
use crate::process::ProcessRunner;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub status: String,
}

pub trait Tracker {
    fn name(&self) -> &str;
    fn get_ticket(&self, ticket_id: &str) -> Result<Option<Ticket>>;
    fn set_status(&self, ticket_id: &str, status: &str) -> Result<()>;
}

/// Used when no tracker is configured: knows no tickets, accepts every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTracker;

impl Tracker for NullTracker {
    fn name(&self) -> &str {
        "none"
    }

    fn get_ticket(&self, _ticket_id: &str) -> Result<Option<Ticket>> {
        Ok(None)
    }

    fn set_status(&self, ticket_id: &str, status: &str) -> Result<()> {
        tracing::debug!(ticket = ticket_id, status, "no tracker configured; status not sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(rename = "headRefName")]
    pub branch: String,
    pub url: String,
}

pub trait GitHub {
    fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>>;
}

/// GitHub through the `gh` CLI, run inside the repository.
#[derive(Debug, Clone)]
pub struct GhCli {
    runner: ProcessRunner,
    repo: PathBuf,
}

impl GhCli {
    pub fn new(runner: ProcessRunner, repo: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            repo: repo.into(),
        }
    }

    /// `None` unless `gh` is on PATH and `origin` points at GitHub.
    pub fn detect(git: &Git) -> Option<Self> {
        which::which("gh").ok()?;
        let url = git.remote_url("origin").ok().flatten()?;
        if !is_github_url(&url) {
            tracing::debug!(url = %url, "origin is not on GitHub");
            return None;
        }
        Some(Self::new(git.runner().clone(), git.repo()))
    }
}

impl GitHub for GhCli {
    fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>> {
        let out = self
            .runner
            .run_checked(
                "gh",
                &["pr", "list", "--state", "open", "--json", "headRefName,url", "--limit", "200"],
                Some(&self.repo),
            )
            .map_err(|e| VibeError::Collaborator(format!("gh pr list failed: {e}")))?;
        parse_pull_requests(&out.stdout)
    }
}

pub fn parse_pull_requests(json: &str) -> Result<Vec<PullRequest>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json)
        .map_err(|e| VibeError::Collaborator(format!("unexpected gh output: {e}")))
}

/// Matches `https://github.com/o/r(.git)` and `git@github.com:o/r.git`.
pub fn is_github_url(url: &str) -> bool {
    let rest = url.split_once("://").map_or(url, |(_, r)| r);
    let rest = rest.rsplit_once('@').map_or(rest, |(_, r)| r);
    let host = rest.split([':', '/']).next().unwrap_or_default();
    host.eq_ignore_ascii_case("github.com")
}

/// Used when GitHub is unavailable; reports no pull requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGitHub;

impl GitHub for NoGitHub {
    fn list_open_pull_requests(&self) -> Result<Vec<PullRequest>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gh_json() {
        let prs = parse_pull_requests(
            r#"[{"headRefName":"PROJ-1","url":"https://github.com/o/r/pull/1"}]"#,
        )
        .unwrap();
        assert_eq!(prs.len(), 1);
        assert_eq!(prs[0].branch, "PROJ-1");
        assert!(parse_pull_requests("").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_a_collaborator_error() {
        let err = parse_pull_requests("not json").unwrap_err();
        assert_eq!(err.kind().as_str(), "COLLABORATOR");
    }

    #[test]
    fn github_urls() {
        assert!(is_github_url("https://github.com/o/r.git"));
        assert!(is_github_url("git@github.com:o/r.git"));
        assert!(is_github_url("ssh://git@github.com/o/r"));
        assert!(!is_github_url("/tmp/origin.git"));
        assert!(!is_github_url("https://gitlab.com/o/r.git"));
        assert!(!is_github_url("https://github.com.evil.io/o/r"));
    }

    #[test]
    fn null_tracker_knows_nothing() {
        let t = NullTracker;
        assert!(t.get_ticket("PROJ-1").unwrap().is_none());
        t.set_status("PROJ-1", "In Progress").unwrap();
    }
}
