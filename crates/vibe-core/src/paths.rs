use crate::error::{Result, VibeError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const VIBE_DIR: &str = ".vibe";
pub const CONFIG_FILE: &str = ".vibe/config.yaml";
pub const STATE_FILE: &str = ".vibe/local_state.json";

/// Default worktree base, relative to the primary repository root.
pub const DEFAULT_WORKTREE_BASE: &str = "../{repo}-worktrees";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

/// Resolve the worktree base directory for a repository.
///
/// `{repo}` in `base` is replaced by the primary checkout's directory name;
/// relative bases are anchored at `repo_root`.
pub fn worktree_base(repo_root: &Path, base: &str) -> PathBuf {
    let repo_name = repo_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repo".to_string());
    let expanded = base.replace("{repo}", &repo_name);
    let joined = repo_root.join(expanded);
    normalize(&joined)
}

/// Deterministic worktree location for a ticket.
pub fn worktree_path(repo_root: &Path, base: &str, ticket_id: &str) -> PathBuf {
    worktree_base(repo_root, base).join(ticket_id)
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonical form used when comparing a stored path with git's output.
/// Falls back to the lexical form when the path does not exist.
pub fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| normalize(path))
}

// ---------------------------------------------------------------------------
// Ticket id validation
// ---------------------------------------------------------------------------

static TICKET_RE: OnceLock<Regex> = OnceLock::new();

fn ticket_re() -> &'static Regex {
    TICKET_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]*$").unwrap())
}

/// Ticket ids become directory names, so they must be a single safe path segment.
pub fn validate_ticket_id(ticket_id: &str) -> Result<()> {
    if ticket_id.is_empty() || ticket_id.len() > 64 || !ticket_re().is_match(ticket_id) {
        return Err(VibeError::InvalidTicketId(ticket_id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ticket_ids() {
        for id in ["PROJ-123", "123", "sc-42", "ABC_9"] {
            validate_ticket_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
    }

    #[test]
    fn invalid_ticket_ids() {
        for id in ["", "-lead", "has space", "../escape", "a/b"] {
            assert!(validate_ticket_id(id).is_err(), "expected invalid: {id}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.vibe/config.yaml")
        );
        assert_eq!(
            state_path(root),
            PathBuf::from("/tmp/proj/.vibe/local_state.json")
        );
    }

    #[test]
    fn worktree_path_is_sibling_of_repo() {
        let root = Path::new("/work/shop");
        assert_eq!(
            worktree_path(root, DEFAULT_WORKTREE_BASE, "PROJ-7"),
            PathBuf::from("/work/shop-worktrees/PROJ-7")
        );
    }

    #[test]
    fn absolute_base_ignores_repo_root() {
        let root = Path::new("/work/shop");
        assert_eq!(
            worktree_path(root, "/scratch/{repo}", "9"),
            PathBuf::from("/scratch/shop/9")
        );
    }
}
