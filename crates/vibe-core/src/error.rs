use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VibeError {
    #[error("not a git repository: {}\n  hint: run 'git init' or pass --root <repo>", .0.display())]
    NotARepository(PathBuf),

    #[error("repository has no commits yet: {}\n  hint: create an initial commit, then re-run", .0.display())]
    EmptyRepository(PathBuf),

    #[error(
        "branch '{branch}' is already checked out at {}\n  hint: cd into that worktree, or run 'vibe doctor --repair' if it was removed by hand",
        .path.display()
    )]
    BranchAlreadyCheckedOut { branch: String, path: PathBuf },

    #[error(
        "worktree for '{ticket}' has uncommitted changes: {}\n  hint: commit or stash them, or run 'vibe worktree remove {ticket} --force'",
        .path.display()
    )]
    WorktreeDirty { ticket: String, path: PathBuf },

    #[error("no worktree is tracked for '{0}'\n  hint: run 'vibe worktree list' or 'vibe doctor --repair'")]
    WorktreeNotTracked(String),

    #[error(
        "worktree for '{ticket}' no longer exists at {}\n  hint: run 'vibe doctor --repair' to drop the stale record",
        .path.display()
    )]
    WorktreeMissing { ticket: String, path: PathBuf },

    #[error(
        "state file is unreadable: {} ({reason})\n  hint: a backup was kept; run 'vibe doctor --repair' to rebuild from live worktrees",
        .path.display()
    )]
    StateStoreCorrupt { path: PathBuf, reason: String },

    #[error("git lock contention persisted after {attempts} attempts: {command}\n  hint: check for another running git process, then retry")]
    GitLockContention { command: String, attempts: u32 },

    #[error("command timed out after {millis}ms and was terminated: {command}\n  hint: check network/credentials, or raise process.timeout_seconds")]
    GitCommandTimeout { command: String, millis: u128 },

    #[error("command failed ({}): {command}\n{stderr}", .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    GitCommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error(
        "configuration conflict on '{field}': declared '{declared}', detected '{detected}'\n  hint: edit .vibe/config.yaml to pick one, then run 'vibe reconcile --apply'"
    )]
    ConfigConflict {
        field: String,
        declared: String,
        detected: String,
    },

    #[error("invalid ticket id '{0}': use letters, digits, '-' or '_' only")]
    InvalidTicketId(String),

    #[error("invalid branch pattern '{pattern}': {reason}\n  hint: set branching.pattern in .vibe/config.yaml, e.g. '{{PROJ}}-{{num}}'")]
    InvalidBranchPattern { pattern: String, reason: String },

    #[error("failed to spawn '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("{0}")]
    Collaborator(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotARepository,
    EmptyRepository,
    BranchAlreadyCheckedOut,
    WorktreeDirty,
    WorktreeNotTracked,
    WorktreeMissing,
    StateStoreCorrupt,
    GitLockContention,
    GitCommandTimeout,
    GitCommandFailed,
    ConfigConflict,
    InvalidTicketId,
    InvalidBranchPattern,
    Collaborator,
    Io,
    Serialization,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotARepository => "NOT_A_REPOSITORY",
            ErrorKind::EmptyRepository => "EMPTY_REPOSITORY",
            ErrorKind::BranchAlreadyCheckedOut => "BRANCH_ALREADY_CHECKED_OUT",
            ErrorKind::WorktreeDirty => "WORKTREE_DIRTY",
            ErrorKind::WorktreeNotTracked => "WORKTREE_NOT_TRACKED",
            ErrorKind::WorktreeMissing => "WORKTREE_MISSING",
            ErrorKind::StateStoreCorrupt => "STATE_STORE_CORRUPT",
            ErrorKind::GitLockContention => "GIT_LOCK_CONTENTION",
            ErrorKind::GitCommandTimeout => "GIT_COMMAND_TIMEOUT",
            ErrorKind::GitCommandFailed => "GIT_COMMAND_FAILED",
            ErrorKind::ConfigConflict => "CONFIG_CONFLICT",
            ErrorKind::InvalidTicketId => "INVALID_TICKET_ID",
            ErrorKind::InvalidBranchPattern => "INVALID_BRANCH_PATTERN",
            ErrorKind::Collaborator => "COLLABORATOR",
            ErrorKind::Io => "IO",
            ErrorKind::Serialization => "SERIALIZATION",
        }
    }

    /// Whether a human must act before a retry can succeed. Everything else
    /// is an internal or environmental failure.
    pub fn needs_user_action(self) -> bool {
        !matches!(
            self,
            ErrorKind::Io | ErrorKind::Serialization | ErrorKind::Collaborator
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl VibeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VibeError::NotARepository(_) => ErrorKind::NotARepository,
            VibeError::EmptyRepository(_) => ErrorKind::EmptyRepository,
            VibeError::BranchAlreadyCheckedOut { .. } => ErrorKind::BranchAlreadyCheckedOut,
            VibeError::WorktreeDirty { .. } => ErrorKind::WorktreeDirty,
            VibeError::WorktreeNotTracked(_) => ErrorKind::WorktreeNotTracked,
            VibeError::WorktreeMissing { .. } => ErrorKind::WorktreeMissing,
            VibeError::StateStoreCorrupt { .. } => ErrorKind::StateStoreCorrupt,
            VibeError::GitLockContention { .. } => ErrorKind::GitLockContention,
            VibeError::GitCommandTimeout { .. } => ErrorKind::GitCommandTimeout,
            VibeError::GitCommandFailed { .. } => ErrorKind::GitCommandFailed,
            VibeError::ConfigConflict { .. } => ErrorKind::ConfigConflict,
            VibeError::InvalidTicketId(_) => ErrorKind::InvalidTicketId,
            VibeError::InvalidBranchPattern { .. } => ErrorKind::InvalidBranchPattern,
            VibeError::SpawnFailed { .. } | VibeError::Io(_) => ErrorKind::Io,
            VibeError::Collaborator(_) => ErrorKind::Collaborator,
            VibeError::Yaml(_) | VibeError::Json(_) => ErrorKind::Serialization,
        }
    }
}

pub type Result<T> = std::result::Result<T, VibeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_use_screaming_snake_codes() {
        let err = VibeError::BranchAlreadyCheckedOut {
            branch: "PROJ-1".into(),
            path: PathBuf::from("/tmp/wt/PROJ-1"),
        };
        assert_eq!(err.kind().as_str(), "BRANCH_ALREADY_CHECKED_OUT");
        assert!(err.kind().needs_user_action());
    }

    #[test]
    fn messages_name_the_subject_and_next_command() {
        let err = VibeError::WorktreeMissing {
            ticket: "PROJ-7".into(),
            path: PathBuf::from("/tmp/wt/PROJ-7"),
        };
        let msg = err.to_string();
        assert!(msg.contains("PROJ-7"));
        assert!(msg.contains("/tmp/wt/PROJ-7"));
        assert!(msg.contains("vibe doctor --repair"));
    }

    #[test]
    fn io_errors_are_internal() {
        let err = VibeError::from(std::io::Error::other("boom"));
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!err.kind().needs_user_action());
    }
}
