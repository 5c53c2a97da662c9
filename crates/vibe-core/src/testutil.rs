//! Throwaway git repositories for tests.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run git with a fixed identity and no signing; panics on failure.
pub fn git(cwd: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args([
            "-c",
            "user.name=vibe-test",
            "-c",
            "user.email=vibe-test@example.com",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "init.defaultBranch=main",
        ])
        .args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("spawn git");
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).into_owned()
}

/// `<tmp>/shop` with one commit on `main`, pushed to a bare `<tmp>/origin.git`
/// with `origin/HEAD` set.
pub struct TestRepo {
    _dir: TempDir,
    /// The temp directory; sibling worktree dirs land here.
    pub base: PathBuf,
    pub root: PathBuf,
    pub origin: PathBuf,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let base = dir.path().canonicalize().unwrap();
        let root = base.join("shop");
        let origin = base.join("origin.git");
        std::fs::create_dir_all(&root).unwrap();

        git(&base, &["init", "-q", "--bare", "-b", "main", "origin.git"]);
        git(&root, &["init", "-q", "-b", "main"]);
        std::fs::write(root.join("README.md"), "# shop\n").unwrap();
        git(&root, &["add", "."]);
        git(&root, &["commit", "-q", "-m", "initial"]);
        git(&root, &["remote", "add", "origin", &origin.to_string_lossy()]);
        git(&root, &["push", "-q", "-u", "origin", "main"]);
        git(&root, &["remote", "set-head", "origin", "main"]);

        Self {
            _dir: dir,
            base,
            root,
            origin,
        }
    }

    pub fn git(&self, args: &[&str]) -> String {
        git(&self.root, args)
    }

    /// Write `file` and commit it on the current branch.
    pub fn commit(&self, file: &str, contents: &str, message: &str) {
        let path = self.root.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
        self.git(&["add", file]);
        self.git(&["commit", "-q", "-m", message]);
    }

    /// Create local branches at the current HEAD.
    pub fn branches(&self, names: &[&str]) {
        for name in names {
            self.git(&["branch", name]);
        }
    }

    pub fn worktree_base(&self) -> PathBuf {
        self.base.join("shop-worktrees")
    }
}
