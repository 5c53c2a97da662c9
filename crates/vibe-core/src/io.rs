use crate::error::Result;
use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Atomically replace `path` with `data`.
///
/// The bytes go to a tempfile in the same directory, are fsynced, and the
/// tempfile is renamed over the target. A reader never observes a partially
/// written file, and a crash mid-write leaves the previous contents intact.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Move `path` aside to `<name>.corrupt-<timestamp>` and return the new path.
/// The original bytes are kept verbatim for a human to inspect.
pub fn backup_aside(path: &Path) -> Result<PathBuf> {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state".to_string());
    let backup = path.with_file_name(format!("{name}.corrupt-{stamp}"));
    std::fs::rename(path, &backup)?;
    Ok(backup)
}

fn read_gitignore(root: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(root.join(".gitignore")) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Whether `root/.gitignore` lists `entry` on a line of its own.
pub fn gitignore_has_entry(root: &Path, entry: &str) -> Result<bool> {
    Ok(read_gitignore(root)?.is_some_and(|text| text.lines().any(|l| l.trim() == entry)))
}

/// Append `entry` to `root/.gitignore` unless it is already listed,
/// creating the file when needed.
pub fn ensure_gitignore_entry(root: &Path, entry: &str) -> Result<()> {
    let current = read_gitignore(root)?.unwrap_or_default();
    if current.lines().any(|l| l.trim() == entry) {
        return Ok(());
    }
    let mut updated = current;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(entry);
    updated.push('\n');
    atomic_write(&root.join(".gitignore"), updated.as_bytes())
}
