//! The local state file: this tool's belief about which ticket worktrees exist.
//!
//! The store is a cache of intent. Ground truth is always
//! `git worktree list`, and anything user-visible reconciles against it first.
//! Writes replace the file atomically; fields this version does not know
//! about are carried through untouched.

use crate::detector::Signal;
use crate::error::{Result, VibeError};
use crate::io;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const STATE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// WorktreeRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    /// Recorded here, but the worktree is gone.
    Stale,
    /// Live in git, but was not recorded here.
    Orphaned,
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecordStatus::Active => "active",
            RecordStatus::Stale => "stale",
            RecordStatus::Orphaned => "orphaned",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorktreeRecord {
    pub ticket_id: String,
    pub branch_name: String,
    /// Absolute path of the worktree directory.
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub status: RecordStatus,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl WorktreeRecord {
    pub fn new(ticket_id: impl Into<String>, branch_name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            branch_name: branch_name.into(),
            path,
            created_at: Utc::now(),
            status: RecordStatus::Active,
            extra: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// LocalState (on-disk shape)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub worktrees: Vec<WorktreeRecord>,
    /// Signals from the most recent detection run.
    #[serde(default)]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub last_doctor_run: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl Default for LocalState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            worktrees: Vec::new(),
            signals: Vec::new(),
            last_doctor_run: None,
            extra: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: LocalState,
    recovered_from: Option<PathBuf>,
}

impl StateStore {
    /// Open the store under `root`. A corrupt file is moved aside to
    /// `local_state.json.corrupt-<timestamp>` and an empty store is used;
    /// [`StateStore::recovered_from`] then names the backup.
    pub fn open(root: &Path) -> Result<Self> {
        let path = paths::state_path(root);
        match Self::read(&path) {
            Ok(state) => Ok(Self {
                path,
                state,
                recovered_from: None,
            }),
            Err(VibeError::StateStoreCorrupt { reason, .. }) => {
                let backup = io::backup_aside(&path)?;
                tracing::warn!(
                    backup = %backup.display(),
                    %reason,
                    "state file was corrupt; moved aside and starting fresh"
                );
                Ok(Self {
                    path,
                    state: LocalState::default(),
                    recovered_from: Some(backup),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Open without touching the filesystem; corruption is an error.
    pub fn open_strict(root: &Path) -> Result<Self> {
        let path = paths::state_path(root);
        let state = Self::read(&path)?;
        Ok(Self {
            path,
            state,
            recovered_from: None,
        })
    }

    fn read(path: &Path) -> Result<LocalState> {
        if !path.exists() {
            return Ok(LocalState::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(LocalState::default());
        }
        let mut state: LocalState =
            serde_json::from_str(&data).map_err(|e| VibeError::StateStoreCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if state.version > STATE_VERSION {
            tracing::warn!(
                version = state.version,
                "state file was written by a newer vibe; unknown fields are preserved"
            );
        }
        // Later duplicates win; ticket ids are the key.
        let mut by_ticket: BTreeMap<String, WorktreeRecord> = BTreeMap::new();
        for rec in state.worktrees.drain(..) {
            by_ticket.insert(rec.ticket_id.clone(), rec);
        }
        state.worktrees = by_ticket.into_values().collect();
        Ok(state)
    }

    pub fn save(&self) -> Result<()> {
        let mut data = serde_json::to_string_pretty(&self.state)?;
        data.push('\n');
        io::atomic_write(&self.path, data.as_bytes())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn recovered_from(&self) -> Option<&Path> {
        self.recovered_from.as_deref()
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    /// Records ordered by ticket id.
    pub fn records(&self) -> &[WorktreeRecord] {
        &self.state.worktrees
    }

    pub fn get(&self, ticket_id: &str) -> Option<&WorktreeRecord> {
        self.state.worktrees.iter().find(|r| r.ticket_id == ticket_id)
    }

    /// Insert or replace the record for `record.ticket_id`. Fields on the
    /// old record this version does not know about are kept.
    pub fn upsert(&mut self, mut record: WorktreeRecord) {
        let records = &mut self.state.worktrees;
        match records.binary_search_by(|r| r.ticket_id.cmp(&record.ticket_id)) {
            Ok(i) => {
                for (k, v) in std::mem::take(&mut records[i].extra) {
                    record.extra.entry(k).or_insert(v);
                }
                records[i] = record;
            }
            Err(i) => records.insert(i, record),
        }
    }

    pub fn remove(&mut self, ticket_id: &str) -> Option<WorktreeRecord> {
        let i = self
            .state
            .worktrees
            .iter()
            .position(|r| r.ticket_id == ticket_id)?;
        Some(self.state.worktrees.remove(i))
    }

    /// Returns true if the status changed.
    pub fn set_status(&mut self, ticket_id: &str, status: RecordStatus) -> bool {
        match self
            .state
            .worktrees
            .iter_mut()
            .find(|r| r.ticket_id == ticket_id)
        {
            Some(rec) if rec.status != status => {
                rec.status = status;
                true
            }
            _ => false,
        }
    }

    // -----------------------------------------------------------------------
    // Signals / doctor bookkeeping
    // -----------------------------------------------------------------------

    pub fn signals(&self) -> &[Signal] {
        &self.state.signals
    }

    pub fn set_signals(&mut self, signals: Vec<Signal>) {
        self.state.signals = signals;
    }

    pub fn last_doctor_run(&self) -> Option<DateTime<Utc>> {
        self.state.last_doctor_run
    }

    pub fn mark_doctor_run(&mut self, at: DateTime<Utc>) {
        self.state.last_doctor_run = Some(at);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
