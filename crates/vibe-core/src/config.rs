use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BRANCH_PATTERN: &str = "{PROJ}-{num}";
pub const DEFAULT_MAIN_BRANCH: &str = "main";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ConfigField
// ---------------------------------------------------------------------------

/// The configuration keys reconciliation has an opinion about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfigField {
    #[serde(rename = "branching.main_branch")]
    MainBranch,
    #[serde(rename = "branching.pattern")]
    BranchPattern,
    #[serde(rename = "worktrees.enabled")]
    WorktreesEnabled,
}

impl ConfigField {
    pub fn all() -> &'static [ConfigField] {
        &[
            ConfigField::MainBranch,
            ConfigField::BranchPattern,
            ConfigField::WorktreesEnabled,
        ]
    }

    pub fn key(self) -> &'static str {
        match self {
            ConfigField::MainBranch => "branching.main_branch",
            ConfigField::BranchPattern => "branching.pattern",
            ConfigField::WorktreesEnabled => "worktrees.enabled",
        }
    }
}

impl std::fmt::Display for ConfigField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_branch: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorktreesConfig {
    /// `false` does not block `worktree create`; it only turns into a warning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_base_path() -> String {
    paths::DEFAULT_WORKTREE_BASE.to_string()
}

impl Default for WorktreesConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            base_path: default_base_path(),
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// `linear`, `shortcut`, or unset.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    200
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl ProcessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub branching: BranchingConfig,
    #[serde(default)]
    pub worktrees: WorktreesConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub process: ProcessConfig,
    /// Sections this tool does not own; kept so hand edits survive a rewrite.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            project: ProjectConfig::default(),
            branching: BranchingConfig::default(),
            worktrees: WorktreesConfig::default(),
            tracker: TrackerConfig::default(),
            process: ProcessConfig::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn exists(root: &Path) -> bool {
        paths::config_path(root).exists()
    }

    /// Load `.vibe/config.yaml`, or an empty config when the file is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Declared vs effective values
    // -----------------------------------------------------------------------

    /// The value a human wrote down for `field`, if any.
    pub fn declared(&self, field: ConfigField) -> Option<String> {
        match field {
            ConfigField::MainBranch => self.branching.main_branch.clone(),
            ConfigField::BranchPattern => self.branching.pattern.clone(),
            ConfigField::WorktreesEnabled => self.worktrees.enabled.map(|b| b.to_string()),
        }
    }

    /// Write `value` into `field`. Returns false when the value does not parse
    /// for the field's type.
    pub fn set(&mut self, field: ConfigField, value: &str) -> bool {
        match field {
            ConfigField::MainBranch => self.branching.main_branch = Some(value.to_string()),
            ConfigField::BranchPattern => self.branching.pattern = Some(value.to_string()),
            ConfigField::WorktreesEnabled => match value.parse::<bool>() {
                Ok(b) => self.worktrees.enabled = Some(b),
                Err(_) => return false,
            },
        }
        true
    }

    pub fn effective_pattern(&self) -> &str {
        self.branching
            .pattern
            .as_deref()
            .unwrap_or(DEFAULT_BRANCH_PATTERN)
    }

    pub fn effective_main_branch(&self) -> &str {
        self.branching
            .main_branch
            .as_deref()
            .unwrap_or(DEFAULT_MAIN_BRANCH)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Setting checks. The branch pattern is validated on its own by
    /// [`crate::branch::validate_pattern`].
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let Some(main) = &self.branching.main_branch {
            if main.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "branching.main_branch is empty".to_string(),
                });
            }
        }

        if self.worktrees.base_path.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "worktrees.base_path is empty".to_string(),
            });
        }

        if let Some(kind) = &self.tracker.kind {
            if !matches!(kind.as_str(), "linear" | "shortcut") {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("unknown tracker type '{kind}' (expected linear or shortcut)"),
                });
            }
        }

        if self.process.timeout_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "process.timeout_seconds must be greater than 0".to_string(),
            });
        }

        if self.process.max_attempts == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "process.max_attempts is 0; commands will run once".to_string(),
            });
        } else if self.process.max_attempts > 10 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "process.max_attempts={} (>10 is unusual)",
                    self.process.max_attempts
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
