use crate::branch;
use crate::config::{Config, ConfigField};
use crate::detector::{Signal, SignalCategory};
use crate::error::VibeError;
use serde::{Deserialize, Serialize};

/// Below this an undeclared field is left for a human to configure.
pub const ADOPT_THRESHOLD: f64 = 0.5;
/// At or above this a disagreement with a declared value is a conflict.
pub const CONFLICT_THRESHOLD: f64 = 0.8;

// ---------------------------------------------------------------------------
// Action (output)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Adopt,
    Configure,
    Skip,
    Conflict,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Adopt => "ADOPT",
            ActionKind::Configure => "CONFIGURE",
            ActionKind::Skip => "SKIP",
            ActionKind::Conflict => "CONFLICT",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub target_field: ConfigField,
    pub current_value: Option<String>,
    pub suggested_value: Option<String>,
    pub auto_applicable: bool,
    /// Confidence of the signal behind the suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub note: String,
}

impl Action {
    /// The error a human sees for an unresolved conflict.
    pub fn conflict_error(&self) -> Option<VibeError> {
        if self.kind != ActionKind::Conflict {
            return None;
        }
        Some(VibeError::ConfigConflict {
            field: self.target_field.key().to_string(),
            declared: self.current_value.clone().unwrap_or_default(),
            detected: self.suggested_value.clone().unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

fn category_for(field: ConfigField) -> SignalCategory {
    match field {
        ConfigField::MainBranch => SignalCategory::MainBranch,
        ConfigField::BranchPattern => SignalCategory::BranchPattern,
        ConfigField::WorktreesEnabled => SignalCategory::WorktreeUsage,
    }
}

/// Highest-confidence signal of `category`; the earliest wins a tie.
pub fn strongest(signals: &[Signal], category: SignalCategory) -> Option<&Signal> {
    signals
        .iter()
        .filter(|s| s.category == category)
        .fold(None, |best: Option<&Signal>, s| match best {
            Some(b) if b.confidence >= s.confidence => Some(b),
            _ => Some(s),
        })
}

/// One action per configuration field, sorted by field key.
///
/// Pure: the same signals and config always produce the same actions.
pub fn classify(signals: &[Signal], config: &Config) -> Vec<Action> {
    let mut actions: Vec<Action> = ConfigField::all()
        .iter()
        .map(|&field| {
            let declared = config
                .declared(field)
                .filter(|v| !v.trim().is_empty());
            decide(field, declared, strongest(signals, category_for(field)))
        })
        .collect();
    actions.sort_by(|a, b| a.target_field.key().cmp(b.target_field.key()));
    actions
}

fn decide(field: ConfigField, declared: Option<String>, signal: Option<&Signal>) -> Action {
    let Some(signal) = signal else {
        return match declared {
            Some(current) => Action {
                kind: ActionKind::Skip,
                target_field: field,
                current_value: Some(current),
                suggested_value: None,
                auto_applicable: true,
                confidence: None,
                note: "no evidence in the repository; keeping the declared value".to_string(),
            },
            None => Action {
                kind: ActionKind::Configure,
                target_field: field,
                current_value: None,
                suggested_value: None,
                auto_applicable: false,
                confidence: None,
                note: format!("nothing detected; set {field} by hand"),
            },
        };
    };

    let confidence = signal.confidence;
    let suggested = signal.value.clone();
    let base = Action {
        kind: ActionKind::Skip,
        target_field: field,
        current_value: declared.clone(),
        suggested_value: Some(suggested.clone()),
        auto_applicable: true,
        confidence: Some(confidence),
        note: signal.detail.clone(),
    };

    match declared {
        None if confidence < ADOPT_THRESHOLD => Action {
            kind: ActionKind::Configure,
            auto_applicable: false,
            note: format!("weak evidence ({}); confirm {field} by hand", signal.detail),
            ..base
        },
        None if field == ConfigField::BranchPattern
            && branch::validate_pattern(&suggested).is_err() =>
        {
            Action {
                kind: ActionKind::Configure,
                auto_applicable: false,
                note: format!(
                    "branch names carry no ticket key ({}); choose a pattern with {{num}}",
                    signal.detail
                ),
                ..base
            }
        }
        None => Action {
            kind: ActionKind::Adopt,
            ..base
        },
        Some(current) if current == suggested => Action {
            note: "declared value matches the repository".to_string(),
            ..base
        },
        Some(_) if confidence >= CONFLICT_THRESHOLD => Action {
            kind: ActionKind::Conflict,
            auto_applicable: false,
            note: format!("declared value disagrees with strong evidence ({})", signal.detail),
            ..base
        },
        Some(_) => Action {
            note: format!("inconclusive evidence ({}); keeping the declared value", signal.detail),
            ..base
        },
    }
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

/// Write every auto-applicable ADOPT into `config`. Returns the fields changed.
///
/// Conflicts are never applied; callers surface them via
/// [`Action::conflict_error`].
pub fn apply(actions: &[Action], config: &mut Config) -> Vec<ConfigField> {
    let mut changed = Vec::new();
    for action in actions {
        if action.kind != ActionKind::Adopt || !action.auto_applicable {
            continue;
        }
        let Some(value) = &action.suggested_value else {
            continue;
        };
        if config.set(action.target_field, value) {
            tracing::info!(field = %action.target_field, value = %value, "adopted");
            changed.push(action.target_field);
        } else {
            tracing::warn!(field = %action.target_field, value = %value, "value does not fit field; skipped");
        }
    }
    changed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
