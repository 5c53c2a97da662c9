//! Branch naming: pattern templates, ticket-id parsing and name shapes.
//!
//! A pattern is a template such as `{PROJ}-{num}` or `feature/{PROJ}-{num}-{title}`.
//! Supported placeholders:
//! - `{PROJ}`  ticket project key, upper-cased (`PROJ` in `proj-12`)
//! - `{proj}`  ticket project key, lower-cased
//! - `{num}`   ticket number (required, so every ticket maps to one branch)
//! - `{title}` slugified ticket title; dropped with its leading separator
//!   when no title is known

use crate::error::{Result, VibeError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const PLACEHOLDERS: &[&str] = &["PROJ", "proj", "num", "title"];
const MAX_TITLE_LEN: usize = 30;

// ---------------------------------------------------------------------------
// Ticket ids
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRef {
    pub project: Option<String>,
    pub number: String,
}

static TICKET_KEY_RE: OnceLock<Regex> = OnceLock::new();
static BRANCH_TICKET_RE: OnceLock<Regex> = OnceLock::new();

fn ticket_key_re() -> &'static Regex {
    TICKET_KEY_RE.get_or_init(|| Regex::new(r"^(?:([A-Za-z]+)[-_])?(\d+)$").unwrap())
}

fn branch_ticket_re() -> &'static Regex {
    BRANCH_TICKET_RE
        .get_or_init(|| Regex::new(r"^(?:[A-Za-z]+/)?([A-Z]+-\d+|\d+)(?:$|[-_/])").unwrap())
}

/// Parse `PROJ-123`, `proj_123` or `123`. Anything else is not a ticket key.
pub fn parse_ticket(ticket_id: &str) -> Option<TicketRef> {
    let caps = ticket_key_re().captures(ticket_id)?;
    Some(TicketRef {
        project: caps.get(1).map(|m| m.as_str().to_string()),
        number: caps.get(2)?.as_str().to_string(),
    })
}

/// Best-effort ticket id recovered from a branch name, e.g. for a worktree
/// created outside this tool. `feature/PROJ-12-login` → `PROJ-12`.
pub fn ticket_from_branch(branch: &str) -> Option<String> {
    branch_ticket_re()
        .captures(branch)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

// ---------------------------------------------------------------------------
// Pattern validation and formatting
// ---------------------------------------------------------------------------

fn invalid(pattern: &str, reason: impl Into<String>) -> VibeError {
    VibeError::InvalidBranchPattern {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

/// Split a pattern into literal and placeholder segments.
fn segments(pattern: &str) -> Result<Vec<Segment<'_>>> {
    let mut out = Vec::new();
    let mut rest = pattern;
    while !rest.is_empty() {
        match rest.find(['{', '}']) {
            None => {
                out.push(Segment::Literal(rest));
                break;
            }
            Some(i) if rest.as_bytes()[i] == b'}' => {
                return Err(invalid(pattern, "unmatched '}'"));
            }
            Some(i) => {
                if i > 0 {
                    out.push(Segment::Literal(&rest[..i]));
                }
                let after = &rest[i + 1..];
                let end = after
                    .find('}')
                    .ok_or_else(|| invalid(pattern, "unclosed '{'"))?;
                let name = &after[..end];
                if !PLACEHOLDERS.contains(&name) {
                    return Err(invalid(pattern, format!("unknown placeholder {{{name}}}")));
                }
                out.push(Segment::Placeholder(name));
                rest = &after[end + 1..];
            }
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Check that `pattern` is a usable branch template.
pub fn validate_pattern(pattern: &str) -> Result<()> {
    if pattern.trim().is_empty() {
        return Err(invalid(pattern, "pattern is empty"));
    }
    let segs = segments(pattern)?;
    if !segs.contains(&Segment::Placeholder("num")) {
        return Err(invalid(pattern, "pattern must contain {num}"));
    }
    for seg in &segs {
        if let Segment::Literal(lit) = seg {
            if let Some(bad) = lit
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.')))
            {
                return Err(invalid(pattern, format!("character '{bad}' is not allowed")));
            }
        }
    }
    if pattern.starts_with(['/', '-', '.']) || pattern.ends_with(['/', '.']) {
        return Err(invalid(pattern, "must not start with '/', '-' or '.' or end with '/' or '.'"));
    }
    if pattern.contains("..") || pattern.contains("//") {
        return Err(invalid(pattern, "must not contain '..' or '//'"));
    }
    Ok(())
}

/// Lower-case, hyphen-separated, at most 30 characters.
pub fn slugify_title(title: &str) -> String {
    let mut out = String::new();
    let mut last_hyphen = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            out.push('-');
            last_hyphen = true;
        }
    }
    let mut out: String = out.trim_matches('-').chars().take(MAX_TITLE_LEN).collect();
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Render the branch name for `ticket_id` under `pattern`.
///
/// When the ticket id does not parse as a ticket key, or the pattern needs a
/// project key the ticket does not have, the ticket id is used verbatim.
pub fn format_branch_name(pattern: &str, ticket_id: &str, title: Option<&str>) -> Result<String> {
    let segs = segments(pattern)?;
    let Some(ticket) = parse_ticket(ticket_id) else {
        return Ok(ticket_id.to_string());
    };
    let needs_project = segs
        .iter()
        .any(|s| matches!(s, Segment::Placeholder("PROJ") | Segment::Placeholder("proj")));
    if needs_project && ticket.project.is_none() {
        return Ok(ticket_id.to_string());
    }

    let title_slug = title.map(slugify_title).filter(|s| !s.is_empty());
    let project = ticket.project.unwrap_or_default();
    let mut out = String::new();
    for seg in segs {
        match seg {
            Segment::Literal(lit) => out.push_str(lit),
            Segment::Placeholder("PROJ") => out.push_str(&project.to_ascii_uppercase()),
            Segment::Placeholder("proj") => out.push_str(&project.to_ascii_lowercase()),
            Segment::Placeholder("num") => out.push_str(&ticket.number),
            Segment::Placeholder(_) => match &title_slug {
                Some(slug) => out.push_str(slug),
                None => {
                    if out.ends_with(['-', '_', '/']) {
                        out.pop();
                    }
                }
            },
        }
    }
    Ok(out)
}

/// Two distinct branch names for what is likely the same work item:
/// one extends the other at a `-`, `_` or `/` boundary (`PROJ-12` vs
/// `PROJ-12-login`).
pub fn is_prefix_collision(a: &str, b: &str) -> bool {
    fn extends(long: &str, short: &str) -> bool {
        long.len() > short.len()
            && long.starts_with(short)
            && matches!(long.as_bytes()[short.len()], b'-' | b'_' | b'/')
    }
    a != b && (extends(a, b) || extends(b, a))
}

// ---------------------------------------------------------------------------
// Branch shapes (used by convention detection)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchShape {
    /// `PROJ-123-...`: upper-case project key followed by a number.
    ProjectNumber,
    /// `123-...`: bare ticket number.
    Number,
    /// Anything else.
    FreeText,
}

impl BranchShape {
    /// The pattern this shape suggests.
    pub fn pattern(self) -> &'static str {
        match self {
            BranchShape::ProjectNumber => "{PROJ}-{num}",
            BranchShape::Number => "{num}",
            BranchShape::FreeText => "{title}",
        }
    }

    /// Tie-break order: lower wins.
    pub fn rank(self) -> u8 {
        match self {
            BranchShape::ProjectNumber => 0,
            BranchShape::FreeText => 1,
            BranchShape::Number => 2,
        }
    }

    pub fn is_structured(self) -> bool {
        !matches!(self, BranchShape::FreeText)
    }
}

/// Classify a branch by its leading token (text before the first `-`, `_` or `/`).
pub fn branch_shape(name: &str) -> BranchShape {
    let mut tokens = name.split(['-', '_', '/']);
    let lead = tokens.next().unwrap_or("");
    if lead.is_empty() {
        return BranchShape::FreeText;
    }
    if lead.chars().all(|c| c.is_ascii_digit()) {
        return BranchShape::Number;
    }

    let letters: String = lead.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let tail = &lead[letters.len()..];
    let upper_key = !letters.is_empty() && letters.chars().all(|c| c.is_ascii_uppercase());
    if upper_key {
        // PROJ123
        if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) {
            return BranchShape::ProjectNumber;
        }
        // PROJ-123
        if tail.is_empty() {
            if let Some(next) = tokens.next() {
                if !next.is_empty() && next.chars().all(|c| c.is_ascii_digit()) {
                    return BranchShape::ProjectNumber;
                }
            }
        }
    }
    BranchShape::FreeText
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
