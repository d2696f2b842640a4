//! The structured task record produced by extraction.
//!
//! `RawTaskDocument` mirrors whatever the language model returned, with every
//! field optional. `ParsedTask` is the validated form handed to callers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Maximum characters in a task name
pub const MAX_TASK_NAME_CHARS: usize = 200;

/// Maximum characters in a task description
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Maximum characters in an assignee name (longer names are truncated)
pub const MAX_ASSIGNEE_CHARS: usize = 50;

/// Maximum characters per tag (longer tags are truncated)
pub const MAX_TAG_CHARS: usize = 20;

/// Maximum number of tags kept on a task
pub const MAX_TAGS: usize = 5;

/// Assignee used when none was extracted
pub const UNASSIGNED: &str = "Unassigned";

/// Task priority, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    P1,
    P2,
    P3,
    P4,
}

impl Default for Priority {
    fn default() -> Self {
        Self::P3
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
            Priority::P4 => "P4",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" => Ok(Priority::P1),
            "P2" => Ok(Priority::P2),
            "P3" => Ok(Priority::P3),
            "P4" => Ok(Priority::P4),
            other => Err(format!("unknown priority '{}' (expected P1-P4)", other)),
        }
    }
}

/// A validated task extracted from free-form input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTask {
    /// Short title
    pub task_name: String,

    /// Longer description of the work
    pub description: String,

    /// Priority (P1 highest)
    pub priority: Priority,

    /// Absolute due date in UTC, always in the future when present
    pub due_date: Option<DateTime<Utc>>,

    /// Person responsible, or [`UNASSIGNED`]
    pub assignee: String,

    /// Short labels, in extraction order
    pub tags: Vec<String>,
}

/// Structured document as returned by the language model, before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTaskDocument {
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl RawTaskDocument {
    /// Parse a JSON document
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

/// Parse a due-date string from the model.
///
/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (taken as 23:59 UTC).
pub fn parse_due_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    date.and_hms_opt(23, 59, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Trim, drop empties and duplicates, truncate, and cap the tag list
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = truncate_chars(tag.trim(), MAX_TAG_CHARS);
        if tag.is_empty() || out.contains(&tag) {
            continue;
        }
        out.push(tag);
        if out.len() == MAX_TAGS {
            break;
        }
    }
    out
}

/// Normalize an assignee, falling back to [`UNASSIGNED`]
pub fn normalize_assignee(assignee: Option<String>) -> String {
    match assignee.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => truncate_chars(name, MAX_ASSIGNEE_CHARS),
        _ => UNASSIGNED.to_string(),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
