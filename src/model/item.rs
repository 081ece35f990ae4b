// File: src/model/item.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used when an assignee or due date is not known yet.
pub const TBD: &str = "TBD";

/// Due date of an action item. Absence is never an empty string, it is `Tbd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Due {
    Date(NaiveDate),
    Tbd,
}

impl Due {
    /// Lenient parse used for user and model supplied values.
    /// Accepts `YYYY-MM-DD` and `YYYY/MM/DD`; anything else becomes `Tbd`.
    pub fn parse(input: &str) -> Self {
        let normalized = input.trim().replace('/', "-");
        NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
            .map(Due::Date)
            .unwrap_or(Due::Tbd)
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Due::Date(d) => Some(*d),
            Due::Tbd => None,
        }
    }

    pub fn is_tbd(&self) -> bool {
        matches!(self, Due::Tbd)
    }
}

impl fmt::Display for Due {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Due::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Due::Tbd => f.write_str(TBD),
        }
    }
}

impl From<String> for Due {
    fn from(value: String) -> Self {
        Due::parse(&value)
    }
}

impl From<Due> for String {
    fn from(value: Due) -> Self {
        value.to_string()
    }
}

/// An action item as captured from a meeting, before it is published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub task: String,
    pub assignee: String,
    pub due: Due,
}

impl ActionItem {
    /// Builds an item, normalizing blank assignee / due values to `TBD`.
    pub fn new(task: &str, assignee: &str, due: &str) -> Self {
        let assignee = assignee.trim().trim_start_matches('@');
        Self {
            task: task.trim().to_string(),
            assignee: if assignee.is_empty() {
                TBD.to_string()
            } else {
                assignee.to_string()
            },
            due: Due::parse(due),
        }
    }

    /// Checkbox line in the markdown dialect understood by the converter,
    /// e.g. `- [ ] Fix bug — @alice — Due: 2025-10-27`.
    pub fn to_markdown_line(&self) -> String {
        format!("- [ ] {} — @{} — Due: {}", self.task, self.assignee, self.due)
    }
}

/// An incomplete action item recovered from a published page.
///
/// `due` is the raw `YYYY-MM-DD` string found in the markup. It is only
/// parsed when classified, so a malformed date survives extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedActionItem {
    pub task: String,
    pub assignee: String,
    pub due: String,
    pub page_url: String,
    pub page_title: String,
}

impl ParsedActionItem {
    pub fn due_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.due.trim(), "%Y-%m-%d").ok()
    }
}
