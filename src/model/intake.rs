// File: src/model/intake.rs
//! Helpers for the meeting intake step: action items handed over as JSON
//! (typically a language-model reply) and page title construction.
use crate::model::ActionItem;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;

/// Notes shorter than this are not worth a generated title.
const MIN_NOTES_CHARS: usize = 50;
const MIN_MEANINGFUL_WORDS: usize = 3;

const FILLER_WORDS: &[&str] = &["test", "hello", "hi", "테스트", "안녕", "안녕하세요"];

/// Generated titles shorter than this are treated as failures.
const MIN_TITLE_CHARS: usize = 5;
const GENERIC_TITLES: &[&str] = &["title", "meeting", "meeting notes", "제목", "회의", "회의록"];

// 2025-10-20, 2025.10.20, 2025/10/20, 2025년 10월 20일
static FULL_DATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}\s*[-./년]\s*\d{1,2}\s*[-./월]\s*\d{1,2}\s*일?\s*").expect("full date pattern"));
// 10/20, 10-20, 10월 20일
static SHORT_DATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}\s*[-/월]\s*\d{1,2}\s*일?\s*").expect("short date pattern"));

#[derive(Debug, Deserialize)]
struct RawActionItem {
    #[serde(default)]
    task: String,
    #[serde(default)]
    assignee: Option<String>,
    #[serde(default)]
    due: Option<String>,
}

/// Parses a JSON array of `{task, assignee, due}` objects embedded in free text.
///
/// The array is taken from the first `[` to the last `]`, so code fences or
/// prose around it are ignored. Missing or blank assignee/due become `TBD`.
/// Returns an empty list when no array can be parsed.
pub fn parse_action_items_json(text: &str) -> Vec<ActionItem> {
    let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
        log::warn!("No JSON array found in action item payload");
        return Vec::new();
    };
    if end < start {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<RawActionItem>>(&text[start..=end]) {
        Ok(raw) => raw
            .into_iter()
            .map(|r| {
                ActionItem::new(
                    &r.task,
                    r.assignee.as_deref().unwrap_or_default(),
                    r.due.as_deref().unwrap_or_default(),
                )
            })
            .collect(),
        Err(e) => {
            log::warn!("Failed to parse action items: {}", e);
            Vec::new()
        }
    }
}

/// Title of the published page: `"{date} {title} – Meeting Notes"`.
pub fn page_title(date: NaiveDate, title: &str) -> String {
    format!("{} {} – Meeting Notes", date.format("%Y-%m-%d"), title.trim())
}

/// Date-only page title: `"{date} Meeting Notes"`.
pub fn date_title(date: NaiveDate) -> String {
    format!("{} Meeting Notes", date.format("%Y-%m-%d"))
}

/// Returns the date-only title to use when the notes are too thin to name.
///
/// `None` means the notes carry enough content for a real title.
pub fn fallback_title(notes: &str, date: NaiveDate) -> Option<String> {
    let fallback = date_title(date);

    if notes.trim().chars().count() < MIN_NOTES_CHARS {
        return Some(fallback);
    }

    let meaningful: HashSet<&str> = notes
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !FILLER_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();

    if meaningful.len() < MIN_MEANINGFUL_WORDS {
        Some(fallback)
    } else {
        None
    }
}

/// Cleans a model-suggested meeting name.
///
/// Strips surrounding quotes and a leading date. Returns `None` when what is
/// left is too short or a generic word, in which case the caller uses
/// `date_title`.
pub fn clean_generated_title(raw: &str) -> Option<String> {
    let line = raw.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
    let unquoted = line
        .trim()
        .trim_start_matches('#')
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '*' | '`'));
    let undated = FULL_DATE_PREFIX.replace(unquoted.trim(), "");
    let undated = SHORT_DATE_PREFIX.replace(&undated, "");
    let title = undated.trim();

    let generic = GENERIC_TITLES
        .iter()
        .any(|g| title.eq_ignore_ascii_case(g));
    if title.chars().count() < MIN_TITLE_CHARS || generic {
        None
    } else {
        Some(title.to_string())
    }
}
