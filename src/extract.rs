// File: src/extract.rs
//! Recovers open action items from published page markup.
use crate::markup::TaskStatus;
use crate::markup::scanner;
use crate::model::{ParsedActionItem, TBD};
use once_cell::sync::Lazy;
use regex::Regex;

static ASSIGNEE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([^\s—]+)").expect("assignee pattern"));
static DUE_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Due:\s*(\d{4}-\d{2}-\d{2})").expect("due text pattern"));
// `— @name — ...` tail that repeats the owner and due date.
static ATTRIBUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"—\s*@.*?—.*").expect("attribution pattern"));

/// Extracts the incomplete action items of one page that have a concrete due date.
///
/// Completed tasks, tasks with no due date and tasks due `TBD` are skipped.
/// A missing assignee becomes `TBD`.
pub fn extract(markup: &str, page_url: &str, page_title: &str) -> Vec<ParsedActionItem> {
    let mut items = Vec::new();

    for raw in scanner::scan_tasks(markup) {
        if TaskStatus::parse(&raw.status) != Some(TaskStatus::Incomplete) {
            continue;
        }

        let text = raw.text.as_str();

        let assignee = ASSIGNEE_RE
            .captures(text)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| TBD.to_string());

        let due = raw
            .time
            .clone()
            .or_else(|| DUE_TEXT_RE.captures(text).map(|c| c[1].to_string()));

        let task = ATTRIBUTION_RE.replace(text, "").trim().to_string();

        match due {
            Some(due) if !task.is_empty() && due != TBD => items.push(ParsedActionItem {
                task,
                assignee,
                due,
                page_url: page_url.to_string(),
                page_title: page_title.to_string(),
            }),
            _ => log::debug!(
                "Skipping task {} on '{}': no schedulable due date",
                raw.id,
                page_title
            ),
        }
    }

    items
}

/// Counts checkbox markers in meeting markdown as `(complete, incomplete)`.
pub fn extract_action_items_count(markdown: &str) -> (usize, usize) {
    let incomplete = markdown.matches("- [ ]").count();
    let complete = markdown.matches("- [x]").count() + markdown.matches("- [X]").count();
    (complete, incomplete)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(body: &str) -> String {
        format!(
            "<ac:task><ac:task-id>1</ac:task-id><ac:task-status>incomplete</ac:task-status>\
             <ac:task-body>{}</ac:task-body></ac:task>",
            body
        )
    }

    #[test]
    fn time_tag_wins_over_text() {
        let items = extract(
            &task(r#"Ship — @ann — <time datetime="2025-11-02"></time> (was Due: 2025-10-01)"#),
            "u",
            "t",
        );
        assert_eq!(items[0].due, "2025-11-02");
    }

    #[test]
    fn empty_datetime_falls_back_to_text() {
        let items = extract(&task(r#"Ship <time datetime=""></time> Due: 2025-10-01"#), "u", "t");
        assert_eq!(items[0].due, "2025-10-01");
    }

    #[test]
    fn counts_mixed_case_checked_boxes() {
        let md = "- [ ] a\n- [x] b\n- [X] c\n- plain";
        assert_eq!(extract_action_items_count(md), (2, 1));
    }
}
