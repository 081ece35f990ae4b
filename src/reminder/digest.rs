// File: src/reminder/digest.rs
use crate::model::ParsedActionItem;
use crate::reminder::classify::{Bucket, Buckets};
use std::fmt::Write;
use strum::IntoEnumIterator;

/// Items listed per bucket; the rest are left out without notice.
pub const MAX_ITEMS_PER_BUCKET: usize = 5;
const TASK_PREVIEW_CHARS: usize = 50;
const TITLE_PREVIEW_CHARS: usize = 30;

fn section_header(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Overdue => "🚨 *Overdue*",
        Bucket::DueToday => "⏰ *Due today*",
        Bucket::DueInThreeDays => "📅 *Due in 3 days*",
    }
}

fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn render_item(out: &mut String, item: &ParsedActionItem) {
    let ellipsis = if item.task.chars().count() > TASK_PREVIEW_CHARS {
        "..."
    } else {
        ""
    };
    let _ = writeln!(out, "• {}{}", take_chars(&item.task, TASK_PREVIEW_CHARS), ellipsis);
    let _ = writeln!(out, "  Owner: @{} | Due: {}", item.assignee, item.due);
    let _ = writeln!(
        out,
        "  📄 <{}|{}>",
        item.page_url,
        take_chars(&item.page_title, TITLE_PREVIEW_CHARS)
    );
    out.push('\n');
}

/// Renders the reminder message for one recipient.
///
/// Returns `None` when every bucket is empty: there is nothing to send.
pub fn format_digest(buckets: &Buckets, recipient_name: &str) -> Option<String> {
    let total = buckets.total();
    if total == 0 {
        return None;
    }

    let mut out = String::new();
    let _ = write!(out, "🔔 *Action item reminder for {}*\n\n", recipient_name);
    let _ = write!(out, "📊 You have {} open action item(s).\n\n", total);

    for bucket in Bucket::iter() {
        let items = buckets.get(bucket);
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{} ({})", section_header(bucket), items.len());
        for item in items.iter().take(MAX_ITEMS_PER_BUCKET) {
            render_item(&mut out, item);
        }
    }

    out.push_str("---\n💡 Tick the checkbox in the meeting notes to mark an item done!");
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_chars_respects_char_boundaries() {
        assert_eq!(take_chars("회의록 정리", 3), "회의록");
        assert_eq!(take_chars("abc", 10), "abc");
        assert_eq!(take_chars("", 2), "");
    }
}
