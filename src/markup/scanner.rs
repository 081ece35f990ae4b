// File: src/markup/scanner.rs
//! Task-element scanner for wiki storage markup.
//!
//! Page bodies coming back from the wiki are not guaranteed to look exactly
//! like what the converter wrote: humans edit them, and the server is free to
//! add attributes, reorder them or insert whitespace between elements. The
//! markup is read as a lenient stream of `quick_xml` events (no namespace
//! resolution, no end-name checks), so undeclared `ac:` prefixes, stray HTML
//! tags and unclosed elements do not stop the scan.
use quick_xml::Reader;
use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::{BytesStart, BytesText, Event};

const TASK: &[u8] = b"ac:task";
const TASK_ID: &[u8] = b"ac:task-id";
const TASK_STATUS: &[u8] = b"ac:task-status";
const TASK_BODY: &[u8] = b"ac:task-body";

/// One task element as stored on the page, before interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTask {
    pub id: String,
    pub status: String,
    /// Text content of the body: tags removed, entities decoded.
    pub text: String,
    /// `datetime` attribute of the first `<time>` element in the body.
    pub time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Outside,
    Id,
    Status,
    Body,
}

#[derive(Debug)]
struct TaskBuilder {
    task: RawTask,
    field: Field,
    has_status: bool,
    has_body: bool,
    /// Tasks opened inside this task's body and not closed yet.
    nested: usize,
}

impl TaskBuilder {
    fn new() -> Self {
        Self {
            task: RawTask::default(),
            field: Field::Outside,
            has_status: false,
            has_body: false,
            nested: 0,
        }
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        let name = e.name();
        if self.field == Field::Body {
            if !empty && is(name.as_ref(), TASK) {
                self.nested += 1;
            }
            if self.task.time.is_none() && is(name.as_ref(), b"time") {
                self.task.time = datetime_of(e);
            }
            return;
        }
        if self.field != Field::Outside {
            return;
        }
        let name = name.as_ref();
        if is(name, TASK_STATUS) {
            self.has_status = true;
            if !empty {
                self.field = Field::Status;
            }
        } else if is(name, TASK_BODY) {
            self.has_body = true;
            if !empty {
                self.field = Field::Body;
            }
        } else if is(name, TASK_ID) && !empty {
            self.field = Field::Id;
        }
    }

    /// Handles a closing tag. Returns `true` when it closes this task.
    fn close(&mut self, name: &[u8]) -> bool {
        match self.field {
            Field::Body if self.nested > 0 => {
                if is(name, TASK) {
                    self.nested -= 1;
                }
                false
            }
            Field::Body if is(name, TASK_BODY) => {
                self.field = Field::Outside;
                false
            }
            Field::Id if is(name, TASK_ID) => {
                self.field = Field::Outside;
                false
            }
            Field::Status if is(name, TASK_STATUS) => {
                self.field = Field::Outside;
                false
            }
            _ => is(name, TASK),
        }
    }

    fn text(&mut self, text: &str) {
        match self.field {
            Field::Id => self.task.id.push_str(text),
            Field::Status => self.task.status.push_str(text),
            Field::Body => self.task.text.push_str(text),
            Field::Outside => {}
        }
    }

    fn finish(self) -> Option<RawTask> {
        if !(self.has_status && self.has_body) {
            return None;
        }
        let mut task = self.task;
        task.id = task.id.trim().to_string();
        task.status = task.status.trim().to_string();
        Some(task)
    }
}

fn is(name: &[u8], wanted: &[u8]) -> bool {
    name.eq_ignore_ascii_case(wanted)
}

fn datetime_of(e: &BytesStart<'_>) -> Option<String> {
    e.html_attributes()
        .flatten()
        .find(|a| is(a.key.as_ref(), b"datetime"))
        .and_then(|a| a.unescape_value().ok().map(|v| v.trim().to_string()))
        .filter(|v| !v.is_empty())
}

/// Decodes XML, HTML5 named and numeric character references.
/// Text with an unknown or dangling `&` is kept as written.
fn decode(text: &BytesText<'_>) -> String {
    match text.unescape_with(resolve_html5_entity) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(text).into_owned(),
    }
}

fn lenient_reader(src: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(src);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    reader
}

/// Finds every top-level `ac:task` element with a status and a body.
///
/// Tasks nested inside another task's body are reported as part of that body.
/// A task that is never closed is dropped when the next task starts; tasks
/// after it are still found.
pub fn scan_tasks(src: &str) -> Vec<RawTask> {
    let mut reader = lenient_reader(src);
    let mut found = Vec::new();
    let mut current: Option<TaskBuilder> = None;

    loop {
        let before = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let in_body = current.as_ref().is_some_and(|t| t.field == Field::Body);
                if is(e.name().as_ref(), TASK) && !in_body {
                    if current.is_some() {
                        log::debug!("Dropping unclosed task element");
                    }
                    current = Some(TaskBuilder::new());
                } else if let Some(task) = current.as_mut() {
                    task.open(&e, false);
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(task) = current.as_mut() {
                    task.open(&e, true);
                }
            }
            Ok(Event::End(e)) => {
                let closes = current
                    .as_mut()
                    .is_some_and(|task| task.close(e.name().as_ref()));
                if closes && let Some(task) = current.take().and_then(TaskBuilder::finish) {
                    found.push(task);
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(task) = current.as_mut() {
                    task.text(&decode(&t));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                log::debug!(
                    "Markup error at byte {}: {}",
                    reader.error_position(),
                    e
                );
                if reader.buffer_position() == before {
                    break;
                }
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_tasks_with_whitespace_and_attributes() {
        let src = "<ac:task-list>\n<ac:task>\n  <ac:task-id>7</ac:task-id>\n  <ac:task-status> incomplete </ac:task-status>\n  <ac:task-body ac:x=\"1\"><span>Do it</span></ac:task-body>\n</ac:task>\n</ac:task-list>";
        let found = scan_tasks(src);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "7");
        assert_eq!(found[0].status, "incomplete");
        assert_eq!(found[0].text, "Do it");
        assert_eq!(found[0].time, None);
    }

    #[test]
    fn task_without_body_is_ignored() {
        let src = "<ac:task><ac:task-status>incomplete</ac:task-status></ac:task>";
        assert!(scan_tasks(src).is_empty());
    }

    #[test]
    fn time_attribute_in_any_quote_style() {
        let src = "<ac:task><ac:task-status>incomplete</ac:task-status>\
                   <ac:task-body>x <time class=d datetime='2025-11-02' /></ac:task-body></ac:task>";
        let found = scan_tasks(src);
        assert_eq!(found[0].time.as_deref(), Some("2025-11-02"));
    }

    #[test]
    fn nested_task_belongs_to_outer_body() {
        let src = "<ac:task><ac:task-status>incomplete</ac:task-status><ac:task-body>outer \
                   <ac:task><ac:task-status>complete</ac:task-status><ac:task-body>inner</ac:task-body></ac:task>\
                   </ac:task-body></ac:task>";
        let found = scan_tasks(src);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].status, "incomplete");
        assert_eq!(found[0].text, "outer completeinner");
    }

    #[test]
    fn unclosed_task_does_not_hide_later_ones() {
        let src = "<p><ac:task><ac:task-status>incomplete</ac:task-status></p>\
                   <ac:task><ac:task-status>incomplete</ac:task-status>\
                   <ac:task-body>Later</ac:task-body></ac:task>";
        let found = scan_tasks(src);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "Later");
    }

    fn body_text(body: &str) -> String {
        let src = format!(
            "<ac:task><ac:task-status>incomplete</ac:task-status><ac:task-body>{}</ac:task-body></ac:task>",
            body
        );
        scan_tasks(&src).remove(0).text
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(body_text("<b>x</b> &amp; y"), "x & y");
        assert_eq!(body_text("a &mdash; b &#8212; c &#x2014; d"), "a — b — c — d");
        assert_eq!(body_text("R&D &bogus; stays"), "R&D &bogus; stays");
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(body_text("<!-- <p>hidden</p> --><em>x</em>"), "x");
    }
}
