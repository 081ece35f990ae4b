// File: src/markup/mod.rs
//! Markdown to wiki storage markup.
//!
//! Only the dialect produced for meeting minutes is understood: `#`..`###`
//! headings, `- [ ]` / `- [x]` checkboxes, `- ` bullets and plain text.
//! Consecutive checkbox lines are grouped into one `<ac:task-list>`; any other
//! non-blank line closes the group. Nothing here can fail: unknown lines are
//! emitted as paragraphs.
pub mod scanner;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static DUE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Due:\s*(\d{4}-\d{2}-\d{2})").expect("due date pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Incomplete,
    Complete,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Incomplete => "incomplete",
            TaskStatus::Complete => "complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "incomplete" => Some(TaskStatus::Incomplete),
            "complete" => Some(TaskStatus::Complete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskElement {
    pub id: String,
    pub status: TaskStatus,
    /// Body content, already due-date tagged.
    pub body: String,
}

impl TaskElement {
    pub fn to_markup(&self) -> String {
        format!(
            r#"<ac:task><ac:task-id>{}</ac:task-id><ac:task-status>{}</ac:task-status><ac:task-body><span class="placeholder-inline-tasks">{}</span></ac:task-body></ac:task>"#,
            self.id,
            self.status.as_str(),
            self.body
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Level 1..=3.
    Heading(u8, String),
    TaskList(Vec<TaskElement>),
    ListItem(String),
    Paragraph(String),
}

impl Block {
    fn render_into(&self, out: &mut Vec<String>) {
        match self {
            Block::Heading(level, text) => out.push(format!("<h{level}>{text}</h{level}>")),
            Block::TaskList(tasks) => {
                out.push("<ac:task-list>".to_string());
                out.extend(tasks.iter().map(TaskElement::to_markup));
                out.push("</ac:task-list>".to_string());
            }
            Block::ListItem(text) => out.push(format!("<li>{text}</li>")),
            Block::Paragraph(text) => out.push(format!("<p>{text}</p>")),
        }
    }
}

/// Accumulator threaded through the line fold.
#[derive(Debug, Default)]
struct ConversionState {
    emitted: Vec<Block>,
    pending_tasks: Option<Vec<TaskElement>>,
}

impl ConversionState {
    /// Closes the open task-list, if any, and appends it to the output.
    fn flush(&mut self) {
        if let Some(tasks) = self.pending_tasks.take()
            && !tasks.is_empty()
        {
            self.emitted.push(Block::TaskList(tasks));
        }
    }

    fn push_block(&mut self, block: Block) {
        self.flush();
        self.emitted.push(block);
    }

    fn push_task(&mut self, task: TaskElement) {
        self.pending_tasks.get_or_insert_with(Vec::new).push(task);
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.emitted
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Heading(u8, &'a str),
    Task(TaskStatus, &'a str),
    Bullet(&'a str),
    Text(&'a str),
    Blank,
}

fn classify_line(line: &str) -> Line<'_> {
    // Headings must start at column 0.
    for (level, marker) in [(1u8, "# "), (2, "## "), (3, "### ")] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Line::Heading(level, rest.trim());
        }
    }

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if let Some(rest) = trimmed.strip_prefix("- [ ]") {
        return Line::Task(TaskStatus::Incomplete, rest.trim());
    }
    if let Some(rest) = trimmed
        .strip_prefix("- [x]")
        .or_else(|| trimmed.strip_prefix("- [X]"))
    {
        return Line::Task(TaskStatus::Complete, rest.trim());
    }
    if let Some(rest) = trimmed.strip_prefix("- ") {
        return Line::Bullet(rest);
    }
    Line::Text(trimmed)
}

/// Rewrites every `Due: YYYY-MM-DD` into `<time datetime="YYYY-MM-DD"></time>`.
/// Anything else, including `Due: TBD`, is left as is.
pub fn convert_due_date_to_time_tag(content: &str) -> String {
    DUE_DATE_RE
        .replace_all(content, r#"<time datetime="$1"></time>"#)
        .into_owned()
}

/// Parses markdown into blocks, drawing task ids from `next_id`.
pub fn parse_blocks<F>(markdown: &str, mut next_id: F) -> Vec<Block>
where
    F: FnMut() -> String,
{
    markdown
        .split('\n')
        .fold(ConversionState::default(), |mut state, line| {
            match classify_line(line) {
                Line::Heading(level, text) => {
                    state.push_block(Block::Heading(level, text.to_string()))
                }
                Line::Task(status, content) => state.push_task(TaskElement {
                    id: next_id(),
                    status,
                    body: convert_due_date_to_time_tag(content),
                }),
                Line::Bullet(text) => state.push_block(Block::ListItem(text.to_string())),
                Line::Text(text) => state.push_block(Block::Paragraph(text.to_string())),
                Line::Blank => {}
            }
            state
        })
        .finish()
}

pub fn render(blocks: &[Block]) -> String {
    let mut lines = Vec::new();
    for block in blocks {
        block.render_into(&mut lines);
    }
    lines.join("\n")
}

/// Converts with caller-supplied task ids (deterministic output).
pub fn convert_with_ids<F>(markdown: &str, next_id: F) -> String
where
    F: FnMut() -> String,
{
    render(&parse_blocks(markdown, next_id))
}

/// Converts meeting markdown to storage markup, giving each task a fresh UUID.
pub fn convert(markdown: &str) -> String {
    convert_with_ids(markdown, || Uuid::new_v4().to_string())
}
