// File: src/client/notes.rs
//! Chat-completions client that turns raw meeting notes into structured
//! minutes, titles, action items and chat summaries.
use crate::client::{ClientError, FailureReason, MeetingInput, NoteStructurer, reason_for_status};
use crate::model::ActionItem;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::fmt::Write;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Only the start of the notes is needed to name the meeting.
const TITLE_INPUT_CHARS: usize = 500;

const TITLE_PROMPT: &str = "You name meetings. Reply with a short, specific meeting title \
of at most 8 words that captures the main topic. Do not include a date, quotes or the word \
'meeting notes'. Reply with the title only.";

const STRUCTURE_PROMPT: &str = "You turn raw meeting notes into clean minutes written in \
markdown. Use exactly this layout:\n\
# <meeting title>\n\
## Overview\n\
- Date: <date>\n\
- Attendees: <names>\n\
## Discussion\n\
### <topic>\n\
- <point>\n\
## Decisions\n\
- <decision>\n\
## Action items\n\
- [ ] <task> — @<owner> — Due: <YYYY-MM-DD>\n\
Use '- [x]' for items the notes say are already done. Write TBD when the owner or due date \
is unknown. Every action item listed as required must appear. Use only '#', '##', '###' \
headings and '- ' list items. Do not wrap the answer in a code block.";

const SUMMARY_PROMPT: &str = "You write short chat summaries of meeting minutes. Start with \
a line '📝 *<meeting title>*', then at most five bullet points with the key decisions, then \
the open action items as '• <task> (@owner, due <date>)'. Use chat mrkdwn: *bold*, no \
headings, no tables.";

const ACTION_ITEMS_PROMPT: &str = "You extract action items from meeting notes and err on \
the side of including too many. Anything someone has to do counts: explicit TODOs, things \
that 'need' or 'should' happen, reviews, fixes, reports and anything with a deadline. Reply \
with a JSON array only, no prose:\n\
[{\"task\": \"concrete task\", \"assignee\": \"name or TBD\", \"due\": \"YYYY-MM-DD or TBD\"}]\n\
Use TBD whenever the owner or the due date is not stated.";

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// User message for the structuring request.
pub fn meeting_prompt(meeting: &MeetingInput<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Meeting: {}", meeting.topic);
    let _ = writeln!(out, "Date: {}", meeting.date.format("%Y-%m-%d"));
    let _ = writeln!(out, "Attendees: {}", meeting.attendees);
    let _ = write!(out, "\nNotes:\n{}\n", meeting.notes);
    if !meeting.action_items.is_empty() {
        out.push_str("\n## Required action items (must all be included)\n");
        for (n, item) in meeting.action_items.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", n + 1, required_item(item));
        }
    }
    out
}

fn required_item(item: &ActionItem) -> String {
    format!(
        "Task: {} | Owner: {} | Due: {}",
        item.task, item.assignee, item.due
    )
}

#[derive(Clone, Debug)]
pub struct NotesClient {
    endpoint: String,
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl NotesClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self, ClientError> {
        Self::with_api_base(api_key, model, DEFAULT_API_BASE)
    }

    /// Points the client at another API root (used against mock servers).
    pub fn with_api_base(api_key: &str, model: &str, api_base: &str) -> Result<Self, ClientError> {
        if api_key.trim().is_empty() {
            return Err(ClientError::new(
                FailureReason::Auth,
                "language model API key is not configured",
            ));
        }
        let model = match model.trim() {
            "" => DEFAULT_MODEL,
            m => m,
        };
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            http,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, ClientError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": user }
                ],
                "temperature": temperature,
                "max_tokens": max_tokens
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            log::debug!("Completion failed with HTTP {}: {}", status.as_u16(), body);
            return Err(ClientError::new(
                reason_for_status(status),
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let parsed: CompletionResponse = resp.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(ClientError::new(
                FailureReason::Unknown,
                "model returned an empty completion",
            ));
        }
        Ok(content)
    }
}

#[async_trait]
impl NoteStructurer for NotesClient {
    async fn suggest_title(&self, notes: &str) -> Result<String, ClientError> {
        let user = format!(
            "Name the meeting these notes are from:\n\n{}",
            take_chars(notes, TITLE_INPUT_CHARS)
        );
        self.complete(TITLE_PROMPT, &user, 0.3, 100).await
    }

    async fn extract_action_items(&self, notes: &str) -> Result<String, ClientError> {
        let user = format!("Meeting notes:\n\n{}", notes);
        self.complete(ACTION_ITEMS_PROMPT, &user, 0.4, 2000).await
    }

    async fn structure(&self, meeting: &MeetingInput<'_>) -> Result<String, ClientError> {
        let user = format!(
            "Write the minutes for this meeting:\n\n{}",
            meeting_prompt(meeting)
        );
        self.complete(STRUCTURE_PROMPT, &user, 0.3, 3000).await
    }

    async fn summarize(&self, minutes: &str) -> Result<String, ClientError> {
        let user = format!("Summarize these minutes:\n\n{}", minutes);
        self.complete(SUMMARY_PROMPT, &user, 0.3, 1000).await
    }
}
