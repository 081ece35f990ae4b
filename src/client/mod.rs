// File: ./src/client/mod.rs
//! Network collaborators: the wiki that stores minutes, the chat service
//! that receives summaries and reminders, and the language model that turns
//! raw notes into structured minutes.
//!
//! Workflows only see the traits below, so they can run against fakes in
//! tests. Failures come back as `ClientError` values, never as panics.
pub mod chat;
pub mod notes;
pub mod wiki;

pub use chat::ChatClient;
pub use notes::NotesClient;
pub use wiki::WikiClient;

use crate::model::ActionItem;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Auth,
    NotFound,
    Permission,
    Timeout,
    /// The bot is not a member of the target channel.
    NotMember,
    Unknown,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Auth => write!(f, "authentication failed"),
            FailureReason::NotFound => write!(f, "not found"),
            FailureReason::Permission => write!(f, "permission denied"),
            FailureReason::Timeout => write!(f, "timed out"),
            FailureReason::NotMember => write!(f, "bot is not a member"),
            FailureReason::Unknown => write!(f, "unknown error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub reason: FailureReason,
    pub detail: String,
}

impl ClientError {
    pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{}: {}", self.reason, self.detail)
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        let reason = if e.is_timeout() {
            FailureReason::Timeout
        } else {
            e.status()
                .map(reason_for_status)
                .unwrap_or(FailureReason::Unknown)
        };
        ClientError::new(reason, e.to_string())
    }
}

/// Maps an HTTP status to the failure reason reported to callers.
pub fn reason_for_status(status: reqwest::StatusCode) -> FailureReason {
    match status.as_u16() {
        401 => FailureReason::Auth,
        403 => FailureReason::Permission,
        404 => FailureReason::NotFound,
        408 | 504 => FailureReason::Timeout,
        _ => FailureReason::Unknown,
    }
}

/// Where a new page goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub space: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPage {
    pub page_id: String,
    pub page_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub space: String,
    pub title_filter: String,
    pub created_after: NaiveDate,
    pub parent_id: Option<String>,
}

/// A stored page with its raw storage markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiPage {
    pub page_id: String,
    pub title: String,
    pub url: String,
    pub body: String,
}

#[async_trait]
pub trait DocumentPublisher: Send + Sync {
    async fn publish(
        &self,
        title: &str,
        body: &str,
        target: &PublishTarget,
    ) -> Result<PublishedPage, ClientError>;
}

#[async_trait]
pub trait DocumentSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<WikiPage>, ClientError>;
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    /// `channel` is a channel name/id or a user id for direct messages.
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), ClientError>;
}

/// Raw meeting input handed to the language model.
#[derive(Debug, Clone)]
pub struct MeetingInput<'a> {
    /// Meeting name without date or suffix.
    pub topic: &'a str,
    pub date: NaiveDate,
    pub attendees: &'a str,
    pub notes: &'a str,
    /// Items the structured minutes must contain.
    pub action_items: &'a [ActionItem],
}

#[async_trait]
pub trait NoteStructurer: Send + Sync {
    /// A short meeting name for the notes. May come back with a date prefix
    /// or as a generic word; see `model::intake::clean_generated_title`.
    async fn suggest_title(&self, notes: &str) -> Result<String, ClientError>;

    /// The model's reply to an action-item request: a JSON array of
    /// `{task, assignee, due}` objects, possibly wrapped in prose.
    async fn extract_action_items(&self, notes: &str) -> Result<String, ClientError>;

    /// Structured minutes in the markdown dialect understood by `markup`.
    async fn structure(&self, meeting: &MeetingInput<'_>) -> Result<String, ClientError>;

    /// A short chat summary of structured minutes.
    async fn summarize(&self, minutes: &str) -> Result<String, ClientError>;
}

/// Stands in for a collaborator that could not be built, so a workflow can
/// still run its other steps and report this one as failed.
#[derive(Debug, Clone)]
pub struct Unavailable(pub ClientError);

#[async_trait]
impl DocumentPublisher for Unavailable {
    async fn publish(
        &self,
        _title: &str,
        _body: &str,
        _target: &PublishTarget,
    ) -> Result<PublishedPage, ClientError> {
        Err(self.0.clone())
    }
}

#[async_trait]
impl DocumentSearch for Unavailable {
    async fn search(&self, _query: &SearchQuery) -> Result<Vec<WikiPage>, ClientError> {
        Err(self.0.clone())
    }
}

#[async_trait]
impl MessageSender for Unavailable {
    async fn send_message(&self, _channel: &str, _text: &str) -> Result<(), ClientError> {
        Err(self.0.clone())
    }
}

/// Drops empty strings so optional ids read from config behave like `None`.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
