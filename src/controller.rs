// File: src/controller.rs
//! Workflows tying the pure core to the network collaborators.
//!
//! The entry points report per-step outcomes instead of failing early: a
//! wiki outage must not stop the chat summary, and one recipient's bad
//! credentials must not stop everyone else's reminders.
use crate::client::{
    ClientError, DocumentPublisher, DocumentSearch, MeetingInput, MessageSender, NoteStructurer,
    PublishTarget, PublishedPage, SearchQuery, WikiPage,
};
use crate::config::{Config, WikiAccess};
use crate::extract::{extract, extract_action_items_count};
use crate::markup;
use crate::model::intake::{
    clean_generated_title, date_title, fallback_title, page_title, parse_action_items_json,
};
use crate::model::{ActionItem, ParsedActionItem};
use crate::reminder::{classify, format_digest};
use chrono::NaiveDate;
use std::fmt::Write;

pub struct PublishRequest<'a> {
    /// Full page title, see `model::intake::page_title`.
    pub page_title: &'a str,
    /// Structured meeting minutes in the markdown dialect.
    pub markdown: &'a str,
    pub target: PublishTarget,
    pub channel: &'a str,
    /// Summary text to post instead of the action-item counts.
    pub summary: Option<&'a str>,
}

#[derive(Debug)]
pub struct PublishReport {
    pub page_title: String,
    pub markup: String,
    pub page: Result<PublishedPage, ClientError>,
    pub summary: String,
    pub message: Result<(), ClientError>,
}

impl PublishReport {
    pub fn is_success(&self) -> bool {
        self.page.is_ok() && self.message.is_ok()
    }
}

/// Chat summary of a freshly published page.
pub fn summary_message(page_title: &str, markdown: &str, page_url: Option<&str>) -> String {
    let (complete, incomplete) = extract_action_items_count(markdown);
    let mut out = format!("📝 *{}*\n", page_title);
    let _ = write!(
        out,
        "✅ Action items: {} open, {} done",
        incomplete, complete
    );
    with_page_link(out, page_url)
}

/// Appends the link to the published page, when there is one.
pub fn with_page_link(mut summary: String, page_url: Option<&str>) -> String {
    if let Some(url) = page_url {
        let _ = write!(summary, "\n\n---\n📄 *Full minutes:* {}", url);
    }
    summary
}

/// Converts the minutes, publishes them and posts a summary to the team channel.
pub async fn publish_minutes(
    publisher: &dyn DocumentPublisher,
    sender: &dyn MessageSender,
    request: &PublishRequest<'_>,
) -> PublishReport {
    let page_title = request.page_title.to_string();
    let markup = markup::convert(request.markdown);

    let page = publisher
        .publish(&page_title, &markup, &request.target)
        .await;
    if let Err(e) = &page {
        log::error!("Could not publish '{}': {}", page_title, e);
    }

    let page_url = page.as_ref().ok().map(|p| p.page_url.as_str());
    let summary = match request.summary.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => with_page_link(text.to_string(), page_url),
        None => summary_message(&page_title, request.markdown, page_url),
    };
    let message = sender.send_message(request.channel, &summary).await;
    if let Err(e) = &message {
        log::error!("Could not post summary to {}: {}", request.channel, e);
    }

    PublishReport {
        page_title,
        markup,
        page,
        summary,
        message,
    }
}

/// Raw meeting notes waiting to be structured.
pub struct MeetingNotes<'a> {
    pub notes: &'a str,
    /// Meeting name given by the user; generated when absent.
    pub topic: Option<&'a str>,
    pub date: NaiveDate,
    pub attendees: &'a str,
}

/// Minutes produced from raw notes, ready for `publish_minutes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMinutes {
    pub page_title: String,
    pub markdown: String,
    pub action_items: Vec<ActionItem>,
    /// Model-written chat summary; `None` when it could not be produced.
    pub summary: Option<String>,
}

/// Picks the meeting name and the full page title.
///
/// A given topic wins. Thin notes get the date title without asking the
/// model. A failed or unusable suggestion also falls back to the date title.
async fn choose_title(
    structurer: &dyn NoteStructurer,
    meeting: &MeetingNotes<'_>,
) -> (String, String) {
    if let Some(topic) = meeting.topic.map(str::trim).filter(|t| !t.is_empty()) {
        return (topic.to_string(), page_title(meeting.date, topic));
    }
    if let Some(fallback) = fallback_title(meeting.notes, meeting.date) {
        log::info!("Notes are too short to name, using '{}'", fallback);
        return (fallback.clone(), fallback);
    }

    match structurer.suggest_title(meeting.notes).await {
        Ok(raw) => match clean_generated_title(&raw) {
            Some(topic) => {
                log::info!("Generated meeting title '{}'", topic);
                let full = page_title(meeting.date, &topic);
                (topic, full)
            }
            None => {
                log::warn!("Unusable generated title '{}'", raw.trim());
                let fallback = date_title(meeting.date);
                (fallback.clone(), fallback)
            }
        },
        Err(e) => {
            log::warn!("Title generation failed: {}", e);
            let fallback = date_title(meeting.date);
            (fallback.clone(), fallback)
        }
    }
}

/// Appends an action-item section when the structured minutes lost every checkbox.
fn ensure_action_items(markdown: String, items: &[ActionItem]) -> String {
    let (complete, incomplete) = extract_action_items_count(&markdown);
    if items.is_empty() || complete + incomplete > 0 {
        return markdown;
    }
    log::warn!(
        "Structured minutes have no checkboxes, appending {} action item(s)",
        items.len()
    );
    let mut out = markdown.trim_end().to_string();
    out.push_str("\n\n## Action items\n");
    for item in items {
        out.push_str(&item.to_markdown_line());
        out.push('\n');
    }
    out
}

/// Turns raw notes into publishable minutes with the language model.
///
/// Only structuring is required. Title, action-item and summary failures are
/// logged and replaced by their fallbacks.
pub async fn prepare_minutes(
    structurer: &dyn NoteStructurer,
    meeting: &MeetingNotes<'_>,
) -> Result<PreparedMinutes, ClientError> {
    let (topic, page_title) = choose_title(structurer, meeting).await;

    let action_items = match structurer.extract_action_items(meeting.notes).await {
        Ok(reply) => parse_action_items_json(&reply),
        Err(e) => {
            log::warn!("Action item extraction failed: {}", e);
            Vec::new()
        }
    };
    log::info!("{} action item(s) extracted from the notes", action_items.len());

    let input = MeetingInput {
        topic: &topic,
        date: meeting.date,
        attendees: meeting.attendees,
        notes: meeting.notes,
        action_items: &action_items,
    };
    let structured = structurer.structure(&input).await.map_err(|e| {
        log::error!("Could not structure '{}': {}", page_title, e);
        e
    })?;
    let markdown = ensure_action_items(structured, &action_items);

    let summary = match structurer.summarize(&markdown).await {
        Ok(text) => Some(text),
        Err(e) => {
            log::warn!("Summary generation failed, posting counts instead: {}", e);
            None
        }
    };

    Ok(PreparedMinutes {
        page_title,
        markdown,
        action_items,
        summary,
    })
}

/// Extracts the open, dated action items of every page, in page order.
pub fn collect_action_items(pages: &[WikiPage]) -> Vec<ParsedActionItem> {
    pages
        .iter()
        .flat_map(|page| extract(&page.body, &page.url, &page.title))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderOutcome {
    Sent { items: usize },
    NothingToSend,
    /// The digest that would have been sent.
    DryRun { message: String },
    Failed(ClientError),
}

pub struct ReminderJob<'a> {
    pub recipient_name: &'a str,
    pub chat_id: &'a str,
    pub query: SearchQuery,
    pub today: NaiveDate,
}

/// Builds and sends one recipient's digest.
///
/// Without a `sender` the run is a dry run: the digest is returned instead.
pub async fn remind_recipient(
    search: &dyn DocumentSearch,
    sender: Option<&dyn MessageSender>,
    job: &ReminderJob<'_>,
) -> ReminderOutcome {
    let pages = match search.search(&job.query).await {
        Ok(pages) => pages,
        Err(e) => {
            log::error!("Page search for {} failed: {}", job.recipient_name, e);
            return ReminderOutcome::Failed(e);
        }
    };
    log::info!("{}: {} page(s) found", job.recipient_name, pages.len());

    let items = collect_action_items(&pages);
    log::info!("{}: {} dated open action item(s)", job.recipient_name, items.len());

    let buckets = classify(items, job.today);
    let Some(message) = format_digest(&buckets, job.recipient_name) else {
        log::info!("{}: nothing to send", job.recipient_name);
        return ReminderOutcome::NothingToSend;
    };

    let Some(sender) = sender else {
        return ReminderOutcome::DryRun { message };
    };

    match sender.send_message(job.chat_id, &message).await {
        Ok(()) => {
            log::info!("{}: reminder sent", job.recipient_name);
            ReminderOutcome::Sent {
                items: buckets.total(),
            }
        }
        Err(e) => {
            log::error!("{}: reminder failed: {}", job.recipient_name, e);
            ReminderOutcome::Failed(e)
        }
    }
}

/// Runs the reminder job of every configured recipient, one after the other.
///
/// `connect` opens the document search for a recipient's wiki access. A
/// recipient that cannot be connected is reported as failed; the others
/// still run. `sender` is `None` for a dry run.
pub async fn run_reminders<S, F>(
    config: &Config,
    today: NaiveDate,
    sender: Option<&dyn MessageSender>,
    connect: F,
) -> Vec<(String, ReminderOutcome)>
where
    S: DocumentSearch,
    F: Fn(&WikiAccess) -> Result<S, ClientError>,
{
    let mut outcomes = Vec::with_capacity(config.recipients.len());

    for recipient in &config.recipients {
        let access = config.wiki_access_for(recipient);
        let outcome = match connect(&access) {
            Ok(search) => {
                let job = ReminderJob {
                    recipient_name: &recipient.name,
                    chat_id: &recipient.chat_id,
                    query: config.search_query_for(&access, today),
                    today,
                };
                remind_recipient(&search, sender, &job).await
            }
            Err(e) => {
                log::error!("{}: cannot open wiki: {}", recipient.name, e);
                ReminderOutcome::Failed(e)
            }
        };
        outcomes.push((recipient.name.clone(), outcome));
    }

    outcomes
}
