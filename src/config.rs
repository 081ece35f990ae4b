// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::client::{PublishTarget, SearchQuery, non_empty, notes};
use crate::context::AppContext;
use crate::storage;
use anyhow::{Error, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;

/// Environment variable that overrides `chat_token`.
pub const CHAT_TOKEN_ENV: &str = "SLACK_BOT_TOKEN";
/// Environment variable that overrides `llm_api_key`.
pub const LLM_API_KEY_ENV: &str = "OPENAI_API_KEY";

fn default_search_days() -> u32 {
    60
}

fn default_title_filter() -> String {
    "Meeting Notes".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_llm_model() -> String {
    notes::DEFAULT_MODEL.to_string()
}

fn default_llm_api_base() -> String {
    notes::DEFAULT_API_BASE.to_string()
}

fn from_env_or(var: &str, configured: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| Some(configured.to_string()).filter(|t| !t.trim().is_empty()))
}

/// Someone who receives the daily reminder digest.
///
/// Wiki fields left unset fall back to the global ones, so a team can share
/// one service account while each person watches their own space.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    /// Chat user id the digest is sent to as a direct message.
    pub chat_id: String,
    #[serde(default)]
    pub wiki_username: Option<String>,
    #[serde(default)]
    pub wiki_token: Option<String>,
    #[serde(default)]
    pub wiki_space: Option<String>,
    #[serde(default)]
    pub wiki_parent_id: Option<String>,
}

/// Resolved wiki access for one recipient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WikiAccess {
    pub username: String,
    pub token: String,
    pub space: String,
    pub parent_id: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    pub wiki_url: String,
    pub wiki_username: String,
    pub wiki_token: String,
    pub wiki_space: String,
    #[serde(default)]
    pub wiki_parent_id: Option<String>,

    #[serde(default)]
    pub chat_token: String,
    /// Channel that receives the summary of newly published minutes.
    #[serde(default)]
    pub chat_channel: String,

    /// Chat-completions key used by `publish --raw`.
    #[serde(default)]
    pub llm_api_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_llm_api_base")]
    pub llm_api_base: String,

    /// Only pages created within this many days are scanned for reminders.
    #[serde(default = "default_search_days")]
    pub search_days: u32,
    #[serde(default = "default_title_filter")]
    pub title_filter: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub recipients: Vec<Recipient>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wiki_url: String::new(),
            wiki_username: String::new(),
            wiki_token: String::new(),
            wiki_space: String::new(),
            wiki_parent_id: None,
            chat_token: String::new(),
            chat_channel: String::new(),
            llm_api_key: String::new(),
            // Match the serde defaults
            llm_model: default_llm_model(),
            llm_api_base: default_llm_api_base(),
            search_days: 60,
            title_filter: "Meeting Notes".to_string(),
            log_level: "info".to_string(),
            recipients: Vec::new(),
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        Self::from_toml(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Whether an error returned by `load` means the file simply does not exist.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        // Walk the error chain and look for an underlying IO NotFound.
        err.chain().any(|cause| {
            cause
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
        })
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        storage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            storage::atomic_write(&path, toml_str)?;
            Ok(())
        })
    }

    /// Bot token, preferring the environment over the file.
    pub fn chat_token(&self) -> Option<String> {
        from_env_or(CHAT_TOKEN_ENV, &self.chat_token)
    }

    /// Language model key, preferring the environment over the file.
    pub fn llm_api_key(&self) -> Option<String> {
        from_env_or(LLM_API_KEY_ENV, &self.llm_api_key)
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "off" => log::LevelFilter::Off,
            "error" => log::LevelFilter::Error,
            "warn" | "warning" => log::LevelFilter::Warn,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }

    /// Target for newly published minutes.
    pub fn publish_target(&self) -> PublishTarget {
        PublishTarget {
            space: self.wiki_space.trim().to_string(),
            parent_id: non_empty(self.wiki_parent_id.as_deref()).map(str::to_string),
        }
    }

    /// Wiki credentials and scope for a recipient, falling back to the global settings.
    pub fn wiki_access_for(&self, recipient: &Recipient) -> WikiAccess {
        let pick = |own: &Option<String>, global: &str| {
            non_empty(own.as_deref())
                .unwrap_or(global.trim())
                .to_string()
        };
        WikiAccess {
            username: pick(&recipient.wiki_username, &self.wiki_username),
            token: pick(&recipient.wiki_token, &self.wiki_token),
            space: pick(&recipient.wiki_space, &self.wiki_space),
            parent_id: non_empty(recipient.wiki_parent_id.as_deref())
                .or(non_empty(self.wiki_parent_id.as_deref()))
                .map(str::to_string),
        }
    }

    /// Search for the pages a recipient's reminders are built from.
    pub fn search_query_for(&self, access: &WikiAccess, today: NaiveDate) -> SearchQuery {
        SearchQuery {
            space: access.space.clone(),
            title_filter: self.title_filter.clone(),
            created_after: today - Duration::days(i64::from(self.search_days)),
            parent_id: access.parent_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
wiki_url = "https://example.atlassian.net"
wiki_username = "bot@example.com"
wiki_token = "secret"
wiki_space = "TEAM"
wiki_parent_id = ""

[[recipients]]
name = "Seonju"
chat_id = "U123"
wiki_space = "~seonju"
"#;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.search_days, 60);
        assert_eq!(config.title_filter, "Meeting Notes");
        assert_eq!(config.log_level_filter(), log::LevelFilter::Info);
        assert_eq!(config.recipients.len(), 1);
        assert_eq!(config.publish_target().parent_id, None);
        assert_eq!(config.llm_model, "gpt-4o");
        assert_eq!(config.llm_api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn recipient_overrides_space_only() {
        let config = Config::from_toml(SAMPLE).unwrap();
        let access = config.wiki_access_for(&config.recipients[0]);
        assert_eq!(access.space, "~seonju");
        assert_eq!(access.username, "bot@example.com");
        assert_eq!(access.token, "secret");
        assert_eq!(access.parent_id, None);
    }

    #[test]
    fn search_window_counts_back_from_today() {
        let config = Config::from_toml(SAMPLE).unwrap();
        let access = config.wiki_access_for(&config.recipients[0]);
        let today = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        let query = config.search_query_for(&access, today);
        assert_eq!(
            query.created_after,
            NaiveDate::from_ymd_opt(2025, 8, 21).unwrap()
        );
    }

    #[test]
    fn missing_required_field_is_an_error() {
        assert!(Config::from_toml("wiki_url = \"x\"").is_err());
    }
}
