// File: src/client/chat.rs
//! Chat client for the Slack Web API (`chat.postMessage`, `conversations.list`).
use crate::client::{ClientError, FailureReason, MessageSender, reason_for_status};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://slack.com/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_member: bool,
}

#[derive(Debug, Deserialize)]
struct ConversationsList {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channels: Vec<Channel>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
}

/// Channel names may be typed with a leading `#`; the API wants them bare.
pub fn normalize_channel(channel: &str) -> &str {
    channel.trim().trim_start_matches('#')
}

fn reason_for_api_error(code: &str) -> FailureReason {
    match code {
        "invalid_auth" | "not_authed" | "token_revoked" | "token_expired" | "account_inactive" => {
            FailureReason::Auth
        }
        "channel_not_found" | "user_not_found" => FailureReason::NotFound,
        "not_in_channel" => FailureReason::NotMember,
        "missing_scope" | "restricted_action" | "is_archived" => FailureReason::Permission,
        _ => FailureReason::Unknown,
    }
}

fn api_error(code: Option<String>) -> ClientError {
    let code = code.unwrap_or_else(|| "unknown_error".to_string());
    ClientError::new(reason_for_api_error(&code), code)
}

#[derive(Clone, Debug)]
pub struct ChatClient {
    api_base: String,
    token: String,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(token: &str) -> Result<Self, ClientError> {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Points the client at another API root (used against mock servers).
    pub fn with_api_base(token: &str, api_base: &str) -> Result<Self, ClientError> {
        if token.trim().is_empty() {
            return Err(ClientError::new(
                FailureReason::Auth,
                "chat bot token is not configured",
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
            http,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Looks a channel up by name or id and checks the bot can post there.
    pub async fn find_channel(&self, channel: &str) -> Result<ChannelInfo, ClientError> {
        let wanted = normalize_channel(channel);

        let resp = self
            .http
            .get(self.method_url("conversations.list"))
            .bearer_auth(&self.token)
            .query(&[("types", "public_channel,private_channel"), ("limit", "1000")])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::new(
                reason_for_status(resp.status()),
                format!("HTTP {}", resp.status().as_u16()),
            ));
        }

        let list: ConversationsList = resp.json().await?;
        if !list.ok {
            return Err(api_error(list.error));
        }

        let found = list
            .channels
            .into_iter()
            .find(|c| c.name == wanted || c.id == wanted)
            .ok_or_else(|| {
                ClientError::new(
                    FailureReason::NotFound,
                    format!("channel '{}' not found", channel),
                )
            })?;

        if !found.is_member {
            return Err(ClientError::new(
                FailureReason::NotMember,
                format!("invite the bot to #{} first", found.name),
            ));
        }

        Ok(ChannelInfo {
            id: found.id,
            name: found.name,
        })
    }
}

#[async_trait]
impl MessageSender for ChatClient {
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(self.method_url("chat.postMessage"))
            .bearer_auth(&self.token)
            .json(&json!({
                "channel": normalize_channel(channel),
                "text": text,
                "mrkdwn": true
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::new(
                reason_for_status(resp.status()),
                format!("HTTP {}", resp.status().as_u16()),
            ));
        }

        let result: ApiResponse = resp.json().await?;
        if result.ok {
            log::debug!("Message delivered to {}", channel);
            Ok(())
        } else {
            let err = api_error(result.error);
            log::warn!("Message to {} rejected: {}", channel, err);
            Err(err)
        }
    }
}
