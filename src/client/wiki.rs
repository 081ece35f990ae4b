// File: src/client/wiki.rs
//! REST client for the wiki (Confluence storage-format API).
use crate::client::{
    ClientError, DocumentPublisher, DocumentSearch, FailureReason, PublishTarget, PublishedPage,
    SearchQuery, WikiPage, non_empty, reason_for_status,
};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SEARCH_LIMIT: &str = "100";

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    webui: String,
}

#[derive(Debug, Deserialize)]
struct StorageValue {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct ContentBody {
    #[serde(default)]
    storage: Option<StorageValue>,
}

#[derive(Debug, Deserialize)]
struct Content {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "_links", default)]
    links: Links,
    #[serde(default)]
    body: Option<ContentBody>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Space {
    #[serde(default)]
    name: Option<String>,
}

fn escape_cql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// CQL for "pages in `space` whose title contains `title_filter`, created after the date".
pub fn search_cql(query: &SearchQuery) -> String {
    let mut cql = format!(r#"space="{}""#, escape_cql(&query.space));
    if !query.title_filter.trim().is_empty() {
        cql.push_str(&format!(
            r#" AND title~"{}""#,
            escape_cql(query.title_filter.trim())
        ));
    }
    cql.push_str(&format!(
        r#" AND created>"{}""#,
        query.created_after.format("%Y-%m-%d")
    ));
    if let Some(parent) = non_empty(query.parent_id.as_deref()) {
        cql.push_str(&format!(r#" AND ancestor="{}""#, escape_cql(parent)));
    }
    cql
}

#[derive(Clone, Debug)]
pub struct WikiClient {
    base_url: String,
    auth_header: String,
    http: reqwest::Client,
}

impl WikiClient {
    /// `base_url` is the site root, e.g. `https://example.atlassian.net`.
    pub fn new(base_url: &str, username: &str, token: &str) -> Result<Self, ClientError> {
        if base_url.trim().is_empty() {
            return Err(ClientError::new(
                FailureReason::NotFound,
                "wiki URL is not configured",
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            auth_header: format!(
                "Basic {}",
                STANDARD.encode(format!("{}:{}", username, token))
            ),
            http,
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}/wiki/rest/api{}", self.base_url, path)
    }

    fn page_url(&self, webui: &str) -> String {
        format!("{}/wiki{}", self.base_url, webui)
    }

    async fn error_from(resp: reqwest::Response) -> ClientError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        ClientError::new(
            reason_for_status(status),
            format!("HTTP {}: {}", status.as_u16(), body.trim()),
        )
    }

    /// Verifies credentials and access to a space. Returns the space display name.
    pub async fn check_space(&self, space_key: &str) -> Result<String, ClientError> {
        let resp = self
            .http
            .get(self.api(&format!("/space/{}", space_key.trim())))
            .header(reqwest::header::AUTHORIZATION, self.auth_header.as_str())
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        let space: Space = resp.json().await?;
        Ok(space.name.unwrap_or_else(|| space_key.trim().to_string()))
    }
}

#[async_trait]
impl DocumentPublisher for WikiClient {
    async fn publish(
        &self,
        title: &str,
        body: &str,
        target: &PublishTarget,
    ) -> Result<PublishedPage, ClientError> {
        let mut payload = json!({
            "type": "page",
            "title": title,
            "space": { "key": target.space },
            "body": {
                "storage": {
                    "value": body,
                    "representation": "storage"
                }
            }
        });
        if let Some(parent) = non_empty(target.parent_id.as_deref()) {
            payload["ancestors"] = json!([{ "id": parent }]);
        }

        let resp = self
            .http
            .post(self.api("/content"))
            .header(reqwest::header::AUTHORIZATION, self.auth_header.as_str())
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = Self::error_from(resp).await;
            log::warn!("Publishing '{}' failed: {}", title, err);
            return Err(err);
        }

        let content: Content = resp.json().await?;
        let page = PublishedPage {
            page_url: self.page_url(&content.links.webui),
            page_id: content.id,
        };
        log::info!("Published '{}' as page {}", title, page.page_id);
        Ok(page)
    }
}

#[async_trait]
impl DocumentSearch for WikiClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<WikiPage>, ClientError> {
        let cql = search_cql(query);
        log::debug!("Searching wiki: {}", cql);

        let resp = self
            .http
            .get(self.api("/content/search"))
            .header(reqwest::header::AUTHORIZATION, self.auth_header.as_str())
            .query(&[
                ("cql", cql.as_str()),
                ("limit", SEARCH_LIMIT),
                ("expand", "body.storage,version,history"),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let found: SearchResponse = resp.json().await?;
        Ok(found
            .results
            .into_iter()
            .map(|c| WikiPage {
                url: self.page_url(&c.links.webui),
                body: c
                    .body
                    .and_then(|b| b.storage)
                    .map(|s| s.value)
                    .unwrap_or_default(),
                page_id: c.id,
                title: c.title,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn query(parent: Option<&str>) -> SearchQuery {
        SearchQuery {
            space: "TEAM".to_string(),
            title_filter: "Meeting Notes".to_string(),
            created_after: NaiveDate::from_ymd_opt(2025, 8, 21).unwrap(),
            parent_id: parent.map(str::to_string),
        }
    }

    #[test]
    fn cql_without_parent() {
        assert_eq!(
            search_cql(&query(None)),
            r#"space="TEAM" AND title~"Meeting Notes" AND created>"2025-08-21""#
        );
    }

    #[test]
    fn cql_with_parent_and_blank_parent() {
        assert!(search_cql(&query(Some("12345"))).ends_with(r#" AND ancestor="12345""#));
        assert!(!search_cql(&query(Some("  "))).contains("ancestor"));
    }

    #[test]
    fn cql_escapes_quotes() {
        let mut q = query(None);
        q.title_filter = r#"say "hi""#.to_string();
        assert!(search_cql(&q).contains(r#"title~"say \"hi\"""#));
    }
}
