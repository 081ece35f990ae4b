// File: tests/wiki_client.rs
use chrono::NaiveDate;
use minutes::client::{
    DocumentPublisher, DocumentSearch, FailureReason, PublishTarget, SearchQuery, WikiClient,
};
use mockito::{Matcher, Server};
use serde_json::json;

const AUTH: &str = "Basic Ym90QGV4YW1wbGUuY29tOnNlY3JldA==";

fn client(url: &str) -> WikiClient {
    WikiClient::new(url, "bot@example.com", "secret").expect("client")
}

#[tokio::test]
async fn test_publish_creates_page_under_parent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/wiki/rest/api/content")
        .match_header("authorization", AUTH)
        .match_body(Matcher::PartialJson(json!({
            "type": "page",
            "title": "2025-10-20 Sync – Meeting Notes",
            "space": { "key": "TEAM" },
            "ancestors": [{ "id": "999" }],
            "body": { "storage": { "value": "<h1>Hi</h1>", "representation": "storage" } }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"12345","title":"x","_links":{"webui":"/spaces/TEAM/pages/12345"}}"#)
        .create_async()
        .await;

    let target = PublishTarget {
        space: "TEAM".to_string(),
        parent_id: Some("999".to_string()),
    };
    let page = client(&server.url())
        .publish("2025-10-20 Sync – Meeting Notes", "<h1>Hi</h1>", &target)
        .await
        .expect("publish");

    assert_eq!(page.page_id, "12345");
    assert_eq!(
        page.page_url,
        format!("{}/wiki/spaces/TEAM/pages/12345", server.url())
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_publish_maps_http_failures() {
    let mut server = Server::new_async().await;
    let target = PublishTarget {
        space: "TEAM".to_string(),
        parent_id: None,
    };

    for (status, reason) in [
        (401, FailureReason::Auth),
        (403, FailureReason::Permission),
        (404, FailureReason::NotFound),
        (504, FailureReason::Timeout),
        (500, FailureReason::Unknown),
    ] {
        let mock = server
            .mock("POST", "/wiki/rest/api/content")
            .with_status(status)
            .with_body("nope")
            .create_async()
            .await;

        let err = client(&server.url())
            .publish("T", "", &target)
            .await
            .unwrap_err();
        assert_eq!(err.reason, reason, "status {}", status);
        assert!(err.detail.contains(&status.to_string()));

        mock.remove_async().await;
    }
}

#[tokio::test]
async fn test_search_returns_pages_with_bodies() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/wiki/rest/api/content/search")
        .match_header("authorization", AUTH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded(
                "cql".into(),
                r#"space="TEAM" AND title~"Meeting Notes" AND created>"2025-08-21""#.into(),
            ),
            Matcher::UrlEncoded("limit".into(), "100".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "results": [
                    {
                        "id": "1",
                        "title": "2025-10-13 Sync – Meeting Notes",
                        "_links": { "webui": "/spaces/TEAM/pages/1" },
                        "body": { "storage": { "value": "<p>a</p>" } }
                    },
                    { "id": "2", "title": "No body", "_links": { "webui": "/x/2" } }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let query = SearchQuery {
        space: "TEAM".to_string(),
        title_filter: "Meeting Notes".to_string(),
        created_after: NaiveDate::from_ymd_opt(2025, 8, 21).unwrap(),
        parent_id: None,
    };
    let pages = client(&server.url()).search(&query).await.expect("search");

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].page_id, "1");
    assert_eq!(pages[0].body, "<p>a</p>");
    assert_eq!(pages[0].url, format!("{}/wiki/spaces/TEAM/pages/1", server.url()));
    assert_eq!(pages[1].body, "");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_check_space_reports_name_and_auth_failure() {
    let mut server = Server::new_async().await;
    let ok = server
        .mock("GET", "/wiki/rest/api/space/TEAM")
        .with_status(200)
        .with_body(r#"{"key":"TEAM","name":"Team Space"}"#)
        .create_async()
        .await;
    let denied = server
        .mock("GET", "/wiki/rest/api/space/SECRET")
        .with_status(401)
        .create_async()
        .await;

    let wiki = client(&server.url());
    assert_eq!(wiki.check_space("TEAM").await.unwrap(), "Team Space");
    assert_eq!(
        wiki.check_space("SECRET").await.unwrap_err().reason,
        FailureReason::Auth
    );
    ok.assert_async().await;
    denied.assert_async().await;
}

#[test]
fn test_blank_url_is_rejected() {
    assert!(WikiClient::new("  ", "u", "t").is_err());
}
