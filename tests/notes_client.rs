// File: tests/notes_client.rs
use chrono::NaiveDate;
use minutes::client::{FailureReason, MeetingInput, NoteStructurer, NotesClient};
use minutes::model::ActionItem;
use minutes::model::intake::parse_action_items_json;
use mockito::{Matcher, Server};
use serde_json::json;

fn client(server: &Server) -> NotesClient {
    NotesClient::with_api_base("sk-test", "gpt-4o", &server.url()).expect("client")
}

fn completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "model": "gpt-4o",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
        ]
    })
    .to_string()
}

#[tokio::test]
async fn test_structure_sends_meeting_and_required_items() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "model": "gpt-4o", "temperature": 0.3 })),
            Matcher::Regex("Attendees: Kim, Lee".to_string()),
            Matcher::Regex("Task: Draft sheet \\| Owner: kim \\| Due: 2025-10-27".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion("# Coupon sync\n- [ ] Draft sheet — @kim — Due: 2025-10-27\n"))
        .create_async()
        .await;

    let items = vec![ActionItem::new("Draft sheet", "kim", "2025-10-27")];
    let meeting = MeetingInput {
        topic: "Coupon sync",
        date: NaiveDate::from_ymd_opt(2025, 10, 20).unwrap(),
        attendees: "Kim, Lee",
        notes: "We talked about coupons.",
        action_items: &items,
    };
    let minutes = client(&server).structure(&meeting).await.expect("structure");

    assert_eq!(minutes, "# Coupon sync\n- [ ] Draft sheet — @kim — Due: 2025-10-27");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_action_item_reply_feeds_json_intake() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({ "temperature": 0.4 })))
        .with_status(200)
        .with_body(completion(
            "Here you go:\n```json\n[{\"task\": \"Fix sheet\", \"assignee\": \"\", \"due\": \"TBD\"}]\n```",
        ))
        .create_async()
        .await;

    let reply = client(&server)
        .extract_action_items("The sheet needs fixing.")
        .await
        .expect("items");
    let items = parse_action_items_json(&reply);

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].task, "Fix sheet");
    assert_eq!(items[0].assignee, "TBD");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_title_request_sends_only_the_start_of_the_notes() {
    let mut server = Server::new_async().await;
    let notes = format!("{}TAIL", "a".repeat(500));
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("a{500}\"".to_string()))
        .with_status(200)
        .with_body(completion("  Coupon review \n"))
        .create_async()
        .await;

    let title = client(&server).suggest_title(&notes).await.expect("title");
    assert_eq!(title, "Coupon review");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_failures_map_to_reasons() {
    let mut server = Server::new_async().await;
    let notes = client(&server);

    for (status, reason) in [
        (401, FailureReason::Auth),
        (403, FailureReason::Permission),
        (404, FailureReason::NotFound),
        (500, FailureReason::Unknown),
    ] {
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(status)
            .with_body(r#"{"error":{"message":"nope"}}"#)
            .create_async()
            .await;

        let err = notes.summarize("# Minutes").await.unwrap_err();
        assert_eq!(err.reason, reason, "status {}", status);
        mock.remove_async().await;
    }
}

#[tokio::test]
async fn test_empty_completion_is_an_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[]}"#)
        .create_async()
        .await;

    let err = client(&server).summarize("# Minutes").await.unwrap_err();
    assert_eq!(err.reason, FailureReason::Unknown);
}
