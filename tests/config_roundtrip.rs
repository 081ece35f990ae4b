// File: tests/config_roundtrip.rs
use minutes::config::{Config, Recipient};
use minutes::context::{AppContext, TestContext};

#[test]
fn test_missing_config_is_detected() {
    let ctx = TestContext::new();
    let err = Config::load(&ctx).unwrap_err();
    assert!(Config::is_missing_config_error(&err));
}

#[test]
fn test_save_then_load_keeps_recipients() {
    let ctx = TestContext::new();
    let config = Config {
        wiki_url: "https://example.atlassian.net".to_string(),
        wiki_username: "bot@example.com".to_string(),
        wiki_token: "secret".to_string(),
        wiki_space: "TEAM".to_string(),
        wiki_parent_id: Some("999".to_string()),
        chat_channel: "#minutes".to_string(),
        search_days: 14,
        recipients: vec![
            Recipient {
                name: "Alice".to_string(),
                chat_id: "U1".to_string(),
                ..Recipient::default()
            },
            Recipient {
                name: "Bob".to_string(),
                chat_id: "U2".to_string(),
                wiki_space: Some("~bob".to_string()),
                ..Recipient::default()
            },
        ],
        ..Config::default()
    };
    config.save(&ctx).unwrap();
    assert!(ctx.get_config_file_path().unwrap().exists());

    let loaded = Config::load(&ctx).unwrap();
    assert_eq!(loaded.search_days, 14);
    assert_eq!(loaded.title_filter, "Meeting Notes");
    assert_eq!(loaded.recipients, config.recipients);
    assert_eq!(loaded.publish_target().parent_id.as_deref(), Some("999"));
    assert_eq!(loaded.wiki_access_for(&loaded.recipients[1]).space, "~bob");
    assert_eq!(loaded.wiki_access_for(&loaded.recipients[0]).space, "TEAM");
}

#[test]
fn test_broken_file_is_not_reported_as_missing() {
    let ctx = TestContext::new();
    std::fs::write(ctx.get_config_file_path().unwrap(), "wiki_url = [").unwrap();
    let err = Config::load(&ctx).unwrap_err();
    assert!(!Config::is_missing_config_error(&err));
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_log_level_names() {
    let mut config = Config::default();
    config.log_level = "DEBUG".to_string();
    assert_eq!(config.log_level_filter(), log::LevelFilter::Debug);
    config.log_level = "nonsense".to_string();
    assert_eq!(config.log_level_filter(), log::LevelFilter::Info);
}
