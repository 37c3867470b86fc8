use std::path::PathBuf;

use notifier::config::schema::{
    Config, DefaultsConfig, EmailConfig, LoggingConfig, SlackApiConfig, SlackWebhookConfig,
};
use notifier::notify::ChannelKind;

#[test]
fn test_deserialize_full_config() {
    let toml_str = r#"
[logging]
level = "debug"
json = true
file = "/tmp/notifier.log"

[defaults]
subject = "nightly"
message = "build done"
message_file = "/tmp/message.txt"
email_list_file = "/tmp/emails.txt"
slack_list_file = "/tmp/slack.txt"

[notifiers.email]
type = "email"
enabled = true
account = "bot@example.com"
password = "secret"
host = "smtp.example.com"
port = 2465

[notifiers.slack]
type = "slack"
enabled = true
token = "xoxb-1"
as_user = true
username = "ci"
icon_emoji = ":rocket:"
api_url = "http://localhost:9000/api"

[notifiers.slack_webhook]
type = "slack_webhook"
enabled = false
webhook_urls = ["https://hooks.slack.com/services/1", "https://hooks.slack.com/services/2"]
username = "ci-hook"
icon_emoji = "ghost"
"#;

    let config: Config = toml::from_str(toml_str).expect("parse full config");

    assert_eq!(
        config.logging,
        LoggingConfig {
            level: "debug".to_string(),
            json: true,
            file: Some(PathBuf::from("/tmp/notifier.log")),
        }
    );
    assert_eq!(
        config.defaults,
        DefaultsConfig {
            subject: "nightly".to_string(),
            message: "build done".to_string(),
            message_file: Some(PathBuf::from("/tmp/message.txt")),
            email_list_file: Some(PathBuf::from("/tmp/emails.txt")),
            slack_list_file: Some(PathBuf::from("/tmp/slack.txt")),
        }
    );
    assert_eq!(
        config.notifiers.email,
        EmailConfig {
            channel_type: "email".to_string(),
            enabled: true,
            account: "bot@example.com".to_string(),
            password: "secret".to_string(),
            host: "smtp.example.com".to_string(),
            port: 2465,
        }
    );
    assert_eq!(
        config.notifiers.slack,
        SlackApiConfig {
            channel_type: "slack".to_string(),
            enabled: true,
            token: "xoxb-1".to_string(),
            as_user: true,
            username: "ci".to_string(),
            icon_emoji: ":rocket:".to_string(),
            api_url: "http://localhost:9000/api".to_string(),
        }
    );
    assert_eq!(
        config.notifiers.slack_webhook,
        SlackWebhookConfig {
            channel_type: "slack_webhook".to_string(),
            enabled: false,
            webhook_urls: vec![
                "https://hooks.slack.com/services/1".to_string(),
                "https://hooks.slack.com/services/2".to_string(),
            ],
            username: "ci-hook".to_string(),
            icon_emoji: "ghost".to_string(),
        }
    );
}

#[test]
fn test_partial_config_uses_defaults() {
    let config: Config = toml::from_str(
        r#"
[notifiers.slack]
enabled = true
token = "xoxb-2"
"#,
    )
    .expect("parse partial config");

    assert_eq!(config.logging, LoggingConfig::default());
    assert_eq!(config.defaults, DefaultsConfig::default());
    assert_eq!(config.notifiers.email, EmailConfig::default());
    assert_eq!(config.notifiers.slack.channel_type, "slack");
    assert_eq!(config.notifiers.slack.api_url, "https://slack.com/api");
    assert!(config.notifiers.get(ChannelKind::SlackApi).is_active());
}

#[test]
fn test_empty_config_disables_everything() {
    let config: Config = toml::from_str("").expect("parse empty config");
    assert_eq!(config, Config::default());
    for kind in ChannelKind::ALL {
        assert!(!config.notifiers.get(kind).is_active());
    }
}

#[test]
fn test_mismatched_type_is_not_active() {
    let config: Config = toml::from_str(
        r#"
[notifiers.email]
type = "slack"
enabled = true
"#,
    )
    .expect("parse config");

    let email = config.notifiers.get(ChannelKind::Email);
    assert!(email.enabled());
    assert!(!email.is_active());
}

#[test]
fn test_serialize_writes_type_key() {
    let serialized = toml::to_string(&Config::default()).expect("serialize config");

    assert!(serialized.contains("[notifiers.email]"));
    assert!(serialized.contains("type = \"email\""));
    assert!(serialized.contains("type = \"slack_webhook\""));
    assert!(!serialized.contains("channel_type"));
}

#[test]
fn test_unknown_keys_are_ignored() {
    let config: Config = toml::from_str(
        r#"
[notifiers.email]
enabled = true
signature = "unused"
"#,
    )
    .expect("parse config with unknown key");

    assert!(config.notifiers.email.enabled);
}
