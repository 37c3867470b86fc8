use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::notify::channel::ChannelKind;

/// Root configuration for notifier.
///
/// Example:
/// ```toml
/// [logging]
/// level = "info"
///
/// [defaults]
/// subject = "build finished"
///
/// [notifiers.email]
/// type = "email"
/// enabled = true
/// account = "bot@example.com"
/// password = "secret"
/// host = "smtp.example.com"
/// port = 465
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Logging configuration section.
    /// Example: [logging]
    pub logging: LoggingConfig,
    /// Fallback values for `send` when flags are omitted.
    /// Example: [defaults]
    pub defaults: DefaultsConfig,
    /// Per-channel settings.
    /// Example: [notifiers.slack]
    pub notifiers: NotifiersConfig,
}

impl Config {
    /// Returns a copy with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.notifiers.email.password = mask(&config.notifiers.email.password);
        config.notifiers.slack.token = mask(&config.notifiers.slack.token);
        config.notifiers.slack_webhook.webhook_urls = config
            .notifiers
            .slack_webhook
            .webhook_urls
            .iter()
            .map(|url| mask_url(url))
            .collect();
        config
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

fn mask_url(url: &str) -> String {
    match url.rsplit_once('/') {
        Some((prefix, tail)) if !tail.is_empty() => format!("{prefix}/********"),
        _ => url.to_string(),
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    /// Example: level = "info"
    pub level: String,
    /// Emit JSON log lines instead of human-readable ones.
    /// Example: json = false
    pub json: bool,
    /// Optional log file, appended to in addition to stderr.
    /// Example: file = "/var/log/notifier.log"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

/// Defaults applied by `send` for anything not given on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Example: subject = "nightly job"
    pub subject: String,
    /// Example: message = "job finished"
    pub message: String,
    /// File whose contents replace `message` when readable.
    /// Example: message_file = "/var/log/job/error.log"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_file: Option<PathBuf>,
    /// Whitespace-separated email addresses.
    /// Example: email_list_file = "~/.notifier/emails"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_list_file: Option<PathBuf>,
    /// Whitespace-separated Slack user or channel IDs.
    /// Example: slack_list_file = "~/.notifier/slack"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_list_file: Option<PathBuf>,
}

impl DefaultsConfig {
    pub fn default_subject(&self) -> String {
        self.subject.clone()
    }

    /// Contents of `message_file` if it can be read, otherwise `message`.
    pub fn default_message(&self) -> String {
        self.message_file
            .as_deref()
            .and_then(|path| fs::read_to_string(path).ok())
            .unwrap_or_else(|| self.message.clone())
    }

    pub fn default_email_list(&self) -> Vec<String> {
        self.email_list_file
            .as_deref()
            .map(read_list_file)
            .unwrap_or_default()
    }

    pub fn default_slack_list(&self) -> Vec<String> {
        self.slack_list_file
            .as_deref()
            .map(read_list_file)
            .unwrap_or_default()
    }
}

/// Reads a whitespace-separated recipient list; unreadable files yield an empty list.
pub fn read_list_file(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|contents| contents.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// All channel settings, one record per [`ChannelKind`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotifiersConfig {
    pub email: EmailConfig,
    pub slack: SlackApiConfig,
    pub slack_webhook: SlackWebhookConfig,
}

impl NotifiersConfig {
    pub fn get(&self, kind: ChannelKind) -> ChannelConfig {
        match kind {
            ChannelKind::Email => ChannelConfig::Email(self.email.clone()),
            ChannelKind::SlackApi => ChannelConfig::SlackApi(self.slack.clone()),
            ChannelKind::SlackWebhook => ChannelConfig::SlackWebhook(self.slack_webhook.clone()),
        }
    }

    pub(crate) fn enabled_mut(&mut self, kind: ChannelKind) -> &mut bool {
        match kind {
            ChannelKind::Email => &mut self.email.enabled,
            ChannelKind::SlackApi => &mut self.slack.enabled,
            ChannelKind::SlackWebhook => &mut self.slack_webhook.enabled,
        }
    }
}

/// SMTP email channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmailConfig {
    /// Declared channel type; must be "email".
    #[serde(rename = "type")]
    pub channel_type: String,
    /// Example: enabled = true
    pub enabled: bool,
    /// Sender account, also used as the SMTP login.
    /// Example: account = "bot@example.com"
    pub account: String,
    /// Example: password = "app-password"
    pub password: String,
    /// Example: host = "smtp.example.com"
    pub host: String,
    /// Implicit-TLS SMTP port.
    /// Example: port = 465
    pub port: u16,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            channel_type: ChannelKind::Email.type_name().to_string(),
            enabled: false,
            account: String::new(),
            password: String::new(),
            host: String::new(),
            port: 465,
        }
    }
}

/// Slack Web API channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SlackApiConfig {
    /// Declared channel type; must be "slack".
    #[serde(rename = "type")]
    pub channel_type: String,
    pub enabled: bool,
    /// Bot or user token.
    /// Example: token = "xoxb-..."
    pub token: String,
    /// Post as the authed user instead of a bot.
    pub as_user: bool,
    /// Example: username = "notifier"
    pub username: String,
    /// Emoji name with or without surrounding colons.
    /// Example: icon_emoji = "bell"
    pub icon_emoji: String,
    /// Slack Web API base URL.
    /// Example: api_url = "https://slack.com/api"
    pub api_url: String,
}

impl Default for SlackApiConfig {
    fn default() -> Self {
        Self {
            channel_type: ChannelKind::SlackApi.type_name().to_string(),
            enabled: false,
            token: String::new(),
            as_user: false,
            username: "notifier".to_string(),
            icon_emoji: "bell".to_string(),
            api_url: "https://slack.com/api".to_string(),
        }
    }
}

/// Slack incoming-webhook channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SlackWebhookConfig {
    /// Declared channel type; must be "slack_webhook".
    #[serde(rename = "type")]
    pub channel_type: String,
    pub enabled: bool,
    /// Example: webhook_urls = ["https://hooks.slack.com/services/..."]
    pub webhook_urls: Vec<String>,
    pub username: String,
    pub icon_emoji: String,
}

impl Default for SlackWebhookConfig {
    fn default() -> Self {
        Self {
            channel_type: ChannelKind::SlackWebhook.type_name().to_string(),
            enabled: false,
            webhook_urls: Vec::new(),
            username: "notifier".to_string(),
            icon_emoji: "bell".to_string(),
        }
    }
}

/// Settings for a single channel, as handed to its backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelConfig {
    Email(EmailConfig),
    SlackApi(SlackApiConfig),
    SlackWebhook(SlackWebhookConfig),
}

impl ChannelConfig {
    pub fn kind(&self) -> ChannelKind {
        match self {
            Self::Email(_) => ChannelKind::Email,
            Self::SlackApi(_) => ChannelKind::SlackApi,
            Self::SlackWebhook(_) => ChannelKind::SlackWebhook,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            Self::Email(config) => config.enabled,
            Self::SlackApi(config) => config.enabled,
            Self::SlackWebhook(config) => config.enabled,
        }
    }

    pub fn declared_type(&self) -> &str {
        match self {
            Self::Email(config) => &config.channel_type,
            Self::SlackApi(config) => &config.channel_type,
            Self::SlackWebhook(config) => &config.channel_type,
        }
    }

    /// Enabled and declared with the type string its kind expects.
    pub fn is_active(&self) -> bool {
        self.enabled() && self.declared_type() == self.kind().type_name()
    }
}
