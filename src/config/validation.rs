use std::path::Path;

use crate::config::schema::{Config, EmailConfig, SlackApiConfig, SlackWebhookConfig};
use crate::notify::channel::ChannelKind;

#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

#[derive(Debug)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

pub fn validate_config(config: &Config) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    validate_log_level(&config.logging.level, &mut errors);

    validate_list_file(
        "defaults.message_file",
        config.defaults.message_file.as_deref(),
        &mut warnings,
    );
    validate_list_file(
        "defaults.email_list_file",
        config.defaults.email_list_file.as_deref(),
        &mut warnings,
    );
    validate_list_file(
        "defaults.slack_list_file",
        config.defaults.slack_list_file.as_deref(),
        &mut warnings,
    );

    validate_email(&config.notifiers.email, &mut errors, &mut warnings);
    validate_slack(&config.notifiers.slack, &mut errors, &mut warnings);
    validate_webhook(&config.notifiers.slack_webhook, &mut errors, &mut warnings);

    ValidationResult { errors, warnings }
}

fn validate_email(
    email: &EmailConfig,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    validate_type(
        "notifiers.email.type",
        &email.channel_type,
        ChannelKind::Email,
        warnings,
    );
    if !email.enabled {
        return;
    }

    if email.host.trim().is_empty() {
        errors.push(ValidationError {
            field: "notifiers.email.host".to_string(),
            message: "SMTP host cannot be empty".to_string(),
            suggestion: Some("Set host to your provider's SMTPS server".to_string()),
        });
    }
    if email.port == 0 {
        errors.push(ValidationError {
            field: "notifiers.email.port".to_string(),
            message: "SMTP port must be between 1 and 65535".to_string(),
            suggestion: Some("Implicit-TLS SMTP usually listens on 465".to_string()),
        });
    }
    if !email.account.contains('@') {
        errors.push(ValidationError {
            field: "notifiers.email.account".to_string(),
            message: format!("Sender account is not an email address: {:?}", email.account),
            suggestion: None,
        });
    }
    if email.password.is_empty() {
        warnings.push(ValidationWarning {
            field: "notifiers.email.password".to_string(),
            message: "Password is empty; most servers will reject authentication".to_string(),
        });
    }
}

fn validate_slack(
    slack: &SlackApiConfig,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    validate_type(
        "notifiers.slack.type",
        &slack.channel_type,
        ChannelKind::SlackApi,
        warnings,
    );
    if !slack.enabled {
        return;
    }

    if slack.token.trim().is_empty() {
        errors.push(ValidationError {
            field: "notifiers.slack.token".to_string(),
            message: "Slack token cannot be empty".to_string(),
            suggestion: Some("Create a bot token with the chat:write scope".to_string()),
        });
    }
    if !is_http_url(&slack.api_url) {
        errors.push(ValidationError {
            field: "notifiers.slack.api_url".to_string(),
            message: "Slack API URL must start with http:// or https://".to_string(),
            suggestion: None,
        });
    }
}

fn validate_webhook(
    webhook: &SlackWebhookConfig,
    errors: &mut Vec<ValidationError>,
    warnings: &mut Vec<ValidationWarning>,
) {
    validate_type(
        "notifiers.slack_webhook.type",
        &webhook.channel_type,
        ChannelKind::SlackWebhook,
        warnings,
    );

    for (index, url) in webhook.webhook_urls.iter().enumerate() {
        if !is_http_url(url) {
            errors.push(ValidationError {
                field: format!("notifiers.slack_webhook.webhook_urls[{index}]"),
                message: "Webhook URL must start with http:// or https://".to_string(),
                suggestion: None,
            });
        }
    }

    if webhook.enabled && webhook.webhook_urls.is_empty() {
        errors.push(ValidationError {
            field: "notifiers.slack_webhook.webhook_urls".to_string(),
            message: "Webhook channel enabled but no URLs configured".to_string(),
            suggestion: Some("Add at least one incoming-webhook URL".to_string()),
        });
    }
}

fn validate_type(
    field: &str,
    declared: &str,
    kind: ChannelKind,
    warnings: &mut Vec<ValidationWarning>,
) {
    if declared != kind.type_name() {
        warnings.push(ValidationWarning {
            field: field.to_string(),
            message: format!(
                "Declared type {declared:?} is not {:?}; the channel will be treated as invalid",
                kind.type_name()
            ),
        });
    }
}

fn validate_log_level(level: &str, errors: &mut Vec<ValidationError>) {
    let level = level.trim().to_lowercase();
    let valid = ["trace", "debug", "info", "warn", "error"];
    if !valid.iter().any(|value| *value == level) {
        errors.push(ValidationError {
            field: "logging.level".to_string(),
            message: format!("Invalid log level: {level}"),
            suggestion: Some(format!("Valid levels: {}", valid.join(", "))),
        });
    }
}

fn validate_list_file(field: &str, path: Option<&Path>, warnings: &mut Vec<ValidationWarning>) {
    let Some(path) = path else {
        return;
    };
    if !path.is_file() {
        warnings.push(ValidationWarning {
            field: field.to_string(),
            message: format!("File not readable, it will be ignored: {}", path.display()),
        });
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value.starts_with("http://") || value.starts_with("https://")
}
