use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::schema::{ChannelConfig, SlackApiConfig};
use crate::notify::channel::{ChannelKind, NotifierBackend, precheck};
use crate::notify::error::SlackApiError;
use crate::notify::outcome::{FailureKind, Outcome};
use crate::notify::request::NotificationRequest;
use crate::notify::slack_api::{Attachment, PostMessage, SlackApi, SlackAuth, SlackClient};

const CONNECT_MARKERS: [&str; 5] = [
    "error sending request",
    "dns",
    "no such host",
    "connect",
    "timed out",
];

/// Posts through the Slack Web API, one `chat.postMessage` per recipient.
pub struct SlackApiBackend {
    api: Arc<dyn SlackApi>,
}

impl SlackApiBackend {
    pub fn new() -> Self {
        Self::with_api(Arc::new(SlackClient::new()))
    }

    pub fn with_api(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }
}

impl Default for SlackApiBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotifierBackend for SlackApiBackend {
    fn kind(&self) -> ChannelKind {
        ChannelKind::SlackApi
    }

    async fn attempt(
        &self,
        request: &NotificationRequest,
        recipients: &[String],
        config: &ChannelConfig,
    ) -> Outcome {
        if let Some(outcome) = precheck(self.kind(), recipients, config) {
            return outcome;
        }
        let ChannelConfig::SlackApi(config) = config else {
            return Outcome::Disabled;
        };

        if config.token.is_empty() {
            warn!("Slack token is empty");
            return Outcome::failed(FailureKind::SlackToken, "no token configured");
        }

        let auth = SlackAuth {
            api_url: &config.api_url,
            token: &config.token,
        };
        for recipient in recipients {
            let message = build_message(config, recipient, request);
            if let Err(err) = self.api.post_message(auth, &message).await {
                let kind = classify_error(&err);
                warn!(recipient = %recipient, stage = ?kind, error = %err, "Slack post failed");
                return Outcome::failed(kind, format!("{recipient}: {err}"));
            }
            debug!(recipient = %recipient, "Slack message posted");
        }

        info!(recipients = recipients.len(), "Slack notification posted");
        Outcome::Success
    }
}

fn build_message(config: &SlackApiConfig, channel: &str, request: &NotificationRequest) -> PostMessage {
    PostMessage {
        channel: channel.to_string(),
        text: request.subject().to_string(),
        as_user: config.as_user,
        username: config.username.clone(),
        icon_emoji: wrap_emoji(&config.icon_emoji),
        attachments: vec![Attachment {
            text: request.body().to_string(),
            ..Attachment::default()
        }],
    }
}

/// `bell` and `:bell:` both become `:bell:`; empty stays empty.
pub fn wrap_emoji(name: &str) -> String {
    let name = name.trim().trim_matches(':');
    if name.is_empty() {
        String::new()
    } else {
        format!(":{name}:")
    }
}

/// Maps a Slack failure to a stage: transport failures by variant, the rest by the
/// text of the error.
pub fn classify_error(err: &SlackApiError) -> FailureKind {
    if matches!(err, SlackApiError::Connect(_)) {
        return FailureKind::SlackConnect;
    }
    let text = err.to_string().to_lowercase();
    if text.contains("auth") || text.contains("token") {
        FailureKind::SlackToken
    } else if CONNECT_MARKERS.iter().any(|marker| text.contains(marker)) {
        FailureKind::SlackConnect
    } else if text.contains("channel_not_found") {
        FailureKind::SlackChannelNotFound
    } else {
        FailureKind::SlackChannel
    }
}
