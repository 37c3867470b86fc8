use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::schema::{ChannelConfig, SlackWebhookConfig};
use crate::notify::channel::{ChannelKind, NotifierBackend, precheck};
use crate::notify::outcome::{Failure, FailureKind, Outcome};
use crate::notify::request::NotificationRequest;
use crate::notify::slack::wrap_emoji;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts to Slack incoming webhooks.
pub struct SlackWebhookBackend {
    timeout: Duration,
}

impl SlackWebhookBackend {
    pub fn new() -> Self {
        Self {
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn client(&self) -> Client {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build webhook client; using defaults");
                Client::new()
            })
    }
}

impl Default for SlackWebhookBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotifierBackend for SlackWebhookBackend {
    fn kind(&self) -> ChannelKind {
        ChannelKind::SlackWebhook
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
        let ChannelConfig::SlackWebhook(config) = config else {
            return Outcome::Disabled;
        };
        if config.webhook_urls.is_empty() {
            debug!("No webhook URLs configured");
            return Outcome::Disabled;
        }

        let client = self.client();
        let targets = plan_targets(&config.webhook_urls, recipients);
        for target in &targets {
            let payload = WebhookPayload::new(config, target.channel, request);
            if let Err(failure) = post_once(&client, target.url, &payload).await {
                warn!(
                    channel = target.channel,
                    stage = ?failure.kind,
                    error = %failure.detail,
                    "Webhook post failed"
                );
                return Outcome::Failed(failure);
            }
            debug!(channel = target.channel, "Webhook message posted");
        }

        info!(posts = targets.len(), "Slack webhook notification posted");
        Outcome::Success
    }
}

/// One POST: a hook URL and the channel override (empty for the hook's default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookTarget<'a> {
    pub url: &'a str,
    pub channel: &'a str,
}

/// With exactly one hook, every recipient is posted through it as a channel
/// override. Otherwise each hook is posted once to its default channel.
pub fn plan_targets<'a>(urls: &'a [String], recipients: &'a [String]) -> Vec<WebhookTarget<'a>> {
    match urls {
        [url] if !recipients.is_empty() => recipients
            .iter()
            .map(|channel| WebhookTarget { url, channel })
            .collect(),
        _ => urls
            .iter()
            .map(|url| WebhookTarget { url, channel: "" })
            .collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    username: &'a str,
    icon_emoji: String,
    text: &'a str,
    channel: &'a str,
    attachments: [WebhookAttachment<'a>; 1],
}

#[derive(Debug, Serialize)]
struct WebhookAttachment<'a> {
    text: &'a str,
}

impl<'a> WebhookPayload<'a> {
    pub fn new(config: &'a SlackWebhookConfig, channel: &'a str, request: &'a NotificationRequest) -> Self {
        Self {
            username: &config.username,
            icon_emoji: wrap_emoji(&config.icon_emoji),
            text: request.subject(),
            channel,
            attachments: [WebhookAttachment {
                text: request.body(),
            }],
        }
    }
}

async fn post_once(client: &Client, url: &str, payload: &WebhookPayload<'_>) -> Result<(), Failure> {
    let response = client
        .post(url)
        .json(payload)
        .send()
        .await
        .map_err(|err| Failure {
            kind: FailureKind::WebhookTransport,
            detail: format!("request error: {err}"),
        })?;

    let status = response.status();
    match classify_status(status) {
        None => Ok(()),
        Some(kind) => Err(Failure {
            kind,
            detail: format!("{url} returned {status}"),
        }),
    }
}

/// `None` for a 2xx status, otherwise the failure it stands for.
pub fn classify_status(status: StatusCode) -> Option<FailureKind> {
    if status.is_success() {
        return None;
    }
    Some(match status.as_u16() {
        400 => FailureKind::WebhookInvalidPayload,
        403 => FailureKind::WebhookForbidden,
        404 => FailureKind::WebhookChannelNotFound,
        410 => FailureKind::WebhookChannelArchived,
        500 => FailureKind::WebhookServerError,
        _ => FailureKind::WebhookStatus,
    })
}
