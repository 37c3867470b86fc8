//! Thin Slack Web API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::notify::error::SlackApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const PAGE_LIMIT: &str = "200";

/// Where and as whom to call the Web API.
#[derive(Debug, Clone, Copy)]
pub struct SlackAuth<'a> {
    pub api_url: &'a str,
    pub token: &'a str,
}

/// Body of `chat.postMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostMessage {
    pub channel: String,
    pub text: String,
    pub as_user: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon_emoji: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub pretext: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_archived: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub real_name: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
}

#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn post_message(&self, auth: SlackAuth<'_>, message: &PostMessage) -> Result<(), SlackApiError>;
    async fn list_channels(&self, auth: SlackAuth<'_>) -> Result<Vec<Conversation>, SlackApiError>;
    async fn list_users(&self, auth: SlackAuth<'_>) -> Result<Vec<User>, SlackApiError>;
}

/// `reqwest`-backed [`SlackApi`].
#[derive(Debug, Clone)]
pub struct SlackClient {
    client: Client,
}

impl SlackClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build slack client; using defaults");
                Client::new()
            });
        Self { client }
    }

    fn endpoint(auth: SlackAuth<'_>, method: &str) -> Result<Url, SlackApiError> {
        let base = auth.api_url.trim_end_matches('/');
        Url::parse(&format!("{base}/{method}"))
            .map_err(|err| SlackApiError::Api(format!("invalid api url {base}: {err}")))
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SlackApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(SlackApiError::Status(status));
        }
        let envelope: Envelope<T> = response.json().await?;
        if !envelope.ok {
            let error = envelope.error.unwrap_or_else(|| "unknown_error".to_string());
            return Err(SlackApiError::Api(error));
        }
        envelope
            .data
            .ok_or_else(|| SlackApiError::Api("missing response body".to_string()))
    }

    /// Follows `response_metadata.next_cursor` until the listing is exhausted.
    async fn list_all<T: DeserializeOwned>(
        &self,
        auth: SlackAuth<'_>,
        method: &str,
        params: &[(&str, &str)],
        pick: fn(Page<T>) -> (Vec<T>, Option<String>),
    ) -> Result<Vec<T>, SlackApiError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut url = Self::endpoint(auth, method)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("limit", PAGE_LIMIT);
                for (key, value) in params {
                    query.append_pair(key, value);
                }
                if let Some(cursor) = &cursor {
                    query.append_pair("cursor", cursor);
                }
            }

            let response = self.client.get(url).bearer_auth(auth.token).send().await?;
            let page: Page<T> = Self::read(response).await?;
            let (batch, next) = pick(page);
            items.extend(batch);

            match next.filter(|next| !next.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(method, count = items.len(), "Slack listing complete");
        Ok(items)
    }
}

impl Default for SlackClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn post_message(&self, auth: SlackAuth<'_>, message: &PostMessage) -> Result<(), SlackApiError> {
        let url = Self::endpoint(auth, "chat.postMessage")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(auth.token)
            .json(message)
            .send()
            .await?;
        let _: serde_json::Value = Self::read(response).await?;
        Ok(())
    }

    async fn list_channels(&self, auth: SlackAuth<'_>) -> Result<Vec<Conversation>, SlackApiError> {
        self.list_all(
            auth,
            "conversations.list",
            &[("exclude_archived", "true"), ("types", "public_channel,private_channel")],
            |page| (page.channels, page.response_metadata.next_cursor),
        )
        .await
    }

    async fn list_users(&self, auth: SlackAuth<'_>) -> Result<Vec<User>, SlackApiError> {
        self.list_all(auth, "users.list", &[], |page| {
            (page.members, page.response_metadata.next_cursor)
        })
        .await
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    channels: Vec<T>,
    #[serde(default = "Vec::new")]
    members: Vec<T>,
    #[serde(default)]
    response_metadata: ResponseMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}
