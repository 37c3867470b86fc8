use anyhow::bail;

use crate::cli::app::SlackAction;
use crate::config::schema::SlackApiConfig;
use crate::notify::slack_api::{SlackApi, SlackAuth, SlackClient};

pub async fn handle_slack(action: SlackAction, config: &SlackApiConfig) -> anyhow::Result<()> {
    handle_slack_with(&SlackClient::new(), action, config).await
}

/// Lists Slack IDs usable with `send --slack`.
pub async fn handle_slack_with(
    api: &dyn SlackApi,
    action: SlackAction,
    config: &SlackApiConfig,
) -> anyhow::Result<()> {
    if config.token.trim().is_empty() {
        bail!("slack token is not configured (set notifiers.slack.token)");
    }
    let auth = SlackAuth {
        api_url: &config.api_url,
        token: &config.token,
    };

    match action {
        SlackAction::Channels => {
            for channel in api.list_channels(auth).await? {
                let visibility = if channel.is_private { "private" } else { "public" };
                println!("{}\t#{}\t{visibility}", channel.id, channel.name);
            }
        }
        SlackAction::Users => {
            for user in api.list_users(auth).await? {
                if user.deleted || user.is_bot {
                    continue;
                }
                let display = if user.real_name.is_empty() {
                    &user.name
                } else {
                    &user.real_name
                };
                println!("{}\t@{}\t{display}", user.id, user.name);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::notify::error::SlackApiError;
    use crate::notify::slack_api::{Conversation, PostMessage, User};

    struct Unreachable;

    #[async_trait]
    impl SlackApi for Unreachable {
        async fn post_message(&self, _auth: SlackAuth<'_>, _message: &PostMessage) -> Result<(), SlackApiError> {
            unreachable!("post_message is not used for listings")
        }

        async fn list_channels(&self, _auth: SlackAuth<'_>) -> Result<Vec<Conversation>, SlackApiError> {
            Err(SlackApiError::Api("invalid_auth".to_string()))
        }

        async fn list_users(&self, _auth: SlackAuth<'_>) -> Result<Vec<User>, SlackApiError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn missing_token_is_an_error() {
        let err = handle_slack_with(&Unreachable, SlackAction::Users, &SlackApiConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[tokio::test]
    async fn api_errors_propagate() {
        let config = SlackApiConfig {
            token: "xoxb-1".to_string(),
            ..SlackApiConfig::default()
        };
        let err = handle_slack_with(&Unreachable, SlackAction::Channels, &config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid_auth"));

        handle_slack_with(&Unreachable, SlackAction::Users, &config)
            .await
            .unwrap();
    }
}
