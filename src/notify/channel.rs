use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::schema::ChannelConfig;
use crate::notify::outcome::Outcome;
use crate::notify::request::NotificationRequest;

/// A delivery mechanism. Ordering is the order outcomes are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ChannelKind {
    Email,
    SlackApi,
    SlackWebhook,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 3] = [Self::Email, Self::SlackApi, Self::SlackWebhook];

    /// Human-readable name used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::SlackApi => "slack",
            Self::SlackWebhook => "slack webhook",
        }
    }

    /// The `type` string a channel's config must declare.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::SlackApi => "slack",
            Self::SlackWebhook => "slack_webhook",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Delivery capability for one channel kind.
///
/// Implementations report every condition through the returned [`Outcome`]; they never
/// panic on remote failures and own their transport timeouts.
#[async_trait]
pub trait NotifierBackend: Send + Sync {
    fn kind(&self) -> ChannelKind;

    async fn attempt(
        &self,
        request: &NotificationRequest,
        recipients: &[String],
        config: &ChannelConfig,
    ) -> Outcome;
}

/// Checks shared by every backend before any transport is touched.
///
/// A disabled channel, a type mismatch, or a config of the wrong kind yields
/// `Disabled`; an empty recipient list yields `NoTarget`.
pub fn precheck(kind: ChannelKind, recipients: &[String], config: &ChannelConfig) -> Option<Outcome> {
    if config.kind() != kind || !config.is_active() {
        return Some(Outcome::Disabled);
    }
    if recipients.is_empty() {
        return Some(Outcome::NoTarget);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{EmailConfig, SlackApiConfig};

    fn enabled_email() -> ChannelConfig {
        ChannelConfig::Email(EmailConfig {
            enabled: true,
            ..EmailConfig::default()
        })
    }

    #[test]
    fn kinds_are_ordered_email_first() {
        let mut kinds = vec![
            ChannelKind::SlackWebhook,
            ChannelKind::Email,
            ChannelKind::SlackApi,
        ];
        kinds.sort();
        assert_eq!(kinds, ChannelKind::ALL.to_vec());
    }

    #[test]
    fn precheck_reports_disabled_before_no_target() {
        let config = ChannelConfig::Email(EmailConfig::default());
        assert_eq!(
            precheck(ChannelKind::Email, &[], &config),
            Some(Outcome::Disabled)
        );
    }

    #[test]
    fn precheck_reports_no_target_for_empty_recipients() {
        assert_eq!(
            precheck(ChannelKind::Email, &[], &enabled_email()),
            Some(Outcome::NoTarget)
        );
    }

    #[test]
    fn precheck_rejects_config_of_other_kind() {
        let config = ChannelConfig::SlackApi(SlackApiConfig {
            enabled: true,
            ..SlackApiConfig::default()
        });
        let recipients = vec!["a@x.com".to_string()];
        assert_eq!(
            precheck(ChannelKind::Email, &recipients, &config),
            Some(Outcome::Disabled)
        );
    }

    #[test]
    fn precheck_passes_active_targeted_channel() {
        let recipients = vec!["a@x.com".to_string()];
        assert_eq!(precheck(ChannelKind::Email, &recipients, &enabled_email()), None);
    }
}
