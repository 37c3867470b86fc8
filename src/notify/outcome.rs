use std::fmt;

/// General failure outside any channel.
pub const EXIT_GENERAL: i32 = 1;
/// Command-line misuse.
pub const EXIT_USAGE: i32 = 2;
/// Configuration file could not be read or parsed.
pub const EXIT_CONFIG: i32 = 55;

/// Outcome of one backend's delivery attempt. Terminal; never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Delivered to every recipient.
    Success,
    /// No recipients were given for the channel.
    NoTarget,
    /// Channel disabled or declared with the wrong type.
    Disabled,
    /// Delivery stopped at a failing stage.
    Failed(Failure),
}

impl Outcome {
    pub fn failed(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failed(Failure {
            kind,
            detail: detail.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether the outcome should terminate the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Process exit code for this outcome; 0 for non-fatal outcomes.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Failed(failure) => failure.kind.exit_code(),
            _ => 0,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.description(), self.detail)
    }
}

/// Broad class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Transport,
    Auth,
    RemoteRejection,
    Internal,
}

/// The stage at which a delivery failed.
///
/// Codes are grouped in bands per channel: email 12-19, Slack API 30-33,
/// Slack webhook 40-46. They are part of the CLI contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    SmtpConnect,
    SmtpClientBuild,
    SmtpAuth,
    SmtpSender,
    SmtpRecipient,
    SmtpData,
    SmtpWrite,
    SmtpClose,

    SlackToken,
    SlackChannelNotFound,
    SlackConnect,
    SlackChannel,

    WebhookTransport,
    WebhookInvalidPayload,
    WebhookForbidden,
    WebhookChannelNotFound,
    WebhookChannelArchived,
    WebhookServerError,
    WebhookStatus,

    /// A backend task ended without reporting.
    Internal,
}

impl FailureKind {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::SmtpConnect => 12,
            Self::SmtpClientBuild => 13,
            Self::SmtpAuth => 14,
            Self::SmtpSender => 15,
            Self::SmtpRecipient => 16,
            Self::SmtpData => 17,
            Self::SmtpWrite => 18,
            Self::SmtpClose => 19,

            Self::SlackToken => 30,
            Self::SlackChannelNotFound => 31,
            Self::SlackConnect => 32,
            Self::SlackChannel => 33,

            Self::WebhookTransport => 40,
            Self::WebhookInvalidPayload => 41,
            Self::WebhookForbidden => 42,
            Self::WebhookChannelNotFound => 43,
            Self::WebhookChannelArchived => 44,
            Self::WebhookServerError => 45,
            Self::WebhookStatus => 46,

            Self::Internal => EXIT_GENERAL,
        }
    }

    pub fn category(self) -> FailureCategory {
        match self {
            Self::SmtpConnect
            | Self::SmtpClientBuild
            | Self::SmtpData
            | Self::SmtpWrite
            | Self::SmtpClose
            | Self::SlackConnect
            | Self::WebhookTransport
            | Self::WebhookServerError
            | Self::WebhookStatus => FailureCategory::Transport,
            Self::SmtpAuth | Self::SlackToken | Self::WebhookForbidden => FailureCategory::Auth,
            Self::SmtpSender
            | Self::SmtpRecipient
            | Self::SlackChannelNotFound
            | Self::SlackChannel
            | Self::WebhookInvalidPayload
            | Self::WebhookChannelNotFound
            | Self::WebhookChannelArchived => FailureCategory::RemoteRejection,
            Self::Internal => FailureCategory::Internal,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::SmtpConnect => "cannot reach SMTP server",
            Self::SmtpClientBuild => "SMTP session setup failed",
            Self::SmtpAuth => "SMTP authentication failed",
            Self::SmtpSender => "sender rejected",
            Self::SmtpRecipient => "recipient rejected",
            Self::SmtpData => "SMTP data transfer failed",
            Self::SmtpWrite => "writing message body failed",
            Self::SmtpClose => "closing SMTP session failed",
            Self::SlackToken => "slack token invalid",
            Self::SlackChannelNotFound => "slack channel or user not found",
            Self::SlackConnect => "cannot reach slack",
            Self::SlackChannel => "slack post failed",
            Self::WebhookTransport => "webhook request failed",
            Self::WebhookInvalidPayload => "webhook payload rejected (HTTP 400)",
            Self::WebhookForbidden => "webhook action forbidden (HTTP 403)",
            Self::WebhookChannelNotFound => "webhook or channel not found (HTTP 404)",
            Self::WebhookChannelArchived => "webhook channel archived (HTTP 410)",
            Self::WebhookServerError => "slack server error (HTTP 500)",
            Self::WebhookStatus => "unexpected webhook status",
            Self::Internal => "backend task aborted",
        }
    }
}
