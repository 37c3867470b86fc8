use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, warn};

use crate::config::schema::{ChannelConfig, EmailConfig};
use crate::notify::channel::{ChannelKind, NotifierBackend, precheck};
use crate::notify::error::SmtpError;
use crate::notify::outcome::{Failure, FailureKind, Outcome};
use crate::notify::request::NotificationRequest;
use crate::notify::smtp::{SmtpConnector, TlsSmtpConnector, check_address};

/// Maximum subject length in bytes; longer subjects are cut, not rejected.
pub const MAX_EMAIL_SUBJECT_LEN: usize = 256;

const CLIENT_NAME: &str = "localhost";

pub struct EmailBackend {
    connector: Arc<dyn SmtpConnector>,
}

impl EmailBackend {
    pub fn new() -> Self {
        Self::with_connector(Arc::new(TlsSmtpConnector::new()))
    }

    pub fn with_connector(connector: Arc<dyn SmtpConnector>) -> Self {
        Self { connector }
    }

    async fn deliver(&self, config: &EmailConfig, message: &EmailMessage) -> Result<(), Failure> {
        message.check_addresses()?;

        let mut session = self
            .connector
            .connect(&config.host, config.port)
            .await
            .map_err(at(FailureKind::SmtpConnect))?;

        session
            .hello(CLIENT_NAME)
            .await
            .map_err(at(FailureKind::SmtpClientBuild))?;
        session
            .auth_plain(&config.account, &config.password)
            .await
            .map_err(at(FailureKind::SmtpAuth))?;
        session
            .mail_from(&message.from)
            .await
            .map_err(at(FailureKind::SmtpSender))?;

        for recipient in &message.to {
            session
                .rcpt_to(recipient)
                .await
                .map_err(at(FailureKind::SmtpRecipient))?;
            debug!(recipient = %recipient, "Recipient accepted");
        }

        session.data().await.map_err(at(FailureKind::SmtpData))?;
        session
            .write_body(&message.render())
            .await
            .map_err(at(FailureKind::SmtpWrite))?;
        session.end_data().await.map_err(at(FailureKind::SmtpData))?;
        session.quit().await.map_err(at(FailureKind::SmtpClose))?;
        Ok(())
    }
}

impl Default for EmailBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn at(kind: FailureKind) -> impl FnOnce(SmtpError) -> Failure {
    move |err| Failure {
        kind,
        detail: err.to_string(),
    }
}

#[async_trait]
impl NotifierBackend for EmailBackend {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
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
        let ChannelConfig::Email(config) = config else {
            return Outcome::Disabled;
        };

        let message = EmailMessage::new(&config.account, recipients, request.subject(), request.body());
        debug!(
            server = %format!("{}:{}", config.host, config.port),
            recipients = recipients.len(),
            "Sending email notification"
        );

        match self.deliver(config, &message).await {
            Ok(()) => {
                info!(recipients = recipients.len(), "Email delivered");
                Outcome::Success
            }
            Err(failure) => {
                warn!(stage = ?failure.kind, error = %failure.detail, "Email delivery failed");
                Outcome::Failed(failure)
            }
        }
    }
}

/// Cuts `subject` to at most [`MAX_EMAIL_SUBJECT_LEN`] bytes on a char boundary.
pub fn truncate_subject(subject: &str) -> &str {
    if subject.len() <= MAX_EMAIL_SUBJECT_LEN {
        return subject;
    }
    let mut end = MAX_EMAIL_SUBJECT_LEN;
    while !subject.is_char_boundary(end) {
        end -= 1;
    }
    &subject[..end]
}

/// A plain-text mail ready to be streamed after DATA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    pub fn new(from: &str, to: &[String], subject: &str, body: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_vec(),
            subject: truncate_subject(subject).to_string(),
            body: body.to_string(),
        }
    }

    /// Sender and recipients must be bare mailboxes before any of them is used in a
    /// command or header.
    pub fn check_addresses(&self) -> Result<(), Failure> {
        check_address(&self.from).map_err(at(FailureKind::SmtpSender))?;
        for recipient in &self.to {
            check_address(recipient).map_err(at(FailureKind::SmtpRecipient))?;
        }
        Ok(())
    }

    /// Header block, blank line, body. Header lines end with CRLF.
    pub fn render(&self) -> String {
        let domain = self
            .from
            .rsplit_once('@')
            .map(|(_, domain)| domain)
            .filter(|domain| !domain.is_empty())
            .unwrap_or(CLIENT_NAME);

        let mut message = String::with_capacity(self.body.len() + 256);
        push_header(&mut message, "From", &self.from);
        push_header(&mut message, "To", &self.to.join(", "));
        push_header(&mut message, "Subject", &encode_header_value(&self.subject));
        push_header(&mut message, "Date", &chrono::Utc::now().to_rfc2822());
        push_header(
            &mut message,
            "Message-ID",
            &format!("<{}@{}>", uuid::Uuid::new_v4(), domain),
        );
        push_header(&mut message, "MIME-Version", "1.0");
        push_header(&mut message, "Content-Type", "text/plain; charset=utf-8");
        push_header(&mut message, "Content-Transfer-Encoding", "8bit");
        message.push_str("\r\n");
        message.push_str(&self.body);
        message
    }
}

/// Line breaks inside `value` are folded to spaces so a value cannot start a new header.
fn push_header(message: &mut String, name: &str, value: &str) {
    message.push_str(name);
    message.push_str(": ");
    message.extend(value.chars().map(|c| if matches!(c, '\r' | '\n') { ' ' } else { c }));
    message.push_str("\r\n");
}

/// RFC 2047 encoded-word for non-ASCII header values.
fn encode_header_value(value: &str) -> String {
    if value.is_ascii() && !value.contains(['\r', '\n']) {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value))
    }
}
