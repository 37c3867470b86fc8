use std::collections::BTreeMap;

use crate::notify::channel::ChannelKind;

/// One notification to deliver across channels. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    subject: String,
    body: String,
    recipients: BTreeMap<ChannelKind, Vec<String>>,
}

impl NotificationRequest {
    pub fn builder(
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> NotificationRequestBuilder {
        NotificationRequestBuilder {
            subject: subject.into(),
            body: body.into(),
            recipients: BTreeMap::new(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Recipients for `kind`, in the order they were supplied.
    pub fn recipients(&self, kind: ChannelKind) -> &[String] {
        self.recipients
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct NotificationRequestBuilder {
    subject: String,
    body: String,
    recipients: BTreeMap<ChannelKind, Vec<String>>,
}

impl NotificationRequestBuilder {
    /// Appends recipients for `kind`.
    pub fn recipients<I, S>(mut self, kind: ChannelKind, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipients
            .entry(kind)
            .or_default()
            .extend(recipients.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> NotificationRequest {
        NotificationRequest {
            subject: self.subject,
            body: self.body,
            recipients: self.recipients,
        }
    }
}
