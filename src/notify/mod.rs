//! Notification delivery: backends, dispatch and reporting.

pub mod channel;
pub mod dispatcher;
pub mod email;
pub mod error;
pub mod outcome;
pub mod report;
pub mod request;
pub mod slack;
pub mod slack_api;
pub mod smtp;
pub mod webhook;

pub use channel::{ChannelKind, NotifierBackend};
pub use dispatcher::{BackendRegistry, DispatchReport, Dispatcher};
pub use error::{SlackApiError, SmtpError};
pub use outcome::{EXIT_CONFIG, EXIT_GENERAL, EXIT_USAGE, Failure, FailureCategory, FailureKind, Outcome};
pub use report::{ReportSummary, report};
pub use request::{NotificationRequest, NotificationRequestBuilder};
