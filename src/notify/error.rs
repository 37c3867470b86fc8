use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmtpError {
    #[error("connection to {address} failed: {source}")]
    Connect { address: String, source: io::Error },
    #[error("invalid TLS server name: {0}")]
    ServerName(String),
    #[error("TLS setup failed: {0}")]
    Tls(String),
    #[error("{command} timed out after {timeout:?}")]
    Timeout {
        command: &'static str,
        timeout: Duration,
    },
    #[error("I/O error during {command}: {source}")]
    Io {
        command: &'static str,
        source: io::Error,
    },
    #[error("{command} rejected: {code} {message}")]
    Rejected {
        command: &'static str,
        code: u16,
        message: String,
    },
    #[error("invalid mail address {0:?}")]
    InvalidAddress(String),
    #[error("malformed reply to {command}: {line:?}")]
    MalformedReply { command: &'static str, line: String },
}

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("slack connect error: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("slack request error: {0}")]
    Request(#[source] reqwest::Error),
    #[error("slack returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("slack api error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for SlackApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Connect(err)
        } else {
            Self::Request(err)
        }
    }
}
