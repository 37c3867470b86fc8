//! Minimal SMTP client over implicit TLS.
//!
//! Each command is its own method so the email backend can tell exactly which
//! stage of the session failed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tracing::debug;

use crate::notify::error::SmtpError;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens SMTP sessions. A new session is opened for every delivery.
#[async_trait]
pub trait SmtpConnector: Send + Sync {
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn SmtpSession>, SmtpError>;
}

/// One SMTP conversation, driven command by command.
#[async_trait]
pub trait SmtpSession: Send {
    /// Reads the server greeting and introduces the client with EHLO.
    async fn hello(&mut self, client_name: &str) -> Result<(), SmtpError>;
    async fn auth_plain(&mut self, username: &str, password: &str) -> Result<(), SmtpError>;
    async fn mail_from(&mut self, sender: &str) -> Result<(), SmtpError>;
    async fn rcpt_to(&mut self, recipient: &str) -> Result<(), SmtpError>;
    /// Sends DATA and waits for the server to accept message content.
    async fn data(&mut self) -> Result<(), SmtpError>;
    async fn write_body(&mut self, message: &str) -> Result<(), SmtpError>;
    /// Terminates message content and waits for the server to queue it.
    async fn end_data(&mut self) -> Result<(), SmtpError>;
    async fn quit(&mut self) -> Result<(), SmtpError>;
}

/// Connects with TCP, then TLS against the webpki root set.
#[derive(Debug, Clone)]
pub struct TlsSmtpConnector {
    timeout: Duration,
}

impl TlsSmtpConnector {
    pub fn new() -> Self {
        Self {
            timeout: COMMAND_TIMEOUT,
        }
    }

    fn tls_connector(&self) -> Result<TlsConnector, SmtpError> {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.into(),
        };
        let provider = Arc::new(tokio_rustls::rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|err| SmtpError::Tls(err.to_string()))?
            .with_root_certificates(roots)
            .with_no_client_auth();
        Ok(TlsConnector::from(Arc::new(config)))
    }
}

impl Default for TlsSmtpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SmtpConnector for TlsSmtpConnector {
    async fn connect(&self, host: &str, port: u16) -> Result<Box<dyn SmtpSession>, SmtpError> {
        let address = format!("{host}:{port}");
        debug!(address = %address, "Connecting to SMTP server");

        let tcp = timeout(self.timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| SmtpError::Timeout {
                command: "connect",
                timeout: self.timeout,
            })?
            .map_err(|source| SmtpError::Connect {
                address: address.clone(),
                source,
            })?;

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| SmtpError::ServerName(host.to_string()))?;
        let tls = timeout(self.timeout, self.tls_connector()?.connect(server_name, tcp))
            .await
            .map_err(|_| SmtpError::Timeout {
                command: "TLS handshake",
                timeout: self.timeout,
            })?
            .map_err(|source| SmtpError::Connect { address, source })?;

        Ok(Box::new(SmtpClient::new(tls, self.timeout)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub message: String,
}

/// SMTP command/reply exchange over any async byte stream.
pub struct SmtpClient<S> {
    stream: BufReader<S>,
    timeout: Duration,
}

impl<S> SmtpClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self {
            stream: BufReader::new(stream),
            timeout,
        }
    }

    async fn read_reply(&mut self, command: &'static str) -> Result<Reply, SmtpError> {
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            let read = timeout(self.timeout, self.stream.read_line(&mut line))
                .await
                .map_err(|_| SmtpError::Timeout {
                    command,
                    timeout: self.timeout,
                })?
                .map_err(|source| SmtpError::Io { command, source })?;
            if read == 0 {
                return Err(SmtpError::Io {
                    command,
                    source: std::io::ErrorKind::UnexpectedEof.into(),
                });
            }

            let line = line.trim_end_matches(['\r', '\n']);
            let (code, last, text) = parse_reply_line(line).ok_or_else(|| {
                SmtpError::MalformedReply {
                    command,
                    line: line.to_string(),
                }
            })?;
            lines.push(text.to_string());
            if last {
                return Ok(Reply {
                    code,
                    message: lines.join(" "),
                });
            }
        }
    }

    async fn send_line(&mut self, command: &'static str, line: &str) -> Result<(), SmtpError> {
        let payload = format!("{line}\r\n");
        self.write_raw(command, payload.as_bytes()).await
    }

    async fn write_raw(&mut self, command: &'static str, bytes: &[u8]) -> Result<(), SmtpError> {
        let stream = self.stream.get_mut();
        let write = async {
            stream.write_all(bytes).await?;
            stream.flush().await
        };
        timeout(self.timeout, write)
            .await
            .map_err(|_| SmtpError::Timeout {
                command,
                timeout: self.timeout,
            })?
            .map_err(|source| SmtpError::Io { command, source })
    }

    async fn exchange(
        &mut self,
        command: &'static str,
        line: &str,
        accept: fn(u16) -> bool,
    ) -> Result<Reply, SmtpError> {
        self.send_line(command, line).await?;
        let reply = self.read_reply(command).await?;
        expect(command, reply, accept)
    }
}

#[async_trait]
impl<S> SmtpSession for SmtpClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn hello(&mut self, client_name: &str) -> Result<(), SmtpError> {
        let greeting = self.read_reply("greeting").await?;
        expect("greeting", greeting, |code| code == 220)?;
        self.exchange("EHLO", &format!("EHLO {client_name}"), is_positive)
            .await
            .map(drop)
    }

    async fn auth_plain(&mut self, username: &str, password: &str) -> Result<(), SmtpError> {
        let token = STANDARD.encode(format!("\0{username}\0{password}"));
        self.exchange("AUTH", &format!("AUTH PLAIN {token}"), |code| code == 235)
            .await
            .map(drop)
    }

    async fn mail_from(&mut self, sender: &str) -> Result<(), SmtpError> {
        check_address(sender)?;
        self.exchange("MAIL FROM", &format!("MAIL FROM:<{sender}>"), is_positive)
            .await
            .map(drop)
    }

    async fn rcpt_to(&mut self, recipient: &str) -> Result<(), SmtpError> {
        check_address(recipient)?;
        self.exchange("RCPT TO", &format!("RCPT TO:<{recipient}>"), is_positive)
            .await
            .map(drop)
    }

    async fn data(&mut self) -> Result<(), SmtpError> {
        self.exchange("DATA", "DATA", |code| code == 354)
            .await
            .map(drop)
    }

    async fn write_body(&mut self, message: &str) -> Result<(), SmtpError> {
        let encoded = encode_data(message);
        self.write_raw("message body", encoded.as_bytes()).await
    }

    async fn end_data(&mut self) -> Result<(), SmtpError> {
        self.exchange("end of data", ".", is_positive)
            .await
            .map(drop)
    }

    async fn quit(&mut self) -> Result<(), SmtpError> {
        self.exchange("QUIT", "QUIT", is_positive).await.map(drop)
    }
}

/// Rejects a mailbox that could not sit inside `<...>` on one command line.
///
/// Line breaks would smuggle extra commands or headers, angle brackets would close the
/// path early.
pub fn check_address(address: &str) -> Result<(), SmtpError> {
    let valid = !address.is_empty()
        && !address
            .chars()
            .any(|c| c.is_control() || c.is_whitespace() || c == '<' || c == '>');
    if valid {
        Ok(())
    } else {
        Err(SmtpError::InvalidAddress(address.to_string()))
    }
}

fn is_positive(code: u16) -> bool {
    (200..300).contains(&code)
}

fn expect(command: &'static str, reply: Reply, accept: fn(u16) -> bool) -> Result<Reply, SmtpError> {
    if accept(reply.code) {
        Ok(reply)
    } else {
        Err(SmtpError::Rejected {
            command,
            code: reply.code,
            message: reply.message,
        })
    }
}

/// Splits `250-text` / `250 text` into (code, is_last_line, text).
fn parse_reply_line(line: &str) -> Option<(u16, bool, &str)> {
    let code = line.get(..3)?.parse::<u16>().ok()?;
    match line.as_bytes().get(3) {
        None => Some((code, true, "")),
        Some(b' ') => Some((code, true, &line[4..])),
        Some(b'-') => Some((code, false, &line[4..])),
        Some(_) => None,
    }
}

/// Normalises line endings to CRLF, dot-stuffs, and guarantees a trailing CRLF.
pub fn encode_data(message: &str) -> String {
    let mut encoded = String::with_capacity(message.len() + 16);
    for line in message.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with('.') {
            encoded.push('.');
        }
        encoded.push_str(line);
        encoded.push_str("\r\n");
    }
    if message.ends_with('\n') {
        // split() yields a trailing empty segment for the final newline
        encoded.truncate(encoded.len() - 2);
    }
    encoded
}
