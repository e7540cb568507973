//! Type-state SMTP client.

use super::{ServerInfo, SmtpStream, create_tls_connector};
use crate::command::Command;
use crate::error::{Error, RefusedRecipient, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashSet;
use std::marker::PhantomData;
use tokio_rustls::TlsConnector;

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// SMTP client with type-state pattern.
///
/// Greeting, EHLO, STARTTLS and AUTH are only available on
/// `Client<Connected>`; mail can only be submitted once authenticated.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    client_hostname: String,
    _state: PhantomData<State>,
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or if the server returns an error.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = read_reply(&mut stream).await?.into_success()?;

        // Extract hostname from greeting (first word after code)
        let hostname = greeting
            .message
            .first()
            .and_then(|msg| msg.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        tracing::debug!(server = %hostname, "SMTP greeting");

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                extensions: HashSet::new(),
            },
            client_hostname: "localhost".to_string(),
            _state: PhantomData,
        })
    }

    /// Sends EHLO and discovers server capabilities.
    ///
    /// A server that rejects EHLO with a 5xx reply is greeted with HELO
    /// instead and treated as supporting no extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if both greetings fail.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        self.client_hostname = client_hostname.to_string();
        self.greet().await?;
        Ok(self)
    }

    /// Upgrades the connection to TLS using STARTTLS.
    ///
    /// EHLO is re-issued afterwards, since capabilities may change once the
    /// channel is encrypted.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not advertised, is refused, or the TLS
    /// handshake fails.
    pub async fn starttls(self, hostname: &str) -> Result<Self> {
        self.starttls_with(create_tls_connector(), hostname).await
    }

    /// Same as [`Client::starttls`] with a caller-supplied TLS connector.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not advertised, is refused, or the TLS
    /// handshake fails.
    pub async fn starttls_with(mut self, connector: TlsConnector, hostname: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        self.send_command(Command::StartTls).await?.into_success()?;

        self.stream = self.stream.upgrade_with(connector, hostname).await?;
        tracing::debug!(hostname, "TLS established");

        self.greet().await?;
        Ok(self)
    }

    /// Authenticates with the mechanism the server prefers.
    ///
    /// See [`ServerInfo::preferred_auth`].
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected.
    pub async fn auth(self, username: &str, password: &str) -> Result<Client<Authenticated>> {
        match self.server_info.preferred_auth() {
            AuthMechanism::Plain => self.auth_plain(username, password).await,
            AuthMechanism::Login => self.auth_login(username, password).await,
        }
    }

    /// Authenticates using PLAIN mechanism.
    ///
    /// The credentials go out as an initial response; a server that answers
    /// with an empty 334 challenge gets them on the next line.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        // PLAIN response: \0username\0password
        let credentials = format!("\0{username}\0{password}");
        let encoded = STANDARD.encode(credentials.as_bytes());

        let mut reply = self
            .send_command(Command::Auth {
                mechanism: AuthMechanism::Plain,
                initial_response: Some(encoded.clone()),
            })
            .await?;

        if reply.code == ReplyCode::AUTH_CONTINUE {
            reply = self.send_command(Command::AuthResponse(encoded)).await?;
        }
        reply.into_success()?;

        tracing::debug!(mechanism = "PLAIN", "Authenticated");
        Ok(self.into_state())
    }

    /// Authenticates using LOGIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let reply = self
            .send_command(Command::Auth {
                mechanism: AuthMechanism::Login,
                initial_response: None,
            })
            .await?;
        expect_challenge(reply)?;

        let reply = self
            .send_command(Command::AuthResponse(STANDARD.encode(username)))
            .await?;
        expect_challenge(reply)?;

        self.send_command(Command::AuthResponse(STANDARD.encode(password)))
            .await?
            .into_success()?;

        tracing::debug!(mechanism = "LOGIN", "Authenticated");
        Ok(self.into_state())
    }
}

impl Client<Authenticated> {
    /// Submits one message: `MAIL FROM`, one `RCPT TO` per recipient, `DATA`.
    ///
    /// The payload is CRLF-normalized and dot-stuffed. If the server
    /// advertised a `SIZE` limit the payload is checked against it before
    /// anything is sent. When any recipient is refused, or `MAIL`/`DATA` is
    /// rejected, the transaction is reset with `RSET` so the connection can
    /// be used for the next message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecipientsRefused`] listing every refused recipient,
    /// [`Error::MessageTooLarge`], or [`Error::SmtpError`] for other
    /// rejections.
    pub async fn send_mail(&mut self, from: &Address, to: &[Address], message: &[u8]) -> Result<()> {
        if to.is_empty() {
            return Err(Error::InvalidAddress("No recipients".into()));
        }

        if let Some(limit) = self.server_info.max_message_size() {
            if message.len() > limit {
                return Err(Error::MessageTooLarge {
                    size: message.len(),
                    limit,
                });
            }
        }

        let smtputf8 = from.is_international() || to.iter().any(Address::is_international);
        if smtputf8 && !self.server_info.supports(&Extension::SmtpUtf8) {
            return Err(Error::NotSupported("SMTPUTF8".into()));
        }

        let body = (!message.is_ascii() && self.server_info.supports(&Extension::EightBitMime))
            .then(|| "8BITMIME".to_string());
        let size = self.server_info.supports_size().then_some(message.len());

        let reply = self
            .send_command(Command::MailFrom {
                from: from.clone(),
                body,
                size,
                smtputf8,
            })
            .await?;
        if !reply.is_success() {
            self.reset().await;
            return Err(reply.into_error());
        }

        let mut refused = Vec::new();
        for rcpt in to {
            let reply = self.send_command(Command::RcptTo { to: rcpt.clone() }).await?;
            if !reply.is_success() {
                tracing::debug!(recipient = %rcpt, code = reply.code.as_u16(), "Recipient refused");
                refused.push(RefusedRecipient {
                    address: rcpt.to_string(),
                    code: reply.code.as_u16(),
                    message: reply.message_text(),
                });
            }
        }
        if !refused.is_empty() {
            self.reset().await;
            return Err(Error::RecipientsRefused(refused));
        }

        let reply = self.send_command(Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            self.reset().await;
            return Err(reply.into_error());
        }

        self.stream.write_all(&dot_stuff(message)).await?;
        read_reply(&mut self.stream).await?.into_success()?;

        tracing::debug!(recipients = to.len(), bytes = message.len(), "Message accepted");
        Ok(())
    }

    /// Best-effort `RSET` after a failed transaction.
    async fn reset(&mut self) {
        match self.send_command(Command::Rset).await {
            Ok(reply) if reply.is_success() => {}
            Ok(reply) => tracing::warn!(%reply, "RSET rejected"),
            Err(e) => tracing::warn!(?e, "RSET failed"),
        }
    }
}

// Common implementation for all states
impl<S> Client<S> {
    /// Returns what the server told us about itself.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Returns true once STARTTLS has succeeded.
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        self.stream.is_tls()
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(Command::Quit).await?;

        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(reply.into_error());
        }

        Ok(())
    }

    /// EHLO, falling back to HELO on a permanent rejection.
    async fn greet(&mut self) -> Result<()> {
        let hostname = self.client_hostname.clone();
        let reply = self
            .send_command(Command::Ehlo {
                hostname: hostname.clone(),
            })
            .await?;

        if reply.is_permanent_error() {
            tracing::debug!(%reply, "EHLO rejected, falling back to HELO");
            self.send_command(Command::Helo { hostname })
                .await?
                .into_success()?;
            self.server_info.extensions.clear();
            return Ok(());
        }

        let reply = reply.into_success()?;
        // First line is the greeting, the rest are extensions
        self.server_info.extensions = reply
            .message
            .iter()
            .skip(1)
            .map(|line| Extension::parse(line))
            .collect();
        Ok(())
    }

    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        tracing::debug!(command = %cmd.log_line(), "SMTP command");
        self.stream.write_all(&cmd.serialize()).await?;
        let reply = read_reply(&mut self.stream).await?;
        tracing::trace!(%reply, "SMTP reply");
        Ok(reply)
    }

    fn into_state<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            client_hostname: self.client_hostname,
            _state: PhantomData,
        }
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        if line.is_empty() {
            continue;
        }

        let is_last = is_last_reply_line(&line);
        lines.push(line);

        if is_last {
            break;
        }
    }

    parse_reply(&lines)
}

fn expect_challenge(reply: Reply) -> Result<()> {
    if reply.code == ReplyCode::AUTH_CONTINUE {
        Ok(())
    } else {
        Err(reply.into_error())
    }
}

/// Prepares a payload for `DATA`: CRLF line endings, leading dots doubled,
/// terminated by `.` on its own line.
pub(crate) fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 64 + 5);

    if !message.is_empty() {
        let body = message.strip_suffix(b"\n").unwrap_or(message);
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }

    out.extend_from_slice(b".\r\n");
    out
}
