//! The mail session: open, send, close.

use crate::config::{Config, Credentials, Endpoint};
use crate::error::{Error, Result};
use crate::message::OutgoingMessage;
use crate::smtp::SmtpTransport;
use crate::transport::Transport;
use std::fmt;

/// Authenticated connection to one relay.
///
/// A session starts closed. [`open`](Self::open) connects, upgrades to TLS
/// with STARTTLS and logs in; [`send`](Self::send) submits messages over the
/// same connection; [`close`](Self::close) says goodbye and drops it.
///
/// ```text
/// closed ──open()──→ open ──close()──→ closed
///                    │  ↑
///                    └──┘ send()
/// ```
///
/// Misuse is an error rather than a no-op: opening an open session returns
/// [`Error::AlreadyOpen`], and sending on or closing a closed session returns
/// [`Error::NotOpen`] without touching the network.
///
/// Methods block. A session is meant for one thread; use one session per
/// concurrent sender.
pub struct Mailer<T: Transport = SmtpTransport> {
    credentials: Credentials,
    config: Config,
    transport: T,
    connection: Option<T::Connection>,
}

impl Mailer<SmtpTransport> {
    /// Creates a closed session for `endpoint` (`"host:port"`, or a bare host
    /// for port 587).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if `endpoint` cannot be parsed.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        endpoint: &str,
    ) -> Result<Self> {
        let config = Config::new(Endpoint::parse(endpoint)?);
        Ok(Self::with_config(Credentials::new(username, password), config))
    }

    /// Creates a closed session from a full configuration.
    #[must_use]
    pub fn with_config(credentials: Credentials, config: Config) -> Self {
        let transport = SmtpTransport::new(&config);
        Self::with_transport(credentials, config, transport)
    }
}

impl<T: Transport> Mailer<T> {
    /// Creates a closed session over a caller-supplied transport.
    #[must_use]
    pub const fn with_transport(credentials: Credentials, config: Config, transport: T) -> Self {
        Self {
            credentials,
            config,
            transport,
            connection: None,
        }
    }

    /// Connects, upgrades with STARTTLS and logs in.
    ///
    /// On failure the half-open connection is dropped and the session stays
    /// closed, so `open` can be retried.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyOpen`] if the session is open (it stays open)
    /// - [`Error::Connection`] if the relay cannot be reached
    /// - [`Error::Handshake`] if the TLS upgrade fails
    /// - [`Error::Authentication`] if the credentials are rejected
    pub fn open(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Err(Error::AlreadyOpen);
        }

        let endpoint = &self.config.endpoint;
        let mut conn = self
            .transport
            .connect(endpoint)
            .map_err(Error::Connection)?;
        self.transport
            .starttls(&mut conn, &endpoint.host)
            .map_err(Error::Handshake)?;
        self.transport
            .login(&mut conn, &self.credentials.username, &self.credentials.password)
            .map_err(Error::Authentication)?;

        tracing::info!(%endpoint, user = %self.credentials.username, "Mail session opened");
        self.connection = Some(conn);
        Ok(())
    }

    /// Builds `message` and submits it.
    ///
    /// The sender is the message's `mail_as` address, or the session
    /// username. Every attachment is read before anything is sent. The
    /// envelope delivers to To, then CC, then BCC recipients.
    ///
    /// # Errors
    ///
    /// - [`Error::NotOpen`] if the session is closed
    /// - [`Error::ResourceNotFound`] if an attachment cannot be read
    /// - [`Error::Delivery`] if the relay rejects the message or any
    ///   recipient; the session stays open
    pub fn send(&mut self, message: &OutgoingMessage) -> Result<()> {
        let Some(conn) = self.connection.as_mut() else {
            return Err(Error::NotOpen);
        };

        let username = &self.credentials.username;
        let payload = message.builder(username).build()?.to_string();
        let envelope = message.envelope(username);

        tracing::debug!(
            sender = %envelope.sender,
            recipients = envelope.recipients.len(),
            bytes = payload.len(),
            "Submitting message"
        );
        self.transport
            .send_mail(conn, &envelope, payload.as_bytes())
            .map_err(Error::Delivery)?;

        tracing::info!(subject = message.subject(), "Message sent");
        Ok(())
    }

    /// Ends the session with `QUIT` and drops the connection.
    ///
    /// The session is closed afterwards even if this returns an error.
    ///
    /// # Errors
    ///
    /// - [`Error::NotOpen`] if the session is already closed
    /// - [`Error::Connection`] if the goodbye exchange fails
    pub fn close(&mut self) -> Result<()> {
        let conn = self.connection.take().ok_or(Error::NotOpen)?;

        let result = self.transport.disconnect(conn);
        tracing::info!(endpoint = %self.config.endpoint, "Mail session closed");
        result.map_err(|e| {
            tracing::warn!(?e, "QUIT failed");
            Error::Connection(e)
        })
    }

    /// Returns true while the session holds a connection.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// Opens the session, runs `body`, then closes it if it is still open.
    ///
    /// The session is closed whether `body` succeeds or fails. If both
    /// `body` and the close fail, the error from `body` is returned.
    ///
    /// ```ignore
    /// mailer.session(|m| m.send(&OutgoingMessage::new("you@example.com", "Hi", "Hello")))?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns the first error from opening, from `body`, or from closing.
    pub fn session<R>(&mut self, body: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        self.open()?;
        let result = body(self);

        if self.is_open() {
            let closed = self.close();
            if let Err(e) = &closed {
                tracing::warn!(?e, "Closing after scoped use failed");
            }
            let value = result?;
            closed?;
            return Ok(value);
        }
        result
    }

    /// Session credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The transport this session runs on.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> fmt::Debug for Mailer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailer")
            .field("credentials", &self.credentials)
            .field("endpoint", &self.config.endpoint)
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use crate::transport::TransportError;
    use mailer_mime::Message;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::result::Result;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Connect(String),
        StartTls(String),
        Login(String, String),
        SendMail(Envelope, String),
        Disconnect,
    }

    /// Records every call and fails the steps it is told to fail.
    #[derive(Debug, Default, Clone)]
    struct FakeTransport {
        calls: Rc<RefCell<Vec<Call>>>,
        fail_connect: bool,
        fail_starttls: bool,
        fail_login: bool,
        fail_send: bool,
        fail_disconnect: bool,
    }

    impl FakeTransport {
        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }

        fn sent(&self) -> Vec<(Envelope, String)> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    Call::SendMail(envelope, payload) => Some((envelope, payload)),
                    _ => None,
                })
                .collect()
        }
    }

    #[derive(Debug)]
    struct FakeConnection;

    impl Transport for FakeTransport {
        type Connection = FakeConnection;

        fn connect(&mut self, endpoint: &Endpoint) -> Result<FakeConnection, TransportError> {
            self.record(Call::Connect(endpoint.to_string()));
            if self.fail_connect {
                return Err(TransportError::new("Connection refused"));
            }
            Ok(FakeConnection)
        }

        fn starttls(&mut self, _: &mut FakeConnection, host: &str) -> Result<(), TransportError> {
            self.record(Call::StartTls(host.to_string()));
            if self.fail_starttls {
                return Err(TransportError::new("Not supported: STARTTLS"));
            }
            Ok(())
        }

        fn login(
            &mut self,
            _: &mut FakeConnection,
            username: &str,
            password: &str,
        ) -> Result<(), TransportError> {
            self.record(Call::Login(username.to_string(), password.to_string()));
            if self.fail_login {
                return Err(TransportError::with_code(535, "Authentication credentials invalid"));
            }
            Ok(())
        }

        fn send_mail(
            &mut self,
            _: &mut FakeConnection,
            envelope: &Envelope,
            payload: &[u8],
        ) -> Result<(), TransportError> {
            self.record(Call::SendMail(
                envelope.clone(),
                String::from_utf8_lossy(payload).into_owned(),
            ));
            if self.fail_send {
                return Err(TransportError::with_code(550, "Mailbox unavailable"));
            }
            Ok(())
        }

        fn disconnect(&mut self, _: FakeConnection) -> Result<(), TransportError> {
            self.record(Call::Disconnect);
            if self.fail_disconnect {
                return Err(TransportError::new("Connection closed by server"));
            }
            Ok(())
        }
    }

    fn mailer(transport: FakeTransport) -> Mailer<FakeTransport> {
        let config = Config::new(Endpoint::new("smtp.example.com", 587));
        Mailer::with_transport(
            Credentials::new("me@example.com", "secret"),
            config,
            transport,
        )
    }

    #[test]
    fn test_open_runs_handshake_in_order() {
        let transport = FakeTransport::default();
        let mut mailer = mailer(transport.clone());

        assert!(!mailer.is_open());
        mailer.open().unwrap();
        assert!(mailer.is_open());

        assert_eq!(
            transport.calls(),
            [
                Call::Connect("smtp.example.com:587".into()),
                Call::StartTls("smtp.example.com".into()),
                Call::Login("me@example.com".into(), "secret".into()),
            ]
        );
    }

    #[test]
    fn test_close_disconnects() {
        let transport = FakeTransport::default();
        let mut mailer = mailer(transport.clone());

        mailer.open().unwrap();
        mailer.close().unwrap();

        assert!(!mailer.is_open());
        assert_eq!(transport.calls().last(), Some(&Call::Disconnect));
    }

    #[test]
    fn test_send_when_closed_makes_no_calls() {
        let transport = FakeTransport::default();
        let mut mailer = mailer(transport.clone());

        let err = mailer
            .send(&OutgoingMessage::new("you@example.com", "Hi", "Hello"))
            .unwrap_err();

        assert!(matches!(err, Error::NotOpen));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_close_when_closed() {
        let transport = FakeTransport::default();
        let mut mailer = mailer(transport.clone());

        assert!(matches!(mailer.close(), Err(Error::NotOpen)));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_open_twice() {
        let transport = FakeTransport::default();
        let mut mailer = mailer(transport.clone());

        mailer.open().unwrap();
        assert!(matches!(mailer.open(), Err(Error::AlreadyOpen)));
        assert!(mailer.is_open());
        assert_eq!(transport.calls().len(), 3);
    }

    #[test]
    fn test_open_failures_leave_session_closed() {
        let cases = [
            FakeTransport {
                fail_connect: true,
                ..FakeTransport::default()
            },
            FakeTransport {
                fail_starttls: true,
                ..FakeTransport::default()
            },
            FakeTransport {
                fail_login: true,
                ..FakeTransport::default()
            },
        ];

        let mut errors = Vec::new();
        for transport in cases {
            let mut mailer = mailer(transport);
            errors.push(mailer.open().unwrap_err());
            assert!(!mailer.is_open());
        }

        assert!(matches!(errors[0], Error::Connection(_)));
        assert!(matches!(errors[1], Error::Handshake(_)));
        assert!(matches!(errors[2], Error::Authentication(_)));
        assert_eq!(errors[2].code(), Some(535));
    }

    #[test]
    fn test_retry_after_failed_open() {
        let mut mailer = mailer(FakeTransport {
            fail_login: true,
            ..FakeTransport::default()
        });
        assert!(mailer.open().is_err());

        mailer.transport.fail_login = false;
        mailer.open().unwrap();
        assert!(mailer.is_open());
    }

    #[test]
    fn test_send_plain_message() {
        let transport = FakeTransport::default();
        let mut mailer = mailer(transport.clone());
        mailer.open().unwrap();

        mailer
            .send(&OutgoingMessage::new("you@example.com", "Hello", "Just text."))
            .unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        let (envelope, payload) = &sent[0];
        assert_eq!(envelope.sender, "me@example.com");
        assert_eq!(envelope.recipients, ["you@example.com"]);

        let parsed = Message::parse(payload).unwrap();
        assert!(!parsed.is_multipart());
        assert_eq!(parsed.from(), Some("me@example.com"));
        assert_eq!(parsed.to(), Some("you@example.com"));
        assert_eq!(parsed.subject(), Some("Hello"));
        assert_eq!(parsed.cc(), None);
        assert_eq!(parsed.body_text().unwrap(), "Just text.");
    }

    #[test]
    fn test_send_with_cc_bcc_and_mail_as() {
        let transport = FakeTransport::default();
        let mut mailer = mailer(transport.clone());
        mailer.open().unwrap();

        let message = OutgoingMessage::new(["a@example.com", "b@example.com"], "Team", "Hi all")
            .cc("c@example.com")
            .bcc("d@example.com")
            .mail_as("alias@example.com");
        mailer.send(&message).unwrap();

        let (envelope, payload) = transport.sent().remove(0);
        assert_eq!(envelope.sender, "alias@example.com");
        assert_eq!(
            envelope.recipients,
            ["a@example.com", "b@example.com", "c@example.com", "d@example.com"]
        );

        let parsed = Message::parse(&payload).unwrap();
        assert_eq!(parsed.from(), Some("alias@example.com"));
        assert_eq!(parsed.to(), Some("a@example.com, b@example.com"));
        assert_eq!(parsed.cc(), Some("c@example.com"));
        assert_eq!(parsed.bcc(), Some("d@example.com"));
    }

    #[test]
    fn test_missing_attachment_sends_nothing() {
        let transport = FakeTransport::default();
        let mut mailer = mailer(transport.clone());
        mailer.open().unwrap();

        let message = OutgoingMessage::new("you@example.com", "Report", "Attached")
            .attach("/nonexistent/report.pdf");
        let err = mailer.send(&message).unwrap_err();

        match err {
            Error::ResourceNotFound { path, .. } => {
                assert_eq!(path.to_str(), Some("/nonexistent/report.pdf"));
            }
            other => panic!("expected ResourceNotFound, got {other:?}"),
        }
        assert!(transport.sent().is_empty());
        assert!(mailer.is_open());
    }

    #[test]
    fn test_delivery_error_keeps_session_open() {
        let transport = FakeTransport {
            fail_send: true,
            ..FakeTransport::default()
        };
        let mut mailer = mailer(transport);
        mailer.open().unwrap();

        let err = mailer
            .send(&OutgoingMessage::new("nobody@example.com", "Hi", "Hello"))
            .unwrap_err();

        assert!(matches!(err, Error::Delivery(_)));
        assert_eq!(err.code(), Some(550));
        assert!(mailer.is_open());
    }

    #[test]
    fn test_close_reports_quit_failure_but_closes() {
        let transport = FakeTransport {
            fail_disconnect: true,
            ..FakeTransport::default()
        };
        let mut mailer = mailer(transport);
        mailer.open().unwrap();

        assert!(matches!(mailer.close(), Err(Error::Connection(_))));
        assert!(!mailer.is_open());
    }

    #[test]
    fn test_scoped_session_closes_after_success() {
        let transport = FakeTransport::default();
        let mut mailer = mailer(transport.clone());

        let opened = mailer
            .session(|m| {
                m.send(&OutgoingMessage::new("you@example.com", "Hi", "Hello"))?;
                Ok(m.is_open())
            })
            .unwrap();

        assert!(opened);
        assert!(!mailer.is_open());
        assert_eq!(transport.calls().last(), Some(&Call::Disconnect));
    }

    #[test]
    fn test_scoped_session_closes_after_error() {
        let transport = FakeTransport {
            fail_send: true,
            ..FakeTransport::default()
        };
        let mut mailer = mailer(transport.clone());

        let err = mailer
            .session(|m| m.send(&OutgoingMessage::new("you@example.com", "Hi", "Hello")))
            .unwrap_err();

        assert!(matches!(err, Error::Delivery(_)));
        assert!(!mailer.is_open());
        assert_eq!(transport.calls().last(), Some(&Call::Disconnect));
    }

    #[test]
    fn test_scoped_session_body_may_close() {
        let transport = FakeTransport::default();
        let mut mailer = mailer(transport.clone());

        mailer.session(|m| m.close()).unwrap();

        let disconnects = transport
            .calls()
            .iter()
            .filter(|call| **call == Call::Disconnect)
            .count();
        assert_eq!(disconnects, 1);
    }

    #[test]
    fn test_new_parses_endpoint() {
        let mailer = Mailer::new("me@example.com", "secret", "relay.example.com").unwrap();
        assert_eq!(mailer.config().endpoint, Endpoint::new("relay.example.com", 587));
        assert!(!mailer.is_open());

        assert!(matches!(
            Mailer::new("me@example.com", "secret", "relay.example.com:port"),
            Err(Error::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let mailer = mailer(FakeTransport::default());
        let debug = format!("{mailer:?}");
        assert!(debug.contains("me@example.com"));
        assert!(!debug.contains("secret"));
    }
}
