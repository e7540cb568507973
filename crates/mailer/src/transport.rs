//! The seam between a [`Mailer`](crate::Mailer) and the wire.
//!
//! A [`Transport`] opens connection handles and runs the protocol steps on
//! them. [`SmtpTransport`](crate::SmtpTransport) is the real one; tests pass
//! their own implementation to [`Mailer::with_transport`](crate::Mailer::with_transport).

use crate::config::Endpoint;
use crate::envelope::Envelope;
use std::fmt;

/// Failure reported by a transport step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// Relay reply code, when the relay answered.
    pub code: Option<u16>,
    /// Human-readable description.
    pub message: String,
}

impl TransportError {
    /// Creates an error without a reply code (I/O, TLS, timeouts).
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Creates an error carrying the relay's reply code.
    #[must_use]
    pub fn with_code(code: u16, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{code} {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<mailer_smtp::Error> for TransportError {
    fn from(err: mailer_smtp::Error) -> Self {
        match err {
            mailer_smtp::Error::SmtpError { code, message } => Self::with_code(code, message),
            other => Self {
                code: other.code(),
                message: other.to_string(),
            },
        }
    }
}

/// Protocol steps a mail session is built from.
///
/// Every method blocks until the step completes. A handle is owned by
/// exactly one session; dropping it must release the underlying socket.
pub trait Transport {
    /// Live connection handle.
    type Connection;

    /// Opens a plaintext connection and performs the greeting.
    ///
    /// # Errors
    ///
    /// Fails if the relay is unreachable or refuses the greeting.
    fn connect(&mut self, endpoint: &Endpoint) -> Result<Self::Connection, TransportError>;

    /// Upgrades the connection to TLS, verifying the certificate for `host`.
    ///
    /// # Errors
    ///
    /// Fails if the relay does not offer the upgrade or the TLS handshake fails.
    fn starttls(&mut self, conn: &mut Self::Connection, host: &str) -> Result<(), TransportError>;

    /// Authenticates the connection.
    ///
    /// # Errors
    ///
    /// Fails if the credentials are rejected.
    fn login(
        &mut self,
        conn: &mut Self::Connection,
        username: &str,
        password: &str,
    ) -> Result<(), TransportError>;

    /// Submits one message to every envelope recipient.
    ///
    /// # Errors
    ///
    /// Fails if the relay rejects the sender, any recipient, or the payload.
    fn send_mail(
        &mut self,
        conn: &mut Self::Connection,
        envelope: &Envelope,
        payload: &[u8],
    ) -> Result<(), TransportError>;

    /// Ends the session politely and releases the handle.
    ///
    /// # Errors
    ///
    /// Fails if the goodbye exchange fails; the handle is released anyway.
    fn disconnect(&mut self, conn: Self::Connection) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TransportError::new("timed out").to_string(), "timed out");
        assert_eq!(
            TransportError::with_code(535, "bad credentials").to_string(),
            "535 bad credentials"
        );
    }

    #[test]
    fn test_from_smtp_error() {
        let err = TransportError::from(mailer_smtp::Error::smtp_error(550, "No such user"));
        assert_eq!(err, TransportError::with_code(550, "No such user"));

        let err = TransportError::from(mailer_smtp::Error::NotSupported("STARTTLS".into()));
        assert_eq!(err.code, None);
        assert_eq!(err.message, "Server does not support STARTTLS");

        let err = TransportError::from(mailer_smtp::Error::MessageTooLarge {
            size: 10,
            limit: 5,
        });
        assert_eq!(err.code, Some(552));
    }
}
