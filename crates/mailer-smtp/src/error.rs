//! Error types for SMTP operations.

use std::fmt;
use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A recipient the relay refused during `RCPT TO`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefusedRecipient {
    /// Envelope address that was refused.
    pub address: String,
    /// Reply code (e.g., 550).
    pub code: u16,
    /// Reply text from the relay.
    pub message: String,
}

impl fmt::Display for RefusedRecipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.address, self.code, self.message)
    }
}

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Server closed the connection mid-reply.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Server returned error response.
    #[error("SMTP error {code}: {message}")]
    SmtpError {
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// One or more recipients were refused; the transaction was reset.
    #[error("Recipients refused: {}", format_refused(.0))]
    RecipientsRefused(Vec<RefusedRecipient>),

    /// Protocol error (unexpected response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Message larger than the limit the server advertised.
    #[error("Message of {size} bytes exceeds server limit of {limit} bytes")]
    MessageTooLarge {
        /// Payload size.
        size: usize,
        /// Advertised `SIZE` limit.
        limit: usize,
    },

    /// Feature not supported by server.
    #[error("Server does not support {0}")]
    NotSupported(String),
}

fn format_refused(refused: &[RefusedRecipient]) -> String {
    refused
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Creates an SMTP error from a reply code and message.
    #[must_use]
    pub fn smtp_error(code: u16, message: impl Into<String>) -> Self {
        Self::SmtpError {
            code,
            message: message.into(),
        }
    }

    /// Returns the relay reply code behind this error, if there is one.
    ///
    /// For refused recipients this is the code of the first refusal;
    /// an oversized message maps to 552.
    #[must_use]
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::SmtpError { code, .. } => Some(*code),
            Self::RecipientsRefused(refused) => refused.first().map(|r| r.code),
            Self::MessageTooLarge { .. } => Some(552),
            _ => None,
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.code().is_some_and(|code| (500..600).contains(&code))
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.code().is_some_and(|code| (400..500).contains(&code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_classification() {
        let err = Error::smtp_error(550, "No such user");
        assert_eq!(err.code(), Some(550));
        assert!(err.is_permanent());
        assert!(!err.is_transient());

        let err = Error::smtp_error(451, "Try later");
        assert!(err.is_transient());

        assert_eq!(Error::ConnectionClosed.code(), None);
        assert!(!Error::ConnectionClosed.is_permanent());
    }

    #[test]
    fn test_recipients_refused_display() {
        let err = Error::RecipientsRefused(vec![
            RefusedRecipient {
                address: "a@example.com".into(),
                code: 550,
                message: "unknown".into(),
            },
            RefusedRecipient {
                address: "b@example.com".into(),
                code: 451,
                message: "later".into(),
            },
        ]);
        assert_eq!(err.code(), Some(550));
        assert_eq!(
            err.to_string(),
            "Recipients refused: a@example.com (550 unknown), b@example.com (451 later)"
        );
    }

    #[test]
    fn test_message_too_large() {
        let err = Error::MessageTooLarge {
            size: 2048,
            limit: 1024,
        };
        assert_eq!(err.code(), Some(552));
        assert!(err.to_string().contains("2048"));
    }
}
