//! Error types for mail sessions.

use crate::transport::TransportError;
use std::path::PathBuf;

/// Result type alias for mail session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`Mailer`](crate::Mailer).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An attachment could not be read. Nothing was sent.
    #[error("Attachment not found: {}", path.display())]
    ResourceNotFound {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The relay could not be reached, or the goodbye on close failed.
    #[error("Connection failed: {0}")]
    Connection(#[source] TransportError),

    /// The STARTTLS upgrade failed.
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] TransportError),

    /// The relay rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(#[source] TransportError),

    /// The session is not open.
    #[error("Session is not open")]
    NotOpen,

    /// The session is already open.
    #[error("Session is already open")]
    AlreadyOpen,

    /// The relay rejected the message or some of its recipients.
    #[error("Delivery failed: {0}")]
    Delivery(#[source] TransportError),

    /// Malformed `host:port` endpoint.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The message could not be composed.
    #[error("Message error: {0}")]
    Message(#[source] mailer_mime::Error),
}

impl Error {
    /// Returns the relay reply code behind this error, if there is one.
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        match self {
            Self::Connection(e) | Self::Handshake(e) | Self::Authentication(e) | Self::Delivery(e) => {
                e.code
            }
            _ => None,
        }
    }
}

impl From<mailer_mime::Error> for Error {
    fn from(err: mailer_mime::Error) -> Self {
        match err {
            mailer_mime::Error::ResourceNotFound { path, source } => {
                Self::ResourceNotFound { path, source }
            }
            other => Self::Message(other),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_not_found_passes_through() {
        let mime = mailer_mime::Error::ResourceNotFound {
            path: PathBuf::from("/missing/file.txt"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        match Error::from(mime) {
            Error::ResourceNotFound { path, .. } => {
                assert_eq!(path, PathBuf::from("/missing/file.txt"));
            }
            other => panic!("expected ResourceNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_other_mime_errors_wrap() {
        let err = Error::from(mailer_mime::Error::MissingBoundary);
        assert!(matches!(err, Error::Message(_)));
    }

    #[test]
    fn test_code() {
        let err = Error::Delivery(TransportError::with_code(550, "no such user"));
        assert_eq!(err.code(), Some(550));
        assert_eq!(err.to_string(), "Delivery failed: 550 no such user");
        assert_eq!(Error::NotOpen.code(), None);
    }
}
