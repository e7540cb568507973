//! # mailer
//!
//! Compose an email and send it through an authenticated, encrypted session.
//!
//! ## Features
//!
//! - **Message composition**: subject, text body, To/Cc/Bcc and file
//!   attachments, rendered as `text/plain` or `multipart/mixed` by
//!   [`mailer_mime`]
//! - **Session lifecycle**: connect, STARTTLS, login, send any number of
//!   messages, close
//! - **Explicit misuse errors**: sending on a closed session or opening an
//!   open one is an error, not a silent no-op
//! - **Pluggable transport**: [`SmtpTransport`] in production, any
//!   [`Transport`] implementation in tests
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailer::{Mailer, OutgoingMessage};
//!
//! fn main() -> mailer::Result<()> {
//!     let mut mailer = Mailer::new("me@gmail.com", "app-password", mailer::DEFAULT_ENDPOINT)?;
//!
//!     mailer.session(|m| {
//!         let message = OutgoingMessage::new("you@example.com", "Report", "See attached.")
//!             .cc(["boss@example.com", "team@example.com"])
//!             .attach("report.pdf");
//!         m.send(&message)
//!     })
//! }
//! ```
//!
//! ## Blocking
//!
//! Every [`Mailer`] method blocks the calling thread. The SMTP transport runs
//! its own single-threaded runtime per connection, so it must not be used
//! from inside an async task.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod envelope;
mod error;
mod message;
mod session;
mod smtp;
mod transport;

pub use config::{Config, ConfigBuilder, Credentials, DEFAULT_ENDPOINT, Endpoint};
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use message::OutgoingMessage;
pub use session::Mailer;
pub use smtp::{SmtpConnection, SmtpTransport};
pub use transport::{Transport, TransportError};

pub use mailer_mime::{AddressList, Attachment, AttachmentSource, MessageBuilder, build_message};
