//! # mailer-mime
//!
//! Composition of outgoing email messages.
//!
//! ## Features
//!
//! - **Message building**: plain `text/plain` messages, or `multipart/mixed`
//!   with the text first and one part per attachment
//! - **Attachments**: read from disk at build time, base64 encoded
//! - **Encoding/Decoding**: Base64, Quoted-Printable, RFC 2047 headers,
//!   RFC 2231 filenames
//! - **Read-back**: parse a serialized message to inspect headers and parts
//!
//! ## Quick Start
//!
//! ### Building Messages
//!
//! ```ignore
//! use mailer_mime::MessageBuilder;
//!
//! let message = MessageBuilder::new()
//!     .from("sender@example.com")
//!     .to(["one@example.com", "two@example.com"])
//!     .cc("copy@example.com")
//!     .subject("Test Message")
//!     .text_body("Hello, World!")
//!     .attach("report.pdf")
//!     .build()?;
//!
//! println!("{message}");
//! ```
//!
//! ### One-shot Serialization
//!
//! ```ignore
//! use mailer_mime::{AddressList, build_message};
//!
//! let raw = build_message(
//!     "to@example.com",
//!     "Subject",
//!     "Body",
//!     "from@example.com",
//!     AddressList::new(),
//!     AddressList::new(),
//!     Vec::<String>::new(),
//! )?;
//! ```
//!
//! ### Reading a Message Back
//!
//! ```ignore
//! use mailer_mime::Message;
//!
//! let message = Message::parse(&raw)?;
//! println!("Subject: {}", message.subject().unwrap_or("(no subject)"));
//! for attachment in message.attachments()? {
//!     println!("{} ({} bytes)", attachment.filename(), attachment.content().len());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod attachment;
mod builder;
mod content_type;
mod disposition;
mod error;
mod header;
mod message;

pub mod encoding;

pub use address::AddressList;
pub use attachment::{Attachment, AttachmentSource};
pub use builder::{MessageBuilder, build_message};
pub use content_type::ContentType;
pub use disposition::{ContentDisposition, DispositionType};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
