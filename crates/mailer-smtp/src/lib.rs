//! # mailer-smtp
//!
//! Async SMTP submission client (RFC 5321) used by the `mailer` session.
//!
//! ## Features
//!
//! - **Type-state connection management**: greeting, EHLO, STARTTLS and AUTH
//!   on `Client<Connected>`; mail submission only on `Client<Authenticated>`
//! - **STARTTLS**: plaintext connect, then upgrade with rustls and the webpki
//!   root store
//! - **Authentication**: PLAIN, with LOGIN for servers that only offer it
//! - **Extensions**: SIZE, 8BITMIME, SMTPUTF8
//! - **Whole-transaction send**: one call runs MAIL/RCPT/DATA and resets the
//!   transaction on failure so the connection stays usable
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailer_smtp::{Address, Client};
//! use mailer_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> mailer_smtp::Result<()> {
//!     let stream = connect("smtp.example.com", 587).await?;
//!     let client = Client::from_stream(stream).await?;
//!
//!     let client = client.ehlo("client.example.com").await?;
//!     let client = client.starttls("smtp.example.com").await?;
//!     let mut client = client.auth("user@example.com", "password").await?;
//!
//!     let from = Address::new("sender@example.com")?;
//!     let to = [Address::new("recipient@example.com")?];
//!     client
//!         .send_mail(&from, &to, b"Subject: Test\r\n\r\nHello, World!\r\n")
//!         .await?;
//!
//!     client.quit().await
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌──────────────┐                     ┌───────────────┐
//! │  Connected   │ ─── auth() ───────→ │ Authenticated │ ─┐
//! └──────────────┘                     └───────────────┘  │ send_mail()
//!   ehlo(), starttls()                        ↑───────────┘
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`connection`]: Connection management and type-state client
//! - [`parser`]: Reply parser
//! - [`types`]: Core SMTP types (addresses, extensions, replies)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{Authenticated, Client, Connected, ServerInfo};
pub use error::{Error, RefusedRecipient, Result};
pub use types::{Address, AuthMechanism, Extension, Reply, ReplyCode};

/// Port for message submission with STARTTLS (RFC 6409).
pub const SUBMISSION_PORT: u16 = 587;
