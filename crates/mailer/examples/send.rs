#![allow(clippy::doc_markdown, clippy::uninlined_format_args)]
//! Example: send one message, optionally with attachments
//!
//! ## Prerequisites
//!
//! For Gmail, enable two-step verification and create an app password at
//! https://myaccount.google.com/apppasswords. Use it instead of your regular
//! password.
//!
//! ## Running
//!
//! ```bash
//! MAILER_USER=me@gmail.com MAILER_PASSWORD=app-password \
//!     cargo run --package mailer --example send -- you@example.com report.pdf
//! ```
//!
//! Set `MAILER_ENDPOINT` to use another relay, and `RUST_LOG=mailer=debug,mailer_smtp=debug`
//! to watch the SMTP dialogue.

use mailer::{DEFAULT_ENDPOINT, Mailer, OutgoingMessage};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let username = env::var("MAILER_USER")?;
    let password = env::var("MAILER_PASSWORD")?;
    let endpoint = env::var("MAILER_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());

    let mut args = env::args().skip(1);
    let recipient = args.next().ok_or("usage: send <recipient> [attachment...]")?;
    let attachments: Vec<String> = args.collect();

    let message = OutgoingMessage::new(recipient.as_str(), "Test message", "Sent by the mailer example.")
        .attachments(attachments.iter().map(String::as_str));

    println!("Sending to {} via {}...", recipient, endpoint);
    let mut mailer = Mailer::new(username, password, &endpoint)?;
    mailer.session(|m| m.send(&message))?;
    println!("✓ Sent");

    Ok(())
}
