//! SMTP connection management with type-state pattern.

mod client;
mod stream;

pub use client::{Authenticated, Client, Connected};
pub use stream::{SmtpStream, connect, create_tls_connector};

use crate::types::{AuthMechanism, Extension};
use std::collections::HashSet;

/// Server capabilities from the greeting and EHLO response.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from greeting.
    pub hostname: String,
    /// Supported extensions (empty after a HELO fallback).
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Checks if the server supports an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS is supported.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Checks if the SIZE extension was advertised, with or without a limit.
    #[must_use]
    pub fn supports_size(&self) -> bool {
        self.extensions
            .iter()
            .any(|ext| matches!(ext, Extension::Size(_)))
    }

    /// Returns the maximum message size, if advertised.
    ///
    /// `SIZE 0` means no fixed limit and yields `None`.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(Some(size)) if *size > 0 => Some(*size),
            _ => None,
        })
    }

    /// Returns supported authentication mechanisms.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                Extension::Auth(mechanisms) => Some(mechanisms.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Picks the SASL mechanism to log in with.
    ///
    /// PLAIN when advertised, else LOGIN when advertised. A server that
    /// advertises no usable mechanism gets PLAIN.
    #[must_use]
    pub fn preferred_auth(&self) -> AuthMechanism {
        let mechanisms = self.auth_mechanisms();
        if !mechanisms.contains(&AuthMechanism::Plain) && mechanisms.contains(&AuthMechanism::Login)
        {
            AuthMechanism::Login
        } else {
            AuthMechanism::Plain
        }
    }
}
