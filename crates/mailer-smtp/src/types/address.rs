//! Envelope addresses.

use crate::error::{Error, Result};

/// Email address for the SMTP envelope (`MAIL FROM` / `RCPT TO`).
///
/// Only what would break the command line is rejected: the address must be
/// `local@domain` with both halves non-empty, and must not contain line
/// breaks, angle brackets or whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the address is unusable on the wire.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the address needs the SMTPUTF8 extension.
    #[must_use]
    pub fn is_international(&self) -> bool {
        !self.0.is_ascii()
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        if let Some(c) = addr
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>'))
        {
            return Err(Error::InvalidAddress(format!(
                "{addr:?} contains forbidden character {c:?}"
            )));
        }

        // Quoted local parts may contain '@', so split at the last one
        let Some((local, domain)) = addr.rsplit_once('@') else {
            return Err(Error::InvalidAddress(format!("{addr:?} must contain @")));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "{addr:?}: local and domain parts cannot be empty"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for Address {
    type Error = Error;

    fn try_from(addr: &str) -> Result<Self> {
        Self::new(addr)
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(addr: String) -> Result<Self> {
        Self::new(addr)
    }
}
