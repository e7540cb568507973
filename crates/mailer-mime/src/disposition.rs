//! `Content-Disposition` header (RFC 2183) with RFC 2231 filenames.

use crate::content_type::{parse_parameters, split_unquoted, write_parameter};
use crate::encoding::{decode_rfc2231, encode_rfc2231};
use crate::error::{Error, Result};
use std::fmt;

/// Disposition type of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionType {
    /// Displayed as part of the message.
    Inline,
    /// Offered as a separate file.
    Attachment,
}

impl fmt::Display for DispositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline => write!(f, "inline"),
            Self::Attachment => write!(f, "attachment"),
        }
    }
}

/// Parsed or to-be-rendered `Content-Disposition` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// Disposition type.
    pub kind: DispositionType,
    /// Suggested filename, already decoded.
    pub filename: Option<String>,
}

impl ContentDisposition {
    /// `attachment` disposition carrying a filename.
    #[must_use]
    pub fn attachment(filename: impl Into<String>) -> Self {
        Self {
            kind: DispositionType::Attachment,
            filename: Some(filename.into()),
        }
    }

    /// Parses a `Content-Disposition` header value.
    ///
    /// Understands both `filename="..."` and RFC 2231 `filename*=`; the
    /// extended form wins when both are present.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown disposition type or a malformed
    /// extended filename.
    pub fn parse(s: &str) -> Result<Self> {
        let mut segments = split_unquoted(s).into_iter();
        let kind = match segments.next().map(|k| k.trim().to_lowercase()).as_deref() {
            Some("inline") => DispositionType::Inline,
            Some("attachment") => DispositionType::Attachment,
            other => {
                return Err(Error::InvalidHeader(format!(
                    "Unknown disposition: {}",
                    other.unwrap_or_default()
                )));
            }
        };

        let mut filename = None;
        let mut extended = None;
        for (key, value) in parse_parameters(segments) {
            match key.as_str() {
                "filename" => filename = Some(value),
                "filename*" => extended = Some(decode_rfc2231(&value)?),
                _ => {}
            }
        }

        Ok(Self {
            kind,
            filename: extended.or(filename),
        })
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        match &self.filename {
            Some(name) if name.is_ascii() && !name.chars().any(|c| c.is_ascii_control()) => {
                // Always quoted, like most mail clients do
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "; filename=\"{escaped}\"")
            }
            Some(name) => write_parameter(f, "filename*", &encode_rfc2231(name)),
            None => Ok(()),
        }
    }
}
