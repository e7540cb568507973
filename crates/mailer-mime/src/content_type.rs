//! MIME content type handling.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Characters that force a parameter value to be quoted (RFC 2045 tspecials).
const TSPECIALS: &str = "()<>@,;:\\\"/[]?=";

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "application", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "octet-stream", "mixed").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8, boundary=xxx).
    pub parameters: BTreeMap<String, String>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Creates a text/plain content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Creates an application/octet-stream content type.
    #[must_use]
    pub fn application_octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// Creates a multipart/mixed content type with boundary.
    #[must_use]
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "mixed").with_parameter("boundary", boundary)
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Returns the `type/subtype` essence without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get("charset").map(String::as_str)
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Checks if this is a text content type.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("text")
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2=value2`
    ///
    /// # Errors
    ///
    /// Returns an error if the format is invalid.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = split_unquoted(s).into_iter();

        let type_str = parts.next().unwrap_or_default().trim();
        if type_str.is_empty() {
            return Err(Error::InvalidContentType("Empty content type".to_string()));
        }

        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("Missing subtype: {type_str}")))?;

        let mut content_type = Self::new(
            main_type.trim().to_lowercase(),
            sub_type.trim().to_lowercase(),
        );

        for (key, value) in parse_parameters(parts) {
            content_type.parameters.insert(key, value);
        }

        Ok(content_type)
    }
}

/// Splits a header value on `;` separators that are not inside quotes.
pub(crate) fn split_unquoted(s: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (index, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(&s[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    segments.push(&s[start..]);
    segments
}

/// Parses `key=value` parameter segments, lowercasing keys and unquoting values.
pub(crate) fn parse_parameters<'a>(
    segments: impl Iterator<Item = &'a str>,
) -> Vec<(String, String)> {
    segments
        .filter_map(|param| {
            let (key, value) = param.trim().split_once('=')?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .map_or_else(|| value.to_string(), |v| v.replace("\\\"", "\"").replace("\\\\", "\\"));
            Some((key.trim().to_lowercase(), value))
        })
        .collect()
}

/// Writes `; key=value`, quoting the value when it contains tspecials.
pub(crate) fn write_parameter(f: &mut fmt::Formatter<'_>, key: &str, value: &str) -> fmt::Result {
    if value.is_empty() || value.contains(|c: char| c.is_whitespace() || TSPECIALS.contains(c)) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        write!(f, "; {key}=\"{escaped}\"")
    } else {
        write!(f, "; {key}={value}")
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;

        for (key, value) in &self.parameters {
            write_parameter(f, key, value)?;
        }

        Ok(())
    }
}
