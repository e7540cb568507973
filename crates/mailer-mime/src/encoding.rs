//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, RFC 2047 header encoding and RFC 2231
//! parameter encoding.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum encoded line length (RFC 2045).
const MAX_LINE_LENGTH: usize = 76;

/// Maximum line length allowed by RFC 5322 for unencoded text.
pub const MAX_TEXT_LINE_LENGTH: usize = 998;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64, wrapped into CRLF-terminated lines of 76 columns.
///
/// Empty input produces an empty string.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2 + 2);

    // Base64 output is pure ASCII, so byte chunks are char boundaries.
    for chunk in encoded.as_bytes().chunks(MAX_LINE_LENGTH) {
        result.push_str(&String::from_utf8_lossy(chunk));
        result.push_str("\r\n");
    }

    result
}

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// Line breaks in the input (`\n` or `\r\n`) are kept as hard CRLF breaks;
/// long lines get soft breaks so no encoded line exceeds 76 columns.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::new();

    let mut lines = text.split('\n').peekable();
    while let Some(line) = lines.next() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        encode_quoted_printable_line(line.as_bytes(), &mut result);
        if lines.peek().is_some() {
            result.push_str("\r\n");
        }
    }

    result
}

fn encode_quoted_printable_line(line: &[u8], out: &mut String) {
    let mut line_length = 0;

    for (index, byte) in line.iter().enumerate() {
        let is_last = index + 1 == line.len();

        let mut token = String::with_capacity(3);
        match byte {
            // Trailing whitespace must be encoded
            b' ' | b'\t' if is_last => {
                let _ = write!(token, "={byte:02X}");
            }
            b'!'..=b'<' | b'>'..=b'~' | b' ' | b'\t' => token.push(char::from(*byte)),
            _ => {
                let _ = write!(token, "={byte:02X}");
            }
        }

        // Leave room for the "=" of a soft line break
        let limit = if is_last {
            MAX_LINE_LENGTH
        } else {
            MAX_LINE_LENGTH - 1
        };
        if line_length + token.len() > limit {
            out.push_str("=\r\n");
            line_length = 0;
        }

        out.push_str(&token);
        line_length += token.len();
    }
}

/// Decodes Quoted-Printable text (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'=' {
            result.push(bytes[i]);
            i += 1;
            continue;
        }

        // Soft line break
        match bytes.get(i + 1..i + 3) {
            Some([b'\r', b'\n']) => {
                i += 3;
                continue;
            }
            Some([b'\n', _]) => {
                i += 2;
                continue;
            }
            _ if bytes.get(i + 1) == Some(&b'\n') => {
                i += 2;
                continue;
            }
            _ => {}
        }

        let hex = bytes
            .get(i + 1..i + 3)
            .ok_or_else(|| Error::InvalidEncoding("Incomplete escape sequence".to_string()))?;
        let hex = std::str::from_utf8(hex)
            .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
        let byte = u8::from_str_radix(hex, 16)
            .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
        result.push(byte);
        i += 3;
    }

    Ok(result)
}

/// Returns true if a header value can be written without encoding.
fn is_plain_header_text(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) && !text.contains("=?")
}

/// Encodes a header value using RFC 2047 encoding.
///
/// Format: `=?charset?B?encoded-text?=`. Values that are plain printable
/// ASCII are returned unchanged.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if is_plain_header_text(text) {
        return text.to_string();
    }

    let encoded = encode_base64(text.as_bytes());
    format!("=?{charset}?B?{encoded}?=")
}

/// Decodes RFC 2047 encoded header value.
///
/// Format: `=?charset?encoding?encoded-text?=`
///
/// # Errors
///
/// Returns an error if the input is not valid RFC 2047 format.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    if !text.starts_with("=?") || !text.ends_with("?=") || text.len() < 4 {
        return Ok(text.to_string());
    }

    let inner = &text[2..text.len() - 2];
    let parts: Vec<&str> = inner.split('?').collect();

    if parts.len() != 3 {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    }

    let encoding = parts[1].to_uppercase();
    let encoded_text = parts[2];

    let decoded = match encoding.as_str() {
        "B" => decode_base64(encoded_text)?,
        // Quoted-Printable with underscore for space
        "Q" => decode_quoted_printable(&encoded_text.replace('_', " "))?,
        _ => {
            return Err(Error::InvalidEncoding(format!(
                "Unknown encoding: {encoding}"
            )));
        }
    };

    String::from_utf8(decoded).map_err(Into::into)
}

/// Percent-encodes a parameter value for RFC 2231 (`utf-8''...`).
#[must_use]
pub fn encode_rfc2231(value: &str) -> String {
    let mut result = String::from("utf-8''");
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            result.push(char::from(byte));
        } else {
            let _ = write!(result, "%{byte:02X}");
        }
    }
    result
}

/// Decodes an RFC 2231 `charset'language'value` parameter.
///
/// # Errors
///
/// Returns an error on malformed percent escapes or invalid UTF-8.
pub fn decode_rfc2231(value: &str) -> Result<String> {
    let encoded = value.splitn(3, '\'').nth(2).unwrap_or(value);
    let bytes = encoded.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .ok_or_else(|| Error::InvalidEncoding("Incomplete percent escape".to_string()))?;
            let byte = u8::from_str_radix(hex, 16)
                .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(result).map_err(Into::into)
}
