//! MIME message structure, serialization and read-back.

use crate::attachment::Attachment;
use crate::content_type::ContentType;
use crate::disposition::{ContentDisposition, DispositionType};
use crate::encoding::{
    MAX_TEXT_LINE_LENGTH, decode_base64, decode_quoted_printable, encode_base64_wrapped,
    encode_quoted_printable,
};
use crate::error::{Error, Result};
use crate::header::Headers;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }

    /// Picks the encoding for a text body.
    ///
    /// Plain ASCII with sane line lengths goes out as `7bit`; anything else
    /// (non-ASCII, control characters, bare CR, overlong lines) is
    /// quoted-printable.
    #[must_use]
    pub fn for_text(text: &str) -> Self {
        let bytes = text.as_bytes();
        let clean_bytes = bytes.iter().enumerate().all(|(i, &b)| match b {
            b'\t' | b'\n' | b' '..=b'~' => true,
            b'\r' => bytes.get(i + 1) == Some(&b'\n'),
            _ => false,
        });
        let short_lines = text.lines().all(|line| line.len() <= MAX_TEXT_LINE_LENGTH);

        if clean_bytes && short_lines {
            Self::SevenBit
        } else {
            Self::QuotedPrintable
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// MIME message part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body as it appears on the wire (already transfer-encoded).
    pub body: Vec<u8>,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Creates a `text/plain; charset=utf-8` part.
    #[must_use]
    pub fn text(body: &str) -> Self {
        let encoding = TransferEncoding::for_text(body);
        let encoded = match encoding {
            TransferEncoding::SevenBit => normalize_line_endings(body),
            _ => encode_quoted_printable(body),
        };

        let mut headers = Headers::new();
        headers.add("Content-Type", ContentType::text_plain().to_string());
        headers.add("Content-Transfer-Encoding", encoding.to_string());

        Self::new(headers, encoded.into_bytes())
    }

    /// Creates a base64 `application/octet-stream` attachment part.
    #[must_use]
    pub fn attachment(attachment: &Attachment) -> Self {
        let mut headers = Headers::new();
        headers.add(
            "Content-Type",
            ContentType::application_octet_stream().to_string(),
        );
        headers.add(
            "Content-Transfer-Encoding",
            TransferEncoding::Base64.to_string(),
        );
        headers.add(
            "Content-Disposition",
            ContentDisposition::attachment(attachment.filename()).to_string(),
        );

        Self::new(headers, encode_base64_wrapped(attachment.content()).into_bytes())
    }

    /// Parses a part from its raw text (headers, blank line, body).
    ///
    /// # Errors
    ///
    /// Returns an error if the headers cannot be parsed.
    pub fn parse(raw: &str) -> Result<Self> {
        let (header_text, body) = split_header_body(raw);
        Ok(Self::new(Headers::parse(header_text)?, body.as_bytes().to_vec()))
    }

    /// Gets the content type.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Gets the content disposition, if the part has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is malformed.
    pub fn content_disposition(&self) -> Result<Option<ContentDisposition>> {
        self.headers
            .get("content-disposition")
            .map(ContentDisposition::parse)
            .transpose()
    }

    /// Returns the attachment filename, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the disposition header is malformed.
    pub fn filename(&self) -> Result<Option<String>> {
        Ok(self.content_disposition()?.and_then(|d| d.filename))
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        decode_transfer(&self.body, self.transfer_encoding())
    }

    /// Gets the decoded body as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding or UTF-8 conversion fails.
    pub fn body_text(&self) -> Result<String> {
        let decoded = self.decode_body()?;
        String::from_utf8(decoded).map_err(Into::into)
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n{}", self.headers, String::from_utf8_lossy(&self.body))
    }
}

/// Body of a message: one payload, or a multipart container.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Body {
    Single(Vec<u8>),
    Multipart { boundary: String, parts: Vec<Part> },
}

/// MIME message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message headers.
    pub headers: Headers,
    body: Body,
}

impl Message {
    /// Creates a single-part message.
    ///
    /// The part's content headers are appended to `headers`.
    #[must_use]
    pub fn single_part(mut headers: Headers, part: Part) -> Self {
        for (name, value) in part.headers.iter() {
            headers.add(name, value);
        }

        Self {
            headers,
            body: Body::Single(part.body),
        }
    }

    /// Creates a `multipart/mixed` message.
    ///
    /// A random boundary that occurs in none of the parts is chosen and
    /// announced in the `Content-Type` header.
    #[must_use]
    pub fn multipart(mut headers: Headers, parts: Vec<Part>) -> Self {
        let boundary = unique_boundary(&parts);
        headers.set(
            "Content-Type",
            ContentType::multipart_mixed(boundary.clone()).to_string(),
        );

        Self {
            headers,
            body: Body::Multipart { boundary, parts },
        }
    }

    /// Parses a serialized message.
    ///
    /// Gives a structural view of one level of MIME structure: top-level
    /// headers plus either a single body or the parts of a multipart body.
    /// Nested multiparts are kept as opaque parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the headers are malformed, a multipart message has
    /// no boundary, or no parts are found.
    pub fn parse(raw: &str) -> Result<Self> {
        let (header_text, body_text) = split_header_body(raw);
        let headers = Headers::parse(header_text)?;

        let content_type = headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)?;

        if !content_type.is_multipart() {
            return Ok(Self {
                headers,
                body: Body::Single(body_text.as_bytes().to_vec()),
            });
        }

        let boundary = content_type
            .boundary()
            .ok_or(Error::MissingBoundary)?
            .to_string();
        let parts = split_multipart(body_text, &boundary)?;

        Ok(Self {
            headers,
            body: Body::Multipart { boundary, parts },
        })
    }

    /// Gets the content type.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Checks if this is a multipart message.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self.body, Body::Multipart { .. })
    }

    /// Returns the multipart boundary, if any.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        match &self.body {
            Body::Multipart { boundary, .. } => Some(boundary.as_str()),
            Body::Single(_) => None,
        }
    }

    /// Returns the parts (empty for single-part messages).
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        match &self.body {
            Body::Multipart { parts, .. } => parts.as_slice(),
            Body::Single(_) => &[],
        }
    }

    /// Returns the raw body of a single-part message.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        match &self.body {
            Body::Single(body) => Some(body.as_slice()),
            Body::Multipart { .. } => None,
        }
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.get("from")
    }

    /// Gets the To header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.headers.get("to")
    }

    /// Gets the Cc header.
    #[must_use]
    pub fn cc(&self) -> Option<&str> {
        self.headers.get("cc")
    }

    /// Gets the Bcc header.
    #[must_use]
    pub fn bcc(&self) -> Option<&str> {
        self.headers.get("bcc")
    }

    /// Gets the raw Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }

    /// Gets the Subject header with RFC 2047 encoding undone.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoded word is malformed.
    pub fn decoded_subject(&self) -> Result<Option<String>> {
        self.subject().map(Headers::decode_value).transpose()
    }

    /// Gets the Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.headers.get("date")
    }

    /// Gets the body as text for single-part messages.
    ///
    /// # Errors
    ///
    /// Returns an error if this is a multipart message or decoding fails.
    pub fn body_text(&self) -> Result<String> {
        let Body::Single(body) = &self.body else {
            return Err(Error::InvalidMultipart(
                "Use parts for multipart messages".to_string(),
            ));
        };

        let transfer_encoding = self
            .headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse);

        String::from_utf8(decode_transfer(body, transfer_encoding)?).map_err(Into::into)
    }

    /// Finds the first text/plain part in a multipart message.
    ///
    /// # Errors
    ///
    /// Returns an error if no text part is found or decoding fails.
    pub fn text_part(&self) -> Result<String> {
        for part in self.parts() {
            let ct = part.content_type()?;
            if ct.main_type == "text" && ct.sub_type == "plain" {
                return part.body_text();
            }
        }

        Err(Error::Parse("No text/plain part found".to_string()))
    }

    /// Decodes every part marked `Content-Disposition: attachment`, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a part cannot be decoded.
    pub fn attachments(&self) -> Result<Vec<Attachment>> {
        let mut attachments = Vec::new();
        for part in self.parts() {
            let Some(disposition) = part.content_disposition()? else {
                continue;
            };
            if disposition.kind != DispositionType::Attachment {
                continue;
            }
            attachments.push(Attachment::new(
                disposition.filename.unwrap_or_default(),
                part.decode_body()?,
            ));
        }
        Ok(attachments)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n", self.headers)?;

        match &self.body {
            Body::Single(body) => f.write_str(&String::from_utf8_lossy(body)),
            Body::Multipart { boundary, parts } => {
                for part in parts {
                    write!(f, "--{boundary}\r\n{part}\r\n")?;
                }
                write!(f, "--{boundary}--\r\n")
            }
        }
    }
}

fn decode_transfer(body: &[u8], encoding: TransferEncoding) -> Result<Vec<u8>> {
    match encoding {
        TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(body)),
        TransferEncoding::QuotedPrintable => {
            decode_quoted_printable(&String::from_utf8_lossy(body))
        }
        _ => Ok(body.to_vec()),
    }
}

/// Converts bare `\n` line endings to CRLF.
fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

/// Splits raw text at the first blank line into headers and body.
fn split_header_body(raw: &str) -> (&str, &str) {
    if let Some(body) = raw.strip_prefix("\r\n").or_else(|| raw.strip_prefix('\n')) {
        return ("", body);
    }

    let crlf = raw.find("\r\n\r\n").map(|i| (i, 4));
    let lf = raw.find("\n\n").map(|i| (i, 2));
    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match split {
        // Keep the line ending that terminates the last header
        Some((index, skip)) => (&raw[..index + skip / 2], &raw[index + skip..]),
        None => (raw, ""),
    }
}

fn split_multipart(body: &str, boundary: &str) -> Result<Vec<Part>> {
    let delimiter = format!("--{boundary}");
    let mut sections = body.split(delimiter.as_str());
    // Preamble
    sections.next();

    let mut parts = Vec::new();
    let mut closed = false;
    for section in sections {
        if section.starts_with("--") {
            closed = true;
            break;
        }
        let section = section
            .strip_prefix("\r\n")
            .or_else(|| section.strip_prefix('\n'))
            .unwrap_or(section);
        let section = section
            .strip_suffix("\r\n")
            .or_else(|| section.strip_suffix('\n'))
            .unwrap_or(section);
        parts.push(Part::parse(section)?);
    }

    if parts.is_empty() || !closed {
        return Err(Error::InvalidMultipart(format!(
            "Expected parts closed by --{boundary}--"
        )));
    }

    Ok(parts)
}

/// Generates a boundary that does not occur inside any part.
fn unique_boundary(parts: &[Part]) -> String {
    loop {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();
        let boundary = format!("=_Part_{token}");

        let collides = parts
            .iter()
            .any(|part| part.to_string().contains(&boundary));
        if !collides {
            return boundary;
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("base64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
    }

    #[test]
    fn test_transfer_encoding_for_text() {
        assert_eq!(TransferEncoding::for_text("plain body\n"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::for_text("caf\u{e9}"), TransferEncoding::QuotedPrintable);
        assert_eq!(TransferEncoding::for_text("bare\rcr"), TransferEncoding::QuotedPrintable);
        assert_eq!(
            TransferEncoding::for_text(&"x".repeat(1000)),
            TransferEncoding::QuotedPrintable
        );
    }

    #[test]
    fn test_part_text_round_trip() {
        let part = Part::text("Grüße aus Köln");
        assert_eq!(part.transfer_encoding(), TransferEncoding::QuotedPrintable);
        assert_eq!(part.body_text().unwrap(), "Grüße aus Köln");
    }

    #[test]
    fn test_part_attachment_headers() {
        let part = Part::attachment(&Attachment::new("data.bin", vec![1_u8, 2, 3]));
        assert_eq!(
            part.content_type().unwrap().essence(),
            "application/octet-stream"
        );
        assert_eq!(part.transfer_encoding(), TransferEncoding::Base64);
        assert_eq!(part.filename().unwrap().as_deref(), Some("data.bin"));
        assert_eq!(part.decode_body().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_message_single_part() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com");
        headers.add("To", "recipient@example.com");
        headers.add("Subject", "Test");

        let message = Message::single_part(headers, Part::text("Hello, World!"));

        assert!(!message.is_multipart());
        assert_eq!(message.from(), Some("sender@example.com"));
        assert_eq!(message.to(), Some("recipient@example.com"));
        assert_eq!(message.subject(), Some("Test"));
        assert_eq!(message.body_text().unwrap(), "Hello, World!");
        assert!(message.parts().is_empty());
    }

    #[test]
    fn test_message_multipart() {
        let parts = vec![Part::text("Part 1"), Part::text("Part 2")];
        let message = Message::multipart(Headers::new(), parts);

        assert!(message.is_multipart());
        assert_eq!(message.parts().len(), 2);
        let ct = message.content_type().unwrap();
        assert_eq!(ct.essence(), "multipart/mixed");
        assert_eq!(ct.boundary(), message.boundary());
        assert!(message.body_text().is_err());
    }

    #[test]
    fn test_serialize_parse_single() {
        let mut headers = Headers::new();
        headers.add("Subject", "Hi");
        let message = Message::single_part(headers, Part::text("line one\nline two"));

        let raw = message.to_string();
        assert!(raw.starts_with("Subject: Hi\r\nContent-Type: text/plain; charset=utf-8\r\n"));

        let parsed = Message::parse(&raw).unwrap();
        assert_eq!(parsed.subject(), Some("Hi"));
        assert_eq!(parsed.body_text().unwrap(), "line one\r\nline two");
    }

    #[test]
    fn test_serialize_parse_multipart() {
        let attachment = Attachment::new("a.bin", (0_u8..=255).collect::<Vec<_>>());
        let message = Message::multipart(
            Headers::new(),
            vec![Part::text("body"), Part::attachment(&attachment)],
        );

        let raw = message.to_string();
        let boundary = message.boundary().unwrap();
        assert!(raw.ends_with(&format!("--{boundary}--\r\n")));

        let parsed = Message::parse(&raw).unwrap();
        assert_eq!(parsed.parts().len(), 2);
        assert_eq!(parsed.text_part().unwrap(), "body");
        assert_eq!(parsed.attachments().unwrap(), vec![attachment]);
    }

    #[test]
    fn test_parse_missing_boundary() {
        let raw = "Content-Type: multipart/mixed\r\n\r\nbody";
        assert!(matches!(Message::parse(raw), Err(Error::MissingBoundary)));
    }

    #[test]
    fn test_parse_unterminated_multipart() {
        let raw = "Content-Type: multipart/mixed; boundary=xyz\r\n\r\n--xyz\r\n\r\npart\r\n";
        assert!(matches!(
            Message::parse(raw),
            Err(Error::InvalidMultipart(_))
        ));
    }

    #[test]
    fn test_split_header_body() {
        assert_eq!(split_header_body("A: b\r\n\r\nbody"), ("A: b\r\n", "body"));
        assert_eq!(split_header_body("A: b\n\nbody"), ("A: b\n", "body"));
        assert_eq!(split_header_body("\r\nbody"), ("", "body"));
        assert_eq!(split_header_body("A: b"), ("A: b", ""));
    }
}
