//! Composing outgoing messages.

use crate::address::AddressList;
use crate::attachment::{Attachment, AttachmentSource};
use crate::error::Result;
use crate::header::Headers;
use crate::message::{Message, Part};
use chrono::{DateTime, FixedOffset, Local};

/// Builds a plain or `multipart/mixed` message from logical fields.
///
/// With no attachments the result is a single `text/plain` part. With
/// attachments it is a multipart container holding the text body first and
/// then one `application/octet-stream` part per attachment, in the order they
/// were added. Attachment files are read in [`MessageBuilder::build`]; if any
/// is missing the build fails and nothing is returned.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    from: String,
    to: AddressList,
    cc: AddressList,
    bcc: AddressList,
    subject: String,
    body: String,
    attachments: Vec<AttachmentSource>,
    date: Option<DateTime<FixedOffset>>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sender (`From`).
    #[must_use]
    pub fn from(mut self, sender: impl Into<String>) -> Self {
        self.from = sender.into();
        self
    }

    /// Adds direct recipients (`To`).
    #[must_use]
    pub fn to(mut self, recipients: impl Into<AddressList>) -> Self {
        self.to.extend::<AddressList>(recipients.into());
        self
    }

    /// Adds carbon-copy recipients (`Cc`).
    #[must_use]
    pub fn cc(mut self, recipients: impl Into<AddressList>) -> Self {
        self.cc.extend::<AddressList>(recipients.into());
        self
    }

    /// Adds blind carbon-copy recipients (`Bcc`).
    #[must_use]
    pub fn bcc(mut self, recipients: impl Into<AddressList>) -> Self {
        self.bcc.extend::<AddressList>(recipients.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the plain text body.
    #[must_use]
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Appends an attachment, either a file path or an in-memory [`Attachment`].
    #[must_use]
    pub fn attach(mut self, attachment: impl Into<AttachmentSource>) -> Self {
        self.attachments.push(attachment.into());
        self
    }

    /// Appends several attachments, keeping their order.
    #[must_use]
    pub fn attachments<I>(mut self, attachments: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<AttachmentSource>,
    {
        self.attachments
            .extend(attachments.into_iter().map(Into::into));
        self
    }

    /// Fixes the `Date` header instead of using the current time.
    #[must_use]
    pub const fn date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    /// Builds the message, reading attachment files.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ResourceNotFound`] if an attachment file
    /// cannot be read.
    pub fn build(self) -> Result<Message> {
        let attachments = self
            .attachments
            .iter()
            .map(AttachmentSource::load)
            .collect::<Result<Vec<Attachment>>>()?;

        let mut headers = Headers::new();
        headers.add("Subject", Headers::encode_value(&self.subject));
        headers.add("From", self.from);
        for (name, list) in [("To", &self.to), ("Cc", &self.cc), ("Bcc", &self.bcc)] {
            if !list.is_empty() {
                headers.add(name, list.join());
            }
        }
        let date = self
            .date
            .unwrap_or_else(|| Local::now().fixed_offset());
        headers.add("Date", date.to_rfc2822());
        headers.add("MIME-Version", "1.0");

        let text = Part::text(&self.body);
        if attachments.is_empty() {
            return Ok(Message::single_part(headers, text));
        }

        let mut parts = Vec::with_capacity(attachments.len() + 1);
        parts.push(text);
        parts.extend(attachments.iter().map(Part::attachment));

        Ok(Message::multipart(headers, parts))
    }
}

/// Builds and serializes a message in one call.
///
/// `cc`, `bcc` and `attachments` may be empty.
///
/// # Errors
///
/// Returns [`crate::Error::ResourceNotFound`] if an attachment file cannot be
/// read.
pub fn build_message<I>(
    recipients: impl Into<AddressList>,
    subject: &str,
    body: &str,
    sender: &str,
    cc: impl Into<AddressList>,
    bcc: impl Into<AddressList>,
    attachments: I,
) -> Result<String>
where
    I: IntoIterator,
    I::Item: Into<AttachmentSource>,
{
    let message = MessageBuilder::new()
        .from(sender)
        .to(recipients)
        .cc(cc)
        .bcc(bcc)
        .subject(subject)
        .text_body(body)
        .attachments(attachments)
        .build()?;

    Ok(message.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::content_type::ContentType;
    use std::path::{Path, PathBuf};

    const TO: &str = "to@example.com";
    const FROM: &str = "from@example.com";
    const CC: &str = "cc@example.com";
    const BCC: &str = "bcc@example.com";

    fn no_attachments() -> Vec<PathBuf> {
        Vec::new()
    }

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_plain_single_recipient() {
        let raw = build_message(
            [TO],
            "the subject",
            "the body",
            FROM,
            AddressList::new(),
            AddressList::new(),
            no_attachments(),
        )
        .unwrap();

        let message = Message::parse(&raw).unwrap();
        assert!(!message.is_multipart());
        assert_eq!(message.content_type().unwrap().essence(), "text/plain");
        assert_eq!(message.content_type().unwrap().charset(), Some("utf-8"));
        assert_eq!(message.to(), Some(TO));
        assert_eq!(message.subject(), Some("the subject"));
        assert_eq!(message.from(), Some(FROM));
        assert_eq!(message.body_text().unwrap(), "the body");
        assert!(message.cc().is_none());
        assert!(message.bcc().is_none());
    }

    #[test]
    fn test_multiple_recipients_joined() {
        let message = MessageBuilder::new()
            .from(FROM)
            .to(["to1@example.com", "to2@example.com"])
            .subject("s")
            .text_body("b")
            .build()
            .unwrap();

        assert_eq!(message.to(), Some("to1@example.com, to2@example.com"));
    }

    #[test]
    fn test_cc_and_bcc_headers() {
        let raw = build_message(
            TO,
            "the subject",
            "the body",
            FROM,
            CC,
            BCC,
            no_attachments(),
        )
        .unwrap();

        let message = Message::parse(&raw).unwrap();
        assert!(!message.is_multipart());
        assert_eq!(message.to(), Some(TO));
        assert_eq!(message.cc(), Some(CC));
        assert_eq!(message.bcc(), Some(BCC));
    }

    #[test]
    fn test_empty_recipient_list_omits_header() {
        let message = MessageBuilder::new()
            .from(FROM)
            .subject("s")
            .text_body("b")
            .build()
            .unwrap();

        assert!(!message.headers.contains("To"));
        assert!(!message.to_string().contains("\r\nTo:"));
    }

    #[test]
    fn test_header_order() {
        let message = MessageBuilder::new()
            .from(FROM)
            .to(TO)
            .cc(CC)
            .bcc(BCC)
            .subject("s")
            .text_body("b")
            .build()
            .unwrap();

        let names: Vec<&str> = message.headers.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "Subject",
                "From",
                "To",
                "Cc",
                "Bcc",
                "Date",
                "MIME-Version",
                "Content-Type",
                "Content-Transfer-Encoding"
            ]
        );
    }

    #[test]
    fn test_single_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "attachmentA.txt", b"attachment A contents\n");

        let raw = build_message(
            TO,
            "the subject",
            "the body",
            FROM,
            AddressList::new(),
            AddressList::new(),
            [&path],
        )
        .unwrap();

        let message = Message::parse(&raw).unwrap();
        assert!(message.is_multipart());
        assert_eq!(message.content_type().unwrap().essence(), "multipart/mixed");
        assert_eq!(message.to(), Some(TO));
        assert!(message.cc().is_none());
        assert!(message.bcc().is_none());

        let parts = message.parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].content_type().unwrap(), ContentType::text_plain());
        assert_eq!(parts[0].body_text().unwrap(), "the body");
        assert_eq!(
            parts[1].content_type().unwrap().essence(),
            "application/octet-stream"
        );
        assert_eq!(parts[1].decode_body().unwrap(), b"attachment A contents\n");
        assert_eq!(parts[1].filename().unwrap().as_deref(), Some("attachmentA.txt"));
    }

    #[test]
    fn test_two_attachments_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.txt", b"first");
        let b = write_file(dir.path(), "b.bin", &[0, 159, 146, 150, 255]);

        let message = MessageBuilder::new()
            .from(FROM)
            .to(TO)
            .subject("the subject")
            .text_body("the body")
            .attachments([&a, &b])
            .build()
            .unwrap();

        let parsed = Message::parse(&message.to_string()).unwrap();
        assert_eq!(parsed.parts().len(), 3);

        let attachments = parsed.attachments().unwrap();
        assert_eq!(attachments.len(), 2);
        assert_eq!(attachments[0].filename(), "a.txt");
        assert_eq!(attachments[0].content(), b"first");
        assert_eq!(attachments[1].filename(), "b.bin");
        assert_eq!(attachments[1].content(), &[0, 159, 146, 150, 255]);
    }

    #[test]
    fn test_missing_attachment_fails() {
        let dir = tempfile::tempdir().unwrap();
        let present = write_file(dir.path(), "present.txt", b"ok");
        let missing = dir.path().join("missing.txt");

        let result = MessageBuilder::new()
            .from(FROM)
            .to(TO)
            .attach(present)
            .attach(missing.clone())
            .build();

        match result {
            Err(Error::ResourceNotFound { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected ResourceNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_in_memory_attachment() {
        let message = MessageBuilder::new()
            .from(FROM)
            .to(TO)
            .attach(Attachment::new("inline.csv", "a,b\n1,2\n"))
            .build()
            .unwrap();

        let parsed = Message::parse(&message.to_string()).unwrap();
        assert_eq!(parsed.attachments().unwrap()[0].content(), b"a,b\n1,2\n");
    }

    #[test]
    fn test_non_ascii_subject_and_body() {
        let message = MessageBuilder::new()
            .from(FROM)
            .to(TO)
            .subject("Grüße")
            .text_body("Ça va? ✓")
            .build()
            .unwrap();

        let raw = message.to_string();
        assert!(raw.is_ascii());

        let parsed = Message::parse(&raw).unwrap();
        assert_eq!(parsed.decoded_subject().unwrap().as_deref(), Some("Grüße"));
        assert_eq!(parsed.body_text().unwrap(), "Ça va? ✓");
    }

    #[test]
    fn test_fixed_date() {
        let date = DateTime::parse_from_rfc2822("Tue, 1 Jul 2003 10:52:37 +0200").unwrap();
        let message = MessageBuilder::new().from(FROM).to(TO).date(date).build().unwrap();
        assert_eq!(message.date(), Some("Tue, 1 Jul 2003 10:52:37 +0200"));
    }
}
