//! Messages handed to [`Mailer::send`](crate::Mailer::send).

use crate::envelope::Envelope;
use mailer_mime::{AddressList, AttachmentSource, MessageBuilder};

/// An email message to send.
///
/// Recipients, CC and BCC accept a single address or any list of addresses;
/// attachments accept a single path or in-memory attachment, or a list.
///
/// ```ignore
/// let message = OutgoingMessage::new(["a@example.com", "b@example.com"], "Report", "See attached.")
///     .cc("boss@example.com")
///     .attach("report.pdf");
/// ```
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    to: AddressList,
    cc: AddressList,
    bcc: AddressList,
    subject: String,
    body: String,
    attachments: Vec<AttachmentSource>,
    mail_as: Option<String>,
}

impl OutgoingMessage {
    /// Creates a new outgoing message.
    #[must_use]
    pub fn new(
        to: impl Into<AddressList>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            cc: AddressList::new(),
            bcc: AddressList::new(),
            subject: subject.into(),
            body: body.into(),
            attachments: Vec::new(),
            mail_as: None,
        }
    }

    /// Sends as `sender` instead of the session username.
    ///
    /// The address becomes both the envelope sender and the `From` header.
    #[must_use]
    pub fn mail_as(mut self, sender: impl Into<String>) -> Self {
        self.mail_as = Some(sender.into());
        self
    }

    /// Adds CC recipients.
    #[must_use]
    pub fn cc(mut self, recipients: impl Into<AddressList>) -> Self {
        self.cc.extend::<AddressList>(recipients.into());
        self
    }

    /// Adds BCC recipients.
    #[must_use]
    pub fn bcc(mut self, recipients: impl Into<AddressList>) -> Self {
        self.bcc.extend::<AddressList>(recipients.into());
        self
    }

    /// Appends an attachment.
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

    /// Direct recipients.
    #[must_use]
    pub const fn to(&self) -> &AddressList {
        &self.to
    }

    /// CC recipients.
    #[must_use]
    pub const fn cc_list(&self) -> &AddressList {
        &self.cc
    }

    /// BCC recipients.
    #[must_use]
    pub const fn bcc_list(&self) -> &AddressList {
        &self.bcc
    }

    /// Subject line.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Plain text body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Attachments, in order.
    #[must_use]
    pub fn attachment_sources(&self) -> &[AttachmentSource] {
        &self.attachments
    }

    /// The sender override, if one was set.
    #[must_use]
    pub fn sender(&self) -> Option<&str> {
        self.mail_as.as_deref()
    }

    /// Resolves the sender, falling back to `default_sender`.
    fn sender_or<'a>(&'a self, default_sender: &'a str) -> &'a str {
        self.mail_as.as_deref().unwrap_or(default_sender)
    }

    /// Returns a [`MessageBuilder`] holding this message's fields.
    #[must_use]
    pub fn builder(&self, default_sender: &str) -> MessageBuilder {
        MessageBuilder::new()
            .from(self.sender_or(default_sender))
            .to(self.to.clone())
            .cc(self.cc.clone())
            .bcc(self.bcc.clone())
            .subject(self.subject.clone())
            .text_body(self.body.clone())
            .attachments(self.attachments.iter().cloned())
    }

    /// Returns the envelope: the resolved sender, then `to ++ cc ++ bcc`.
    #[must_use]
    pub fn envelope(&self, default_sender: &str) -> Envelope {
        Envelope::new(
            self.sender_or(default_sender),
            &self.to,
            &self.cc,
            &self.bcc,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mailer_mime::Attachment;

    #[test]
    fn test_sender_defaults_to_session_user() {
        let message = OutgoingMessage::new("to@example.com", "Hi", "Body");
        assert_eq!(message.sender(), None);
        assert_eq!(message.envelope("me@example.com").sender, "me@example.com");

        let message = message.mail_as("alias@example.com");
        assert_eq!(message.envelope("me@example.com").sender, "alias@example.com");
    }

    #[test]
    fn test_envelope_includes_bcc() {
        let message = OutgoingMessage::new(["a@example.com", "b@example.com"], "Hi", "Body")
            .cc("c@example.com")
            .bcc(vec!["d@example.com".to_string(), "a@example.com".to_string()]);

        assert_eq!(
            message.envelope("me@example.com").recipients,
            [
                "a@example.com",
                "b@example.com",
                "c@example.com",
                "d@example.com",
                "a@example.com"
            ]
        );
    }

    #[test]
    fn test_builder_uses_resolved_sender() {
        let raw = OutgoingMessage::new("to@example.com", "Hi", "Body")
            .mail_as("alias@example.com")
            .builder("me@example.com")
            .build()
            .unwrap()
            .to_string();

        assert!(raw.contains("From: alias@example.com\r\n"));
        assert!(raw.contains("To: to@example.com\r\n"));
    }

    #[test]
    fn test_single_and_list_attachments() {
        let message = OutgoingMessage::new("to@example.com", "Hi", "Body")
            .attach(Attachment::new("a.txt", "a"))
            .attachments([Attachment::new("b.txt", "b"), Attachment::new("c.txt", "c")]);

        assert_eq!(message.attachment_sources().len(), 3);
        let parsed = mailer_mime::Message::parse(
            &message.builder("me@example.com").build().unwrap().to_string(),
        )
        .unwrap();
        let names: Vec<_> = parsed
            .attachments()
            .unwrap()
            .iter()
            .map(|attachment| attachment.filename().to_string())
            .collect();
        assert_eq!(names, ["a.txt", "b.txt", "c.txt"]);
    }
}
