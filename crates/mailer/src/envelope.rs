//! SMTP envelope: who the relay delivers to, independent of headers.

use mailer_mime::AddressList;

/// Envelope sender and delivery list handed to a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Envelope sender (`MAIL FROM`).
    pub sender: String,
    /// Delivery list (`RCPT TO`), in order.
    pub recipients: Vec<String>,
}

impl Envelope {
    /// Creates an envelope delivering to `to`, then `cc`, then `bcc`.
    ///
    /// Duplicates are kept; the relay decides what to do with them.
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        to: &AddressList,
        cc: &AddressList,
        bcc: &AddressList,
    ) -> Self {
        let recipients = to
            .iter()
            .chain(cc.iter())
            .chain(bcc.iter())
            .map(str::to_string)
            .collect();

        Self {
            sender: sender.into(),
            recipients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_order() {
        let envelope = Envelope::new(
            "me@example.com",
            &["a@example.com", "b@example.com"].into(),
            &"c@example.com".into(),
            &"d@example.com".into(),
        );

        assert_eq!(envelope.sender, "me@example.com");
        assert_eq!(
            envelope.recipients,
            ["a@example.com", "b@example.com", "c@example.com", "d@example.com"]
        );
    }

    #[test]
    fn test_duplicates_kept() {
        let envelope = Envelope::new(
            "me@example.com",
            &"a@example.com".into(),
            &"a@example.com".into(),
            &AddressList::default(),
        );

        assert_eq!(envelope.recipients, ["a@example.com", "a@example.com"]);
    }
}
