//! SMTP reply types.

use std::fmt;

/// SMTP reply from server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code (e.g., 250).
    pub code: ReplyCode,
    /// Reply text, one entry per line.
    pub message: Vec<String>,
}

impl Reply {
    /// Creates a new reply.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec is not const-compatible
    pub fn new(code: ReplyCode, message: Vec<String>) -> Self {
        Self { code, message }
    }

    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient_error(&self) -> bool {
        self.code.is_transient()
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent_error(&self) -> bool {
        self.code.is_permanent()
    }

    /// Returns the full message as a single string.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.message.join("\n")
    }

    /// Converts a non-2xx reply into [`crate::Error::SmtpError`].
    ///
    /// # Errors
    ///
    /// Returns the reply as an error unless it is a success reply.
    pub fn into_success(self) -> crate::Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Converts the reply into an error carrying its code and text.
    #[must_use]
    pub fn into_error(self) -> crate::Error {
        crate::Error::smtp_error(self.code.as_u16(), self.message_text())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message.join(" "))
    }
}

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is an intermediate reply (3xx).
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Codes the client checks for
impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 235 Authentication succeeded
    pub const AUTH_SUCCESS: Self = Self(235);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 334 Continue with authentication
    pub const AUTH_CONTINUE: Self = Self(334);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);
    /// 421 Service not available, closing transmission channel
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// 450 Mailbox unavailable (busy)
    pub const MAILBOX_BUSY: Self = Self(450);
    /// 500 Syntax error, command unrecognized
    pub const SYNTAX_ERROR: Self = Self(500);
    /// 502 Command not implemented
    pub const NOT_IMPLEMENTED: Self = Self(502);
    /// 535 Authentication credentials invalid
    pub const AUTH_FAILED: Self = Self(535);
    /// 550 Mailbox unavailable (not found, access denied)
    pub const MAILBOX_UNAVAILABLE: Self = Self(550);
    /// 552 Exceeded storage allocation
    pub const EXCEEDED_STORAGE: Self = Self(552);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod reply_code_tests {
        use super::*;

        #[test]
        fn success_codes() {
            assert!(ReplyCode::OK.is_success());
            assert!(ReplyCode::SERVICE_READY.is_success());
            assert!(ReplyCode::CLOSING.is_success());
            assert!(ReplyCode::AUTH_SUCCESS.is_success());
        }

        #[test]
        fn intermediate_codes() {
            assert!(ReplyCode::AUTH_CONTINUE.is_intermediate());
            assert!(ReplyCode::START_DATA.is_intermediate());
            assert!(!ReplyCode::START_DATA.is_success());
        }

        #[test]
        fn transient_errors() {
            assert!(ReplyCode::MAILBOX_BUSY.is_transient());
            assert!(ReplyCode::SERVICE_UNAVAILABLE.is_transient());
        }

        #[test]
        fn permanent_errors() {
            assert!(ReplyCode::MAILBOX_UNAVAILABLE.is_permanent());
            assert!(ReplyCode::SYNTAX_ERROR.is_permanent());
            assert!(ReplyCode::NOT_IMPLEMENTED.is_permanent());
            assert!(ReplyCode::AUTH_FAILED.is_permanent());
            assert!(ReplyCode::EXCEEDED_STORAGE.is_permanent());
        }

        #[test]
        fn display() {
            assert_eq!(format!("{}", ReplyCode::OK), "250");
            assert_eq!(format!("{}", ReplyCode::SYNTAX_ERROR), "500");
        }

        #[test]
        fn ordering() {
            assert!(ReplyCode::OK < ReplyCode::MAILBOX_BUSY);
            assert!(ReplyCode::MAILBOX_BUSY < ReplyCode::MAILBOX_UNAVAILABLE);
        }
    }

    mod reply_tests {
        use super::*;
        use crate::Error;

        #[test]
        fn is_success() {
            let reply = Reply::new(ReplyCode::OK, vec!["OK".to_string()]);
            assert!(reply.is_success());
            assert!(!reply.is_transient_error());
            assert!(!reply.is_permanent_error());
        }

        #[test]
        fn message_text_multiple_lines() {
            let reply = Reply::new(
                ReplyCode::SERVICE_READY,
                vec![
                    "smtp.example.com ESMTP".to_string(),
                    "Ready to serve".to_string(),
                ],
            );
            assert_eq!(
                reply.message_text(),
                "smtp.example.com ESMTP\nReady to serve"
            );
        }

        #[test]
        fn message_text_empty() {
            let reply = Reply::new(ReplyCode::OK, vec![]);
            assert_eq!(reply.message_text(), "");
        }

        #[test]
        fn into_success_passes_2xx() {
            let reply = Reply::new(ReplyCode::OK, vec!["OK".to_string()]);
            assert_eq!(reply.clone().into_success().unwrap(), reply);
        }

        #[test]
        fn into_success_rejects_others() {
            let reply = Reply::new(ReplyCode::AUTH_FAILED, vec!["Bad credentials".to_string()]);
            match reply.into_success() {
                Err(Error::SmtpError { code, message }) => {
                    assert_eq!(code, 535);
                    assert_eq!(message, "Bad credentials");
                }
                other => panic!("expected SmtpError, got {other:?}"),
            }
        }

        #[test]
        fn display() {
            let reply = Reply::new(ReplyCode::OK, vec!["a".to_string(), "b".to_string()]);
            assert_eq!(reply.to_string(), "250 a b");
        }
    }
}
