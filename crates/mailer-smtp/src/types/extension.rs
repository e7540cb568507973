//! SMTP service extensions advertised in the EHLO reply.

/// SMTP extensions discovered from EHLO response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// STARTTLS - TLS upgrade
    StartTls,
    /// AUTH - Authentication, with the mechanisms this client can use
    Auth(Vec<AuthMechanism>),
    /// SIZE - Maximum message size
    Size(Option<usize>),
    /// 8BITMIME - 8-bit MIME transport
    EightBitMime,
    /// SMTPUTF8 - UTF-8 envelope addresses
    SmtpUtf8,
    /// Anything else, kept verbatim
    Unknown(String),
}

impl Extension {
    /// Parses an extension line from EHLO response.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let Some(keyword) = words.next() else {
            return Self::Unknown(line.to_string());
        };

        match keyword.to_uppercase().as_str() {
            "STARTTLS" => Self::StartTls,
            "AUTH" => Self::Auth(words.filter_map(AuthMechanism::parse).collect()),
            "SIZE" => Self::Size(words.next().and_then(|s| s.parse().ok())),
            "8BITMIME" => Self::EightBitMime,
            "SMTPUTF8" => Self::SmtpUtf8,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// SASL authentication mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMechanism {
    /// PLAIN - single-step username/password (RFC 4616)
    Plain,
    /// LOGIN - legacy two-step username/password
    Login,
}

impl AuthMechanism {
    /// Parses an authentication mechanism name.
    ///
    /// Mechanisms this client cannot perform yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PLAIN" => Some(Self::Plain),
            "LOGIN" => Some(Self::Login),
            _ => None,
        }
    }

    /// Returns the mechanism name as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod extension_parse_tests {
        use super::*;

        #[test]
        fn parse_starttls() {
            assert_eq!(Extension::parse("STARTTLS"), Extension::StartTls);
        }

        #[test]
        fn parse_starttls_lowercase() {
            assert_eq!(Extension::parse("starttls"), Extension::StartTls);
        }

        #[test]
        fn parse_auth_mechanisms() {
            assert_eq!(
                Extension::parse("AUTH PLAIN LOGIN"),
                Extension::Auth(vec![AuthMechanism::Plain, AuthMechanism::Login])
            );
        }

        #[test]
        fn parse_auth_skips_unusable() {
            assert_eq!(
                Extension::parse("AUTH XOAUTH2 LOGIN CRAM-MD5"),
                Extension::Auth(vec![AuthMechanism::Login])
            );
        }

        #[test]
        fn parse_size_with_value() {
            assert_eq!(
                Extension::parse("SIZE 52428800"),
                Extension::Size(Some(52_428_800))
            );
        }

        #[test]
        fn parse_size_without_value() {
            assert_eq!(Extension::parse("SIZE"), Extension::Size(None));
        }

        #[test]
        fn parse_8bitmime() {
            assert_eq!(Extension::parse("8BITMIME"), Extension::EightBitMime);
        }

        #[test]
        fn parse_smtputf8() {
            assert_eq!(Extension::parse("SMTPUTF8"), Extension::SmtpUtf8);
        }

        #[test]
        fn parse_unknown() {
            assert_eq!(
                Extension::parse("PIPELINING"),
                Extension::Unknown("PIPELINING".to_string())
            );
        }

        #[test]
        fn parse_empty() {
            assert!(matches!(Extension::parse(""), Extension::Unknown(_)));
        }
    }

    mod auth_mechanism_tests {
        use super::*;

        #[test]
        fn parse_plain() {
            assert_eq!(AuthMechanism::parse("PLAIN"), Some(AuthMechanism::Plain));
            assert_eq!(AuthMechanism::parse("plain"), Some(AuthMechanism::Plain));
        }

        #[test]
        fn parse_login() {
            assert_eq!(AuthMechanism::parse("LOGIN"), Some(AuthMechanism::Login));
        }

        #[test]
        fn parse_unknown() {
            assert_eq!(AuthMechanism::parse("GSSAPI"), None);
        }

        #[test]
        fn as_str() {
            assert_eq!(AuthMechanism::Plain.as_str(), "PLAIN");
            assert_eq!(AuthMechanism::Login.as_str(), "LOGIN");
        }
    }
}
