//! Session configuration types.

use crate::error::{Error, Result};
use mailer_smtp::SUBMISSION_PORT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Relay used when none is given.
pub const DEFAULT_ENDPOINT: &str = "smtp.gmail.com:587";

/// Relay address: host plus port.
///
/// Parsed from `"host:port"`; a bare host gets the submission port (587).
/// IPv6 literals are written in brackets, `"[::1]:587"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint {
    /// Hostname or IP literal, without brackets.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// Creates an endpoint from parts.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parses `"host:port"` or a bare `"host"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] for an empty host or a port that is
    /// not a number in `1..=65535`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = |why: &str| Error::InvalidEndpoint(format!("{s:?}: {why}"));

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, after) = rest
                .split_once(']')
                .ok_or_else(|| invalid("unclosed '['"))?;
            match after {
                "" => (host, None),
                _ => (
                    host,
                    Some(after.strip_prefix(':').ok_or_else(|| invalid("expected ':' after ']'"))?),
                ),
            }
        } else {
            match s.rsplit_once(':') {
                Some((host, _)) if host.contains(':') => {
                    return Err(invalid("IPv6 addresses must be bracketed"));
                }
                Some((host, port)) => (host, Some(port)),
                None => (s, None),
            }
        };

        if host.is_empty() {
            return Err(invalid("empty host"));
        }

        let port = match port {
            None => SUBMISSION_PORT,
            Some(port) => port
                .parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| invalid("port must be a number in 1..=65535"))?,
        };

        Ok(Self::new(host, port))
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new("smtp.gmail.com", SUBMISSION_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Endpoint {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_string()
    }
}

/// Login credentials.
///
/// `Debug` output never shows the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Username; also the default sender address.
    pub username: String,
    /// Password or app password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Mail session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Relay to connect to.
    pub endpoint: Endpoint,
    /// Name announced in EHLO.
    pub client_hostname: String,
    /// Limit for connecting and reading the greeting.
    #[serde(with = "secs")]
    pub connect_timeout: Duration,
    /// Limit for each later protocol step.
    #[serde(with = "secs")]
    pub io_timeout: Duration,
}

impl Config {
    /// Creates a configuration with default timeouts.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(endpoint: Endpoint) -> ConfigBuilder {
        ConfigBuilder::new(endpoint)
    }

    /// Loads a configuration from JSON.
    ///
    /// Missing fields take their defaults; timeouts are whole seconds.
    ///
    /// ```ignore
    /// let config = Config::from_json(r#"{"endpoint": "smtp.example.com:2525", "io_timeout": 10}"#)?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the JSON is malformed or the endpoint is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            client_hostname: "localhost".to_string(),
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(60),
        }
    }
}

/// Builder for session configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder for the given relay.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            config: Config::new(endpoint),
        }
    }

    /// Sets the name announced in EHLO.
    #[must_use]
    pub fn client_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.config.client_hostname = hostname.into();
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the I/O timeout.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.config.io_timeout = timeout;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }
}

/// Serializes a `Duration` as whole seconds.
mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
