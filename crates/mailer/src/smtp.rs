//! [`Transport`] over the `mailer-smtp` client.
//!
//! The client is async; each connection owns a current-thread tokio runtime
//! and every protocol step is driven to completion with `block_on` under a
//! timeout. Do not call these methods from inside another tokio runtime.

use crate::config::{Config, Endpoint};
use crate::envelope::Envelope;
use crate::transport::{Transport, TransportError};
use mailer_smtp::connection::connect;
use mailer_smtp::{Address, Authenticated, Client, Connected};
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

/// Production transport: SMTP submission with STARTTLS.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    client_hostname: String,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl SmtpTransport {
    /// Creates a transport using the hostname and timeouts from `config`.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            client_hostname: config.client_hostname.clone(),
            connect_timeout: config.connect_timeout,
            io_timeout: config.io_timeout,
        }
    }
}

impl Default for SmtpTransport {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

/// Where the SMTP client is in its login sequence.
#[derive(Debug)]
enum ClientState {
    Connected(Client<Connected>),
    Authenticated(Client<Authenticated>),
    /// A step consumed the client and failed.
    Broken,
}

/// Live SMTP connection.
///
/// Dropping it closes the socket without `QUIT`.
#[derive(Debug)]
pub struct SmtpConnection {
    runtime: Runtime,
    client: ClientState,
    io_timeout: Duration,
}

impl SmtpConnection {
    /// Returns true once STARTTLS has succeeded.
    #[must_use]
    pub const fn is_encrypted(&self) -> bool {
        match &self.client {
            ClientState::Connected(client) => client.is_encrypted(),
            ClientState::Authenticated(client) => client.is_encrypted(),
            ClientState::Broken => false,
        }
    }

    fn run<F, T>(&self, fut: F) -> Result<T, TransportError>
    where
        F: Future<Output = mailer_smtp::Result<T>>,
    {
        block_on(&self.runtime, self.io_timeout, fut)
    }

    fn take_connected(&mut self, step: &str) -> Result<Client<Connected>, TransportError> {
        match std::mem::replace(&mut self.client, ClientState::Broken) {
            ClientState::Connected(client) => Ok(client),
            other => {
                self.client = other;
                Err(TransportError::new(format!(
                    "{step} is only possible before login"
                )))
            }
        }
    }
}

/// Runs `fut` to completion on `runtime`, failing after `limit`.
fn block_on<F, T>(runtime: &Runtime, limit: Duration, fut: F) -> Result<T, TransportError>
where
    F: Future<Output = mailer_smtp::Result<T>>,
{
    runtime
        .block_on(async { tokio::time::timeout(limit, fut).await })
        .map_err(|_| TransportError::new(format!("timed out after {limit:?}")))?
        .map_err(TransportError::from)
}

fn parse_address(address: &str) -> Result<Address, TransportError> {
    Address::new(address).map_err(TransportError::from)
}

impl Transport for SmtpTransport {
    type Connection = SmtpConnection;

    fn connect(&mut self, endpoint: &Endpoint) -> Result<SmtpConnection, TransportError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TransportError::new(format!("failed to start I/O runtime: {e}")))?;

        tracing::debug!(%endpoint, "Connecting");
        let client = block_on(&runtime, self.connect_timeout, async {
            let stream = connect(&endpoint.host, endpoint.port).await?;
            Client::from_stream(stream).await
        })?;
        let client = block_on(
            &runtime,
            self.io_timeout,
            client.ehlo(&self.client_hostname),
        )?;

        Ok(SmtpConnection {
            runtime,
            client: ClientState::Connected(client),
            io_timeout: self.io_timeout,
        })
    }

    fn starttls(&mut self, conn: &mut SmtpConnection, host: &str) -> Result<(), TransportError> {
        let client = conn.take_connected("STARTTLS")?;
        let client = conn.run(client.starttls(host))?;
        tracing::debug!(host, "TLS established");
        conn.client = ClientState::Connected(client);
        Ok(())
    }

    fn login(
        &mut self,
        conn: &mut SmtpConnection,
        username: &str,
        password: &str,
    ) -> Result<(), TransportError> {
        let client = conn.take_connected("AUTH")?;
        let client = conn.run(client.auth(username, password))?;
        conn.client = ClientState::Authenticated(client);
        Ok(())
    }

    fn send_mail(
        &mut self,
        conn: &mut SmtpConnection,
        envelope: &Envelope,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        let from = parse_address(&envelope.sender)?;
        let to = envelope
            .recipients
            .iter()
            .map(|rcpt| parse_address(rcpt))
            .collect::<Result<Vec<_>, _>>()?;

        let ClientState::Authenticated(client) = &mut conn.client else {
            return Err(TransportError::new("not logged in"));
        };
        block_on(&conn.runtime, conn.io_timeout, client.send_mail(&from, &to, payload))
    }

    fn disconnect(&mut self, conn: SmtpConnection) -> Result<(), TransportError> {
        let SmtpConnection {
            runtime,
            client,
            io_timeout,
        } = conn;

        match client {
            ClientState::Connected(client) => block_on(&runtime, io_timeout, client.quit()),
            ClientState::Authenticated(client) => block_on(&runtime, io_timeout, client.quit()),
            ClientState::Broken => Ok(()),
        }
    }
}
