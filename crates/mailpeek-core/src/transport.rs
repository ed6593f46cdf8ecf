//! Protocol capability seams.
//!
//! [`MailSession`](crate::MailSession) talks to servers only through these
//! traits. Implementations are blocking; the session moves them onto tokio's
//! blocking pool for every call.

use std::time::Duration;

use mailpeek_imap::connection::DEFAULT_IO_TIMEOUT;
use mailpeek_imap::{Client, Config, FetchAttribute, FetchItem, ImapStream, Security, SeqNum};
use tracing::debug;

use crate::error::TransportError;

/// How message bodies are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Leave the `\Seen` flag alone (`BODY.PEEK[]`).
    #[default]
    Peek,
    /// Fetch with `RFC822`, which marks the message seen.
    MarkSeen,
}

/// Opens transports to a host.
pub trait Connector: Send + Sync + 'static {
    /// Transport produced by this connector.
    type Transport: Transport;

    /// Connects to `host:port`, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Any failure is a [`TransportError::Connection`].
    fn open(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self::Transport, TransportError>;
}

/// A connected protocol session.
///
/// Methods return [`TransportError::Rejected`] when the server refuses a
/// command and [`TransportError::Connection`] when the session is broken.
#[allow(clippy::missing_errors_doc)]
pub trait Transport: Send + 'static {
    /// Logs in.
    fn login(&mut self, address: &str, secret: &str) -> Result<(), TransportError>;

    /// Opens a mailbox; read-only when `read_only` is set.
    fn select(&mut self, mailbox: &str, read_only: bool) -> Result<(), TransportError>;

    /// Returns matching message ids, ascending.
    fn search(&mut self, criteria: &str) -> Result<Vec<u32>, TransportError>;

    /// Returns the raw message; empty when the server sent no body.
    fn fetch(&mut self, id: u32, mode: FetchMode) -> Result<Vec<u8>, TransportError>;

    /// Logs out.
    fn logout(&mut self) -> Result<(), TransportError>;
}

/// Connector over implicit-TLS IMAP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImapConnector {
    security: Security,
    io_timeout: Duration,
}

impl Default for ImapConnector {
    fn default() -> Self {
        Self {
            security: Security::Implicit,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

impl ImapConnector {
    /// Creates a connector using implicit TLS.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read/write timeout applied once connected.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Sets the security mode. Plain connections are only useful in tests.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }
}

impl Connector for ImapConnector {
    type Transport = ImapTransport;

    fn open(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self::Transport, TransportError> {
        let config = Config::builder(host)
            .port(port)
            .security(self.security)
            .connect_timeout(timeout)
            .io_timeout(self.io_timeout)
            .build();

        // Nothing has been sent yet, so every failure here is connection-level.
        let client =
            Client::connect(&config).map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(ImapTransport { client })
    }
}

/// [`Transport`] backed by the blocking IMAP client.
#[derive(Debug)]
pub struct ImapTransport {
    client: Client<ImapStream>,
}

impl Transport for ImapTransport {
    fn login(&mut self, address: &str, secret: &str) -> Result<(), TransportError> {
        if self.client.login_disabled() {
            debug!("server advertises LOGINDISABLED; trying LOGIN anyway");
        }
        self.client.login(address, secret)?;
        Ok(())
    }

    fn select(&mut self, mailbox: &str, read_only: bool) -> Result<(), TransportError> {
        let status = if read_only {
            self.client.examine(mailbox)?
        } else {
            self.client.select(mailbox)?
        };
        debug!(mailbox, exists = status.exists, read_only = status.read_only, "mailbox open");
        Ok(())
    }

    fn search(&mut self, criteria: &str) -> Result<Vec<u32>, TransportError> {
        let ids = self.client.search(criteria)?;
        Ok(ids.into_iter().map(SeqNum::get).collect())
    }

    fn fetch(&mut self, id: u32, mode: FetchMode) -> Result<Vec<u8>, TransportError> {
        let seq = SeqNum::new(id)
            .ok_or_else(|| TransportError::Rejected("message id 0 is invalid".to_string()))?;
        let item = match mode {
            FetchMode::Peek => FetchAttribute::peek_full(),
            FetchMode::MarkSeen => FetchAttribute::Rfc822,
        };

        let items = self.client.fetch(seq, vec![item])?;
        Ok(items
            .into_iter()
            .find_map(|item| match item {
                FetchItem::Body { data, .. } => data,
                _ => None,
            })
            .unwrap_or_default())
    }

    fn logout(&mut self) -> Result<(), TransportError> {
        self.client.logout()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_peek() {
        assert_eq!(FetchMode::default(), FetchMode::Peek);
    }

    #[test]
    fn connector_defaults() {
        let connector = ImapConnector::new();
        assert_eq!(connector.security, Security::Implicit);
        assert_eq!(connector.io_timeout, DEFAULT_IO_TIMEOUT);
    }

    #[test]
    fn silent_server_fails_within_connect_timeout() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let connector = ImapConnector::new()
            .security(Security::None)
            .io_timeout(Duration::from_secs(30));

        let started = std::time::Instant::now();
        let result = connector.open("127.0.0.1", port, Duration::from_millis(300));

        assert!(matches!(result, Err(TransportError::Connection(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(listener);
    }

    #[test]
    fn unreachable_host_is_connection_error() {
        let connector = ImapConnector::new().security(Security::None);
        // Port 1 on loopback is closed on any sane test machine
        let result = connector.open("127.0.0.1", 1, Duration::from_secs(2));
        assert!(matches!(result, Err(TransportError::Connection(_))));
    }
}
