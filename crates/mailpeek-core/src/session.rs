//! Mail session with host fallback.
//!
//! A [`MailSession`] owns at most one authenticated transport. Every
//! blocking protocol call is moved onto tokio's blocking pool together with
//! the transport, which comes back when the call returns.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, spawn_blocking};
use tracing::{debug, info, warn};

use crate::credentials::Credentials;
use crate::decoder::{MessageRecord, decode_message};
use crate::error::{Error, ProtocolStateError, Result, TransportError};
use crate::hosts::HostTable;
use crate::settings::{DEFAULT_LIMIT, DEFAULT_PORT, Settings};
use crate::transport::{Connector, FetchMode, ImapConnector, Transport};

/// Default per-host connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters of one [`MailSession::fetch_messages`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Mailbox to read.
    pub mailbox: String,
    /// IMAP search keys, sent verbatim.
    pub criteria: String,
    /// Maximum number of messages, newest kept.
    pub limit: usize,
    /// Fetch with `RFC822` and open the mailbox read-write.
    pub mark_seen: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            mailbox: "INBOX".to_string(),
            criteria: "ALL".to_string(),
            limit: DEFAULT_LIMIT,
            mark_seen: false,
        }
    }
}

impl FetchOptions {
    /// Options with the defaults: `INBOX`, `ALL`, 50, peek.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the mailbox.
    #[must_use]
    pub fn mailbox(mut self, mailbox: impl Into<String>) -> Self {
        self.mailbox = mailbox.into();
        self
    }

    /// Sets the search criteria.
    #[must_use]
    pub fn criteria(mut self, criteria: impl Into<String>) -> Self {
        self.criteria = criteria.into();
        self
    }

    /// Sets the limit.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets whether fetched messages get marked seen.
    #[must_use]
    pub const fn mark_seen(mut self, mark_seen: bool) -> Self {
        self.mark_seen = mark_seen;
        self
    }

    const fn fetch_mode(&self) -> FetchMode {
        if self.mark_seen {
            FetchMode::MarkSeen
        } else {
            FetchMode::Peek
        }
    }
}

/// Result of one fetch: messages newest first, plus the number of selected
/// messages that could not be retrieved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBatch {
    /// Decoded messages, newest first.
    pub messages: Vec<MessageRecord>,
    /// Messages skipped because the server refused them or sent no body.
    pub skipped: usize,
}

impl MessageBatch {
    /// Number of decoded messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when no message was decoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Result of a call on a live transport that did not break the connection.
enum Outcome<T> {
    Done(T),
    Rejected(String),
}

/// Long-lived mail session for one set of credentials.
pub struct MailSession<C: Connector = ImapConnector> {
    credentials: Credentials,
    hosts: Arc<HostTable>,
    connector: Arc<C>,
    port: u16,
    connect_timeout: Duration,
    transport: Option<C::Transport>,
    connected_host: Option<String>,
}

impl<C: Connector> std::fmt::Debug for MailSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailSession")
            .field("credentials", &self.credentials)
            .field("port", &self.port)
            .field("connect_timeout", &self.connect_timeout)
            .field("connected_host", &self.connected_host())
            .finish_non_exhaustive()
    }
}

impl MailSession<ImapConnector> {
    /// Session over IMAP configured from `settings`.
    #[must_use]
    pub fn from_settings(credentials: Credentials, settings: &Settings) -> Self {
        let connector = ImapConnector::new().io_timeout(settings.io_timeout());
        Self::new(credentials, connector)
            .with_hosts(Arc::new(settings.host_table()))
            .with_port(settings.port)
            .with_connect_timeout(settings.connect_timeout())
    }
}

impl<C: Connector> MailSession<C> {
    /// Creates a disconnected session using the built-in host table.
    #[must_use]
    pub fn new(credentials: Credentials, connector: C) -> Self {
        Self {
            credentials,
            hosts: Arc::new(HostTable::builtin()),
            connector: Arc::new(connector),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            transport: None,
            connected_host: None,
        }
    }

    /// Uses a different host table.
    #[must_use]
    pub fn with_hosts(mut self, hosts: Arc<HostTable>) -> Self {
        self.hosts = hosts;
        self
    }

    /// Uses a different port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Uses a different per-host connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// The credentials this session logs in with.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Host the session is bound to, if established.
    #[must_use]
    pub fn connected_host(&self) -> Option<&str> {
        self.transport.as_ref().and(self.connected_host.as_deref())
    }

    /// True while a session is established.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Hosts that [`connect`](Self::connect) will try, in order.
    #[must_use]
    pub fn candidate_hosts(&self) -> Vec<String> {
        self.hosts.candidates(self.credentials.domain())
    }

    /// Connects and logs in, trying each candidate host in order.
    ///
    /// An existing session is torn down first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] naming every host tried when none
    /// accepted both the connection and the login.
    pub async fn connect(&mut self) -> Result<()> {
        if self.transport.is_some() {
            self.disconnect().await;
        }

        let candidates = self.candidate_hosts();
        let mut last_cause = "no candidate hosts".to_string();

        for host in &candidates {
            let attempt = Self::open_and_login(
                Arc::clone(&self.connector),
                self.credentials.clone(),
                host.clone(),
                self.port,
                self.connect_timeout,
            );
            match attempt.await {
                Ok(transport) => {
                    info!(host = %host, address = %self.credentials.address(), "logged in");
                    self.transport = Some(transport);
                    self.connected_host = Some(host.clone());
                    return Ok(());
                }
                Err(TransportError::Rejected(reason)) => {
                    debug!(host = %host, %reason, "login rejected, trying next host");
                    last_cause = format!("{host}: login rejected: {reason}");
                }
                Err(TransportError::Connection(reason)) => {
                    debug!(host = %host, %reason, "connection failed, trying next host");
                    last_cause = format!("{host}: {reason}");
                }
            }
        }

        Err(Error::Authentication {
            address: self.credentials.address().to_string(),
            hosts: candidates,
            cause: last_cause,
        })
    }

    /// Opens a transport to `host` and logs in, closing it again if the
    /// login is refused.
    async fn open_and_login(
        connector: Arc<C>,
        credentials: Credentials,
        host: String,
        port: u16,
        timeout: Duration,
    ) -> std::result::Result<C::Transport, TransportError> {
        let target = host.clone();
        let transport = spawn_blocking(move || connector.open(&target, port, timeout))
            .await
            .map_err(worker_failed)??;

        let login = move |t: &mut C::Transport| t.login(credentials.address(), credentials.secret());

        match on_worker(transport, login).await {
            Ok((transport, Ok(()))) => Ok(transport),
            Ok((transport, Err(TransportError::Rejected(reason)))) => {
                let logout = |t: &mut C::Transport| t.logout();
                if let Ok((_, Err(e))) = on_worker(transport, logout).await {
                    debug!(host = %host, error = %e, "logout after refused login failed");
                }
                Err(TransportError::Rejected(reason))
            }
            Ok((_, Err(e))) => Err(e),
            Err(e) => Err(worker_failed(e)),
        }
    }

    /// Searches a mailbox and fetches the newest matching messages.
    ///
    /// The mailbox is opened read-only unless `mark_seen` is set. Messages
    /// the server refuses or returns empty are skipped and counted.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolStateError::NotConnected`] without touching the
    /// network when no session is established,
    /// [`ProtocolStateError::MailboxSelection`] or
    /// [`ProtocolStateError::Search`] when the server refuses those steps,
    /// and [`ProtocolStateError::ConnectionLost`] when the connection drops;
    /// the session is closed in that case.
    pub async fn fetch_messages(&mut self, options: &FetchOptions) -> Result<MessageBatch> {
        if self.transport.is_none() {
            return Err(ProtocolStateError::NotConnected.into());
        }

        let mailbox = options.mailbox.clone();
        let read_only = !options.mark_seen;
        if let Outcome::Rejected(reason) = self
            .call(move |t| t.select(&mailbox, read_only))
            .await?
        {
            return Err(ProtocolStateError::MailboxSelection {
                mailbox: options.mailbox.clone(),
                reason,
            }
            .into());
        }

        let criteria = options.criteria.clone();
        let ids = match self.call(move |t| t.search(&criteria)).await? {
            Outcome::Done(ids) => ids,
            Outcome::Rejected(reason) => return Err(ProtocolStateError::Search(reason).into()),
        };

        let mut batch = MessageBatch::default();
        if ids.is_empty() || options.limit == 0 {
            debug!(mailbox = %options.mailbox, found = ids.len(), "nothing to fetch");
            return Ok(batch);
        }

        let newest = &ids[ids.len().saturating_sub(options.limit)..];
        let mode = options.fetch_mode();

        for &id in newest {
            match self.call(move |t| t.fetch(id, mode)).await? {
                Outcome::Done(raw) if !raw.is_empty() => {
                    batch.messages.push(decode_message(&raw));
                }
                Outcome::Done(_) => {
                    warn!(id, "empty message body, skipping");
                    batch.skipped += 1;
                }
                Outcome::Rejected(reason) => {
                    warn!(id, %reason, "fetch refused, skipping");
                    batch.skipped += 1;
                }
            }
        }

        batch.messages.reverse();
        info!(
            mailbox = %options.mailbox,
            fetched = batch.messages.len(),
            skipped = batch.skipped,
            "messages fetched"
        );
        Ok(batch)
    }

    /// Logs out and drops the session.
    ///
    /// Never fails; logout errors are logged. Safe to call at any time.
    pub async fn disconnect(&mut self) {
        let host = self.connected_host.take();
        let Some(transport) = self.transport.take() else {
            return;
        };

        match on_worker(transport, |t: &mut C::Transport| t.logout()).await {
            Ok((_, Ok(()))) => info!(host = host.as_deref().unwrap_or_default(), "logged out"),
            Ok((_, Err(e))) => warn!(error = %e, "logout failed"),
            Err(e) => warn!(error = %e, "logout worker failed"),
        }
    }

    /// Runs `op` on the transport in the blocking pool.
    ///
    /// A rejection leaves the session intact; anything else closes it.
    async fn call<T, F>(&mut self, op: F) -> Result<Outcome<T>>
    where
        T: Send + 'static,
        F: FnOnce(&mut C::Transport) -> std::result::Result<T, TransportError> + Send + 'static,
    {
        let transport = self
            .transport
            .take()
            .ok_or(ProtocolStateError::NotConnected)?;

        let reason = match on_worker(transport, op).await {
            Ok((transport, Ok(value))) => {
                self.transport = Some(transport);
                return Ok(Outcome::Done(value));
            }
            Ok((transport, Err(TransportError::Rejected(reason)))) => {
                self.transport = Some(transport);
                return Ok(Outcome::Rejected(reason));
            }
            Ok((_, Err(TransportError::Connection(reason)))) => reason,
            Err(e) => worker_failed(e).to_string(),
        };

        warn!(host = self.connected_host.as_deref().unwrap_or_default(), %reason, "connection lost");
        self.connected_host = None;
        Err(ProtocolStateError::ConnectionLost(reason).into())
    }
}

/// Moves `transport` into the blocking pool, runs `op`, and hands both back.
async fn on_worker<Tr, T, F>(
    mut transport: Tr,
    op: F,
) -> std::result::Result<(Tr, std::result::Result<T, TransportError>), JoinError>
where
    Tr: Transport,
    T: Send + 'static,
    F: FnOnce(&mut Tr) -> std::result::Result<T, TransportError> + Send + 'static,
{
    spawn_blocking(move || {
        let result = op(&mut transport);
        (transport, result)
    })
    .await
}

fn worker_failed(e: JoinError) -> TransportError {
    TransportError::Connection(format!("blocking worker failed: {e}"))
}
