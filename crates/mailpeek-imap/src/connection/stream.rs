//! Blocking stream types for IMAP connections.

#![allow(clippy::missing_errors_doc)]

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, StreamOwned};
use tracing::debug;

use super::config::{Config, Security};
use crate::Result;

/// A stream that can be either plaintext or TLS.
#[derive(Debug)]
pub enum ImapStream {
    /// Plaintext TCP stream.
    Plain(TcpStream),
    /// TLS-encrypted stream (boxed to reduce enum size).
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl ImapStream {
    /// Returns true if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    fn tcp(&self) -> &TcpStream {
        match self {
            Self::Plain(tcp) => tcp,
            Self::Tls(tls) => &tls.sock,
        }
    }

    /// Changes the per-operation read/write timeout.
    pub fn set_io_timeout(&self, timeout: Duration) -> Result<()> {
        set_timeouts(self.tcp(), timeout)
    }
}

impl Read for ImapStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf),
            Self::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for ImapStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.write(buf),
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.flush(),
            Self::Tls(stream) => stream.flush(),
        }
    }
}

/// Creates a TLS client configuration trusting the Mozilla root store.
#[must_use]
pub fn create_tls_config() -> Arc<ClientConfig> {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}

/// Connects according to the configured security mode.
pub fn connect(config: &Config) -> Result<ImapStream> {
    match config.security {
        Security::Implicit => connect_tls(config),
        Security::None => connect_plain(config),
    }
}

/// Connects to a server with TLS from the start.
///
/// The TCP connect and the TLS handshake are each bounded by
/// `connect_timeout`, which stays on the socket so the greeting is bounded
/// too. Call [`ImapStream::set_io_timeout`] once the greeting is in.
pub fn connect_tls(config: &Config) -> Result<ImapStream> {
    let server_name = ServerName::try_from(config.host.clone())?;

    let mut tcp = open_tcp(config)?;
    set_timeouts(&tcp, config.connect_timeout)?;

    let mut conn = ClientConnection::new(create_tls_config(), server_name)?;
    while conn.is_handshaking() {
        conn.complete_io(&mut tcp)?;
    }
    debug!(host = %config.host, "TLS handshake complete");

    Ok(ImapStream::Tls(Box::new(StreamOwned::new(conn, tcp))))
}

/// Connects to a server without TLS (for testing against local servers).
///
/// Reads and writes are bounded by `connect_timeout` until
/// [`ImapStream::set_io_timeout`] is called.
pub fn connect_plain(config: &Config) -> Result<ImapStream> {
    let tcp = open_tcp(config)?;
    set_timeouts(&tcp, config.connect_timeout)?;
    Ok(ImapStream::Plain(tcp))
}

/// Resolves the host and connects to the first address that accepts.
fn open_tcp(config: &Config) -> Result<TcpStream> {
    let mut last_err = None;

    for addr in (config.host.as_str(), config.port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, config.connect_timeout) {
            Ok(tcp) => {
                debug!(host = %config.host, %addr, "TCP connected");
                tcp.set_nodelay(true)?;
                return Ok(tcp);
            }
            Err(e) => {
                debug!(host = %config.host, %addr, error = %e, "TCP connect failed");
                last_err = Some(e);
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses found for {}", config.host),
            )
        })
        .into())
}

fn set_timeouts(tcp: &TcpStream, timeout: Duration) -> Result<()> {
    tcp.set_read_timeout(Some(timeout))?;
    tcp.set_write_timeout(Some(timeout))?;
    Ok(())
}
