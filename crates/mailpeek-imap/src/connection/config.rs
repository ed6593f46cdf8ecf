//! Where and how to connect.

use std::time::Duration;

/// TCP connect plus TLS handshake budget.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per read or write, once connected.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(60);

/// Transport security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Cleartext, port 143. Local testing only.
    None,
    /// TLS from the first byte, port 993.
    #[default]
    Implicit,
}

impl Security {
    /// Well-known port for the mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 143,
            Self::Implicit => 993,
        }
    }
}

/// Resolved connection parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host name, also used for certificate verification.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Transport security.
    pub security: Security,
    /// Bound on TCP connect and TLS handshake.
    pub connect_timeout: Duration,
    /// Bound on each read or write once connected.
    pub io_timeout: Duration,
}

impl Config {
    /// Implicit TLS on 993 with the default timeouts.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        ConfigBuilder::new(host).build()
    }

    /// Starts a [`ConfigBuilder`].
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }
}

/// Builds a [`Config`]. The port follows the security mode unless set.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Security,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl ConfigBuilder {
    /// Defaults for `host`.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: Security::default(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    /// Overrides the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Picks the security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Bound on TCP connect and TLS handshake.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound on each read or write.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Finishes the config.
    #[must_use]
    pub fn build(self) -> Config {
        let port = self.port.unwrap_or(self.security.default_port());
        Config {
            host: self.host,
            port,
            security: self.security,
            connect_timeout: self.connect_timeout,
            io_timeout: self.io_timeout,
        }
    }
}
