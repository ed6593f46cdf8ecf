//! Client errors.

use thiserror::Error;

/// Anything that can go wrong talking to an IMAP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket failure, including timeouts and EOF.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS failure.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// The host is not usable as a TLS server name.
    #[error("invalid server name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A response could not be tokenized or parsed.
    #[error("parse error at byte {position}: {message}")]
    Parse {
        /// Offset into the response.
        position: usize,
        /// What was expected.
        message: String,
    },

    /// Tagged `NO`.
    #[error("server said NO: {0}")]
    No(String),

    /// Tagged `BAD`.
    #[error("server said BAD: {0}")]
    Bad(String),

    /// The server closed the session.
    #[error("server said BYE: {0}")]
    Bye(String),

    /// The command is not allowed in the current connection state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An argument that cannot be put on the wire, e.g. one holding CR or LF.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The server broke the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// The command was refused, by the server (`NO`, `BAD`) or locally
    /// before anything was sent.
    ///
    /// The connection stays usable after a rejection. Every other variant
    /// leaves it in an unknown state.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::No(_) | Self::Bad(_) | Self::InvalidArgument(_))
    }
}

/// `Result` with this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
