//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No candidate host accepted both the connection and the login.
    #[error(
        "authentication failed for {address} (tried {}): {cause}",
        .hosts.join(", ")
    )]
    Authentication {
        /// Address that tried to log in.
        address: String,
        /// Every host attempted, in order.
        hosts: Vec<String>,
        /// Most recent failure.
        cause: String,
    },

    /// Operation not possible in the current session state.
    #[error(transparent)]
    ProtocolState(#[from] ProtocolStateError),

    /// Address is not of the form `local@domain`.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Session-state failures surfaced by [`MailSession`](crate::MailSession).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolStateError {
    /// No session is established.
    #[error("no active connection")]
    NotConnected,

    /// The server refused to open the mailbox.
    #[error("cannot open mailbox {mailbox}: {reason}")]
    MailboxSelection {
        /// Mailbox that was requested.
        mailbox: String,
        /// Server's reason.
        reason: String,
    },

    /// The server refused the search.
    #[error("search failed: {0}")]
    Search(String),

    /// The connection dropped; the session is closed.
    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

/// Failure reported by a [`Transport`](crate::Transport) or
/// [`Connector`](crate::Connector).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Socket, TLS or protocol failure. The transport is unusable.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The server answered NO or BAD. The transport is still usable.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl From<mailpeek_imap::Error> for TransportError {
    fn from(err: mailpeek_imap::Error) -> Self {
        if err.is_rejection() {
            Self::Rejected(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_lists_hosts() {
        let err = Error::Authentication {
            address: "a@b.c".to_string(),
            hosts: vec!["imap.one".to_string(), "imap.two".to_string()],
            cause: "bad credentials".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "authentication failed for a@b.c (tried imap.one, imap.two): bad credentials"
        );
    }

    #[test]
    fn imap_errors_classified() {
        let rejected: TransportError = mailpeek_imap::Error::No("denied".to_string()).into();
        assert!(matches!(rejected, TransportError::Rejected(_)));

        let lost: TransportError = mailpeek_imap::Error::Bye("bye".to_string()).into();
        assert!(matches!(lost, TransportError::Connection(_)));
    }

    #[test]
    fn protocol_state_is_transparent() {
        let err: Error = ProtocolStateError::NotConnected.into();
        assert_eq!(err.to_string(), "no active connection");
    }
}
