//! # mailpeek-imap
//!
//! A blocking IMAP4rev1 (RFC 3501) client covering what a read-only mail
//! retriever needs: LOGIN, SELECT/EXAMINE, SEARCH, FETCH and LOGOUT.
//!
//! ## Features
//!
//! - **Runtime state tracking**: commands that are not valid in the current
//!   protocol state are refused before anything is sent
//! - **TLS via rustls**: implicit TLS (port 993) without an OpenSSL dependency
//! - **Literal-aware framing**: message bodies arrive as `{n}` literals and
//!   are read byte-exact
//! - **Sans-I/O parser**: protocol parsing separated from network I/O
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailpeek_imap::{Client, Config, FetchAttribute, connection};
//!
//! fn main() -> mailpeek_imap::Result<()> {
//!     let config = Config::new("imap.example.com");
//!     let stream = connection::connect(&config)?;
//!     let mut client = Client::from_stream(stream)?;
//!
//!     client.login("user@example.com", "password")?;
//!     let status = client.examine("INBOX")?;
//!     println!("Messages: {}", status.exists);
//!
//!     for seq in client.search("UNSEEN")? {
//!         let items = client.fetch(seq, vec![FetchAttribute::peek_full()])?;
//!         println!("{seq}: {} items", items.len());
//!     }
//!
//!     client.logout()
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! NotAuthenticated ── login() ──→ Authenticated ── select()/examine() ──→ Selected
//!                                                                           │
//!                  any state ── logout() ──→ Logout ←──────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`command`]: IMAP command builders and types
//! - [`connection`]: Connection management and the blocking client
//! - [`parser`]: Sans-I/O response parser
//! - [`types`]: Core IMAP types (sequence numbers, capabilities, states)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchAttribute, TagGenerator};
pub use connection::{
    Client, Config, ConfigBuilder, FramedStream, ImapStream, ResponseAccumulator, Security,
};
pub use error::{Error, Result};
pub use parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
pub use types::{
    Capability, MailboxStatus, ProtocolState, ResponseCode, SelectedState, SeqNum, Status, Tag,
};

/// IMAP protocol version spoken by the client.
pub const IMAP_VERSION: &str = "IMAP4rev1";
