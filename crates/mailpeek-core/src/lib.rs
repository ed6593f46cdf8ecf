//! # mailpeek-core
//!
//! Mail retrieval for `mailpeek`.
//!
//! This crate provides:
//! - [`MailSession`]: connects with host fallback, logs in, fetches the
//!   newest messages matching a search, and logs out
//! - [`decode_message`]: turns a raw message into a [`MessageRecord`] with
//!   decoded headers and plain/HTML bodies
//! - [`Connector`] and [`Transport`]: the protocol seam, implemented over
//!   IMAP by [`ImapConnector`]
//! - [`Settings`]: JSON settings with host overrides
//!
//! ```no_run
//! use mailpeek_core::{Credentials, FetchOptions, MailSession, Settings};
//!
//! # async fn run() -> mailpeek_core::Result<()> {
//! let credentials = Credentials::new("me@example.com", "secret")?;
//! let mut session = MailSession::from_settings(credentials, &Settings::load()?);
//!
//! session.connect().await?;
//! let batch = session.fetch_messages(&FetchOptions::new().limit(10)).await?;
//! for message in &batch.messages {
//!     println!("{}: {}", message.from, message.subject);
//! }
//! session.disconnect().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod credentials;
pub mod decoder;
mod error;
pub mod hosts;
pub mod session;
pub mod settings;
pub mod transport;

pub use credentials::Credentials;
pub use decoder::{MessageRecord, decode_message, escape_html, render_pre};
pub use error::{Error, ProtocolStateError, Result, TransportError};
pub use hosts::{DEFAULT_FALLBACK_HOSTS, HostTable};
pub use session::{FetchOptions, MailSession, MessageBatch};
pub use settings::Settings;
pub use transport::{Connector, FetchMode, ImapConnector, ImapTransport, Transport};
