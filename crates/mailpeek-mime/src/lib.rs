//! # mailpeek-mime
//!
//! MIME message parsing and decoding for retrieved email.
//!
//! ## Features
//!
//! - **Message parsing**: Parse raw messages into a tree of parts, with
//!   nested multipart and `message/rfc822` support
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 encoded-word headers
//! - **Charsets**: Any charset label known to the WHATWG encoding registry
//! - **Content types**: Content type parameters and attachment detection
//!
//! Parsing never fails. Malformed structure degrades to leaves holding the
//! raw bytes, so a single broken message cannot abort a batch.
//!
//! ## Quick Start
//!
//! ```
//! use mailpeek_mime::{Headers, Message};
//!
//! let raw = b"From: sender@example.com\r\n\
//!             Subject: =?utf-8?B?SMOpbGxv?=\r\n\
//!             Content-Type: text/plain; charset=utf-8\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = Message::parse(raw);
//! let subject = Headers::decode_value(message.subject().unwrap_or_default()).unwrap();
//! assert_eq!(subject, "Héllo");
//! assert_eq!(message.root().text(), "Hello, World!");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod charset;
pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding, Walk};
