//! IMAP command builder.
//!
//! This module provides types and serialization for the commands a
//! read-only retrieval client needs.

mod serialize;
mod tag_generator;

use bytes::{BufMut, BytesMut};

use crate::types::SeqNum;

pub use tag_generator::TagGenerator;

use serialize::{write_astring, write_fetch_items};

/// Attribute requested by a FETCH command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// Message flags.
    Flags,
    /// Unique identifier.
    Uid,
    /// Message size in octets.
    Rfc822Size,
    /// Full message; sets `\Seen` as a side effect.
    Rfc822,
    /// Message body section.
    Body {
        /// Section specifier (`None` for the whole message).
        section: Option<String>,
        /// Use `BODY.PEEK`, which leaves `\Seen` untouched.
        peek: bool,
    },
}

impl FetchAttribute {
    /// `BODY.PEEK[]`: the whole message without setting `\Seen`.
    #[must_use]
    pub const fn peek_full() -> Self {
        Self::Body {
            section: None,
            peek: true,
        }
    }
}

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// LOGOUT command.
    Logout,
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// SELECT command.
    Select {
        /// Mailbox to select.
        mailbox: String,
    },
    /// EXAMINE command (read-only SELECT).
    Examine {
        /// Mailbox to examine.
        mailbox: String,
    },
    /// SEARCH command.
    Search {
        /// Search keys, sent verbatim (e.g. `ALL`, `UNSEEN SINCE 1-Jan-2024`).
        criteria: String,
    },
    /// FETCH command for a single message.
    Fetch {
        /// Message sequence number.
        sequence: SeqNum,
        /// Items to fetch.
        items: Vec<FetchAttribute>,
    },
}

impl Command {
    /// Appends the tagged command line, CRLF included, to `buf`.
    pub fn encode(&self, tag: &str, buf: &mut BytesMut) {
        buf.put_slice(tag.as_bytes());
        buf.put_u8(b' ');

        match self {
            Self::Logout => buf.put_slice(b"LOGOUT"),

            Self::Login { username, password } => {
                buf.put_slice(b"LOGIN ");
                write_astring(buf, username);
                buf.put_u8(b' ');
                write_astring(buf, password);
            }

            Self::Select { mailbox } => {
                buf.put_slice(b"SELECT ");
                write_astring(buf, mailbox);
            }

            Self::Examine { mailbox } => {
                buf.put_slice(b"EXAMINE ");
                write_astring(buf, mailbox);
            }

            Self::Search { criteria } => {
                buf.put_slice(b"SEARCH ");
                buf.put_slice(criteria.as_bytes());
            }

            Self::Fetch { sequence, items } => {
                buf.put_slice(b"FETCH ");
                buf.put_slice(sequence.to_string().as_bytes());
                buf.put_u8(b' ');
                write_fetch_items(buf, items);
            }
        }

        buf.put_slice(b"\r\n");
    }

    /// The tagged command line as an owned byte vector.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = BytesMut::new();
        self.encode(tag, &mut buf);
        buf.to_vec()
    }

    /// Returns the command as it may appear in logs, with the password
    /// of a LOGIN masked.
    #[must_use]
    pub fn redacted(&self) -> String {
        match self {
            Self::Login { username, .. } => format!("LOGIN {username} ***"),
            other => {
                let bytes = other.serialize("");
                String::from_utf8_lossy(&bytes).trim().to_string()
            }
        }
    }
}
