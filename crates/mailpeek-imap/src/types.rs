//! Core IMAP types.
//!
//! Tags, sequence numbers, completion statuses, capabilities, response
//! codes, and the RFC 3501 connection state.

use std::fmt;
use std::num::NonZeroU32;

/// Command tag, echoed by the server in the completion response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    /// Wraps a tag string.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message sequence number (1-based position in the open mailbox).
///
/// Only meaningful while the mailbox stays selected; an expunge shifts
/// every later number down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeqNum(NonZeroU32);

impl SeqNum {
    /// Returns `None` for 0, which is not a valid sequence number.
    #[must_use]
    pub const fn new(n: u32) -> Option<Self> {
        match NonZeroU32::new(n) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// The number itself.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status keyword of a tagged or untagged condition response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `OK`
    Ok,
    /// `NO`: the server refused the command.
    No,
    /// `BAD`: the server could not parse the command.
    Bad,
    /// `PREAUTH`: greeting for an already authenticated connection.
    PreAuth,
    /// `BYE`: the server is closing the connection.
    Bye,
}

impl Status {
    /// True for `OK` and `PREAUTH`.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

/// A capability advertised by the server.
///
/// Only the ones the client acts on get their own variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1`
    Imap4Rev1,
    /// `IDLE`
    Idle,
    /// `STARTTLS`
    StartTls,
    /// `LOGINDISABLED`: LOGIN will be refused on this connection.
    LoginDisabled,
    /// `AUTH=<mechanism>`
    Auth(String),
    /// Anything else, as sent.
    Other(String),
}

impl Capability {
    /// Classifies a capability atom, ignoring case.
    #[must_use]
    pub fn parse(atom: &str) -> Self {
        const KNOWN: [(&str, Capability); 4] = [
            ("IMAP4rev1", Capability::Imap4Rev1),
            ("IDLE", Capability::Idle),
            ("STARTTLS", Capability::StartTls),
            ("LOGINDISABLED", Capability::LoginDisabled),
        ];

        if let Some((_, cap)) = KNOWN.iter().find(|(name, _)| name.eq_ignore_ascii_case(atom)) {
            return cap.clone();
        }
        match atom.split_once('=') {
            Some((prefix, mechanism)) if prefix.eq_ignore_ascii_case("AUTH") => {
                Self::Auth(mechanism.to_string())
            }
            _ => Self::Other(atom.to_string()),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imap4Rev1 => f.write_str("IMAP4rev1"),
            Self::Idle => f.write_str("IDLE"),
            Self::StartTls => f.write_str("STARTTLS"),
            Self::LoginDisabled => f.write_str("LOGINDISABLED"),
            Self::Auth(mechanism) => write!(f, "AUTH={mechanism}"),
            Self::Other(atom) => f.write_str(atom),
        }
    }
}

/// Bracketed response code, e.g. `[READ-ONLY]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// `ALERT`: text meant for the user.
    Alert,
    /// `CAPABILITY`, often sent with the greeting or after login.
    Capability(Vec<Capability>),
    /// `READ-ONLY`
    ReadOnly,
    /// `READ-WRITE`
    ReadWrite,
    /// `TRYCREATE`: the target mailbox does not exist.
    TryCreate,
    /// `AUTHENTICATIONFAILED` (RFC 5530).
    AuthenticationFailed,
    /// `UIDNEXT n`
    UidNext(u32),
    /// `UIDVALIDITY n`
    UidValidity(u32),
    /// `UNSEEN n`: first unseen message.
    Unseen(u32),
    /// Any other code, keyword only.
    Unknown(String),
}

/// What SELECT or EXAMINE reported about the opened mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// `EXISTS` count.
    pub exists: u32,
    /// `RECENT` count.
    pub recent: u32,
    /// `UIDVALIDITY`, if sent.
    pub uid_validity: Option<u32>,
    /// Opened read-only (EXAMINE, or `[READ-ONLY]` from the server).
    pub read_only: bool,
}

/// Connection state (RFC 3501 section 3).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProtocolState {
    /// Greeting received, no login yet.
    #[default]
    NotAuthenticated,
    /// Logged in, no mailbox open.
    Authenticated,
    /// Logged in with a mailbox open.
    Selected(SelectedState),
    /// LOGOUT sent.
    Logout,
}

impl ProtocolState {
    /// Logged in, with or without a mailbox open.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Selected(_))
    }

    /// A mailbox is open.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        matches!(self, Self::Selected(_))
    }

    /// Name of the open mailbox.
    #[must_use]
    pub fn selected_mailbox(&self) -> Option<&str> {
        match self {
            Self::Selected(selected) => Some(&selected.mailbox),
            _ => None,
        }
    }
}

/// The open mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedState {
    /// Mailbox name.
    pub mailbox: String,
    /// No changes (including `\Seen`) are possible.
    pub read_only: bool,
}
