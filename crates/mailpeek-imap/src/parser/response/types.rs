//! Parsed response data types.

use crate::types::{Capability, ResponseCode, SeqNum};

/// Untagged server data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* OK` status.
    Ok {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* NO` warning.
    No {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* BAD` error.
    Bad {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* PREAUTH` greeting.
    PreAuth {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* BYE`: the server is closing the connection.
    Bye {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* CAPABILITY ...`
    Capability(Vec<Capability>),
    /// `* FLAGS (...)`
    Flags(Vec<String>),
    /// `* SEARCH ...`: matching sequence numbers in server order.
    Search(Vec<SeqNum>),
    /// `* n EXISTS`
    Exists(u32),
    /// `* n RECENT`
    Recent(u32),
    /// `* n EXPUNGE`
    Expunge(SeqNum),
    /// `* n FETCH (...)`
    Fetch {
        /// Message sequence number.
        seq: SeqNum,
        /// Returned data items.
        items: Vec<FetchItem>,
    },
    /// Any other untagged data, kept by keyword.
    Other(String),
}

/// One data item from a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// Message flags.
    Flags(Vec<String>),
    /// Unique identifier.
    Uid(u32),
    /// Message size.
    Rfc822Size(u32),
    /// Internal date string.
    InternalDate(String),
    /// Body section content (`BODY[...]`, `RFC822`, ...).
    Body {
        /// Section specifier; `None` for the full message.
        section: Option<String>,
        /// Partial-fetch origin octet.
        origin: Option<u32>,
        /// Content; `None` when the server returned NIL.
        data: Option<Vec<u8>>,
    },
}
