//! IMAP protocol parser.
//!
//! A sans-I/O parser for IMAP server responses, split into a lexer that
//! tokenizes raw bytes and a response parser that builds structured
//! responses from tokens.
//!
//! # Example
//!
//! ```
//! use mailpeek_imap::parser::{Response, ResponseParser, UntaggedResponse};
//!
//! let response = ResponseParser::parse(b"* SEARCH 2 3 5\r\n").unwrap();
//!
//! match response {
//!     Response::Untagged(UntaggedResponse::Search(ids)) => assert_eq!(ids.len(), 3),
//!     _ => panic!("Expected SEARCH"),
//! }
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{FetchItem, Response, ResponseParser, UntaggedResponse};
