//! IMAP connection management.
//!
//! This module provides connection handling for IMAP servers, including:
//! - Configuration (host, port, security mode, timeouts)
//! - TLS/plaintext stream abstraction
//! - Framed I/O for IMAP protocol
//! - A blocking client that tracks the protocol state

mod client;
mod config;
mod framed;
mod stream;

pub use client::Client;
pub use config::{
    Config, ConfigBuilder, DEFAULT_CONNECT_TIMEOUT, DEFAULT_IO_TIMEOUT, Security,
};
pub use framed::{FramedStream, MAX_LINE_LENGTH, MAX_LITERAL_SIZE, ResponseAccumulator};
pub use stream::{ImapStream, connect, connect_plain, connect_tls, create_tls_config};
