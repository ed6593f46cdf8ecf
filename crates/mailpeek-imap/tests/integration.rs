//! Integration tests for the IMAP client.
//!
//! These tests use a mock stream to simulate IMAP server responses
//! without requiring a real server connection.

use std::io::{self, Cursor, Read, Write};
use std::net::TcpListener;
use std::thread;

use mailpeek_imap::{
    Client, Config, Error, FetchAttribute, FetchItem, ProtocolState, Response, ResponseParser,
    Security, SeqNum, UntaggedResponse,
};

/// Mock stream that returns predefined responses.
struct MockStream {
    /// Responses to return (in order).
    responses: Cursor<Vec<u8>>,
    /// Captured commands sent by the client.
    sent: Vec<u8>,
}

impl MockStream {
    fn new(responses: &[u8]) -> Self {
        Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Vec::new(),
        }
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.responses.read(buf)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sent.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn body_of(items: &[FetchItem]) -> Option<&[u8]> {
    items.iter().find_map(|item| match item {
        FetchItem::Body {
            data: Some(data), ..
        } => Some(data.as_slice()),
        _ => None,
    })
}

#[test]
fn test_parser_capability() {
    let response = b"* CAPABILITY IMAP4rev1 IDLE LITERAL+\r\n";
    let parsed = ResponseParser::parse(response).unwrap();
    assert!(matches!(
        parsed,
        Response::Untagged(UntaggedResponse::Capability(ref caps)) if caps.len() == 3
    ));
}

#[test]
fn test_full_retrieval_flow() {
    let message = "From: alice@example.com\r\nSubject: hi\r\n\r\nHello!\r\n";
    let script = format!(
        "* OK [CAPABILITY IMAP4rev1 AUTH=PLAIN] Dovecot ready.\r\n\
         A0001 OK [CAPABILITY IMAP4rev1 IDLE] Logged in\r\n\
         * FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n\
         * OK [PERMANENTFLAGS ()] Read-only mailbox.\r\n\
         * 2 EXISTS\r\n\
         * 0 RECENT\r\n\
         * OK [UIDVALIDITY 1700000000] UIDs valid\r\n\
         * OK [UIDNEXT 3] Predicted next UID\r\n\
         A0002 OK [READ-ONLY] Examine completed\r\n\
         * SEARCH 1 2\r\n\
         A0003 OK Search completed\r\n\
         * 2 FETCH (BODY[] {{{len}}}\r\n{message})\r\n\
         A0004 OK Fetch completed\r\n\
         * 1 FETCH (RFC822 NIL)\r\n\
         A0005 OK Fetch completed\r\n\
         * BYE Logging out\r\n\
         A0006 OK Logout completed\r\n",
        len = message.len(),
    );

    let mut client = Client::from_stream(MockStream::new(script.as_bytes())).unwrap();
    client.login("alice@example.com", "s3cret").unwrap();
    assert!(client.has_capability(&mailpeek_imap::Capability::Idle));

    let status = client.examine("INBOX").unwrap();
    assert_eq!(status.exists, 2);
    assert!(status.read_only);

    let ids = client.search("ALL").unwrap();
    assert_eq!(ids.len(), 2);

    let newest = *ids.last().unwrap();
    let items = client
        .fetch(newest, vec![FetchAttribute::peek_full()])
        .unwrap();
    assert_eq!(body_of(&items), Some(message.as_bytes()));

    let items = client
        .fetch(SeqNum::new(1).unwrap(), vec![FetchAttribute::Rfc822])
        .unwrap();
    assert_eq!(body_of(&items), None);

    client.logout().unwrap();
    assert_eq!(client.state(), &ProtocolState::Logout);

    let sent = String::from_utf8(client.into_inner().sent).unwrap();
    assert_eq!(
        sent,
        "A0001 LOGIN alice@example.com s3cret\r\n\
         A0002 EXAMINE INBOX\r\n\
         A0003 SEARCH ALL\r\n\
         A0004 FETCH 2 BODY.PEEK[]\r\n\
         A0005 FETCH 1 RFC822\r\n\
         A0006 LOGOUT\r\n"
    );
}

#[test]
fn test_mailbox_rejected_keeps_connection() {
    let script = b"* PREAUTH ready\r\n\
        A0001 NO [TRYCREATE] Mailbox doesn't exist: Archive\r\n\
        * 4 EXISTS\r\n\
        A0002 OK [READ-ONLY] Examine completed\r\n";

    let mut client = Client::from_stream(MockStream::new(script)).unwrap();
    let err = client.examine("Archive").unwrap_err();
    assert!(matches!(err, Error::No(_)));
    assert!(err.is_rejection());

    let status = client.examine("INBOX").unwrap();
    assert_eq!(status.exists, 4);
    assert_eq!(client.state().selected_mailbox(), Some("INBOX"));
}

#[test]
fn test_empty_search() {
    let script = b"* PREAUTH ready\r\n\
        A0001 OK [READ-ONLY] done\r\n\
        * SEARCH\r\n\
        A0002 OK Search completed\r\n";

    let mut client = Client::from_stream(MockStream::new(script)).unwrap();
    client.examine("INBOX").unwrap();
    assert!(client.search("UNSEEN").unwrap().is_empty());
}

#[test]
fn test_connection_dropped_mid_command() {
    let script = b"* PREAUTH ready\r\n* 3 EXISTS\r\n";

    let mut client = Client::from_stream(MockStream::new(script)).unwrap();
    let err = client.select("INBOX").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(!err.is_rejection());
}

#[test]
fn test_plain_connection_to_local_server() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();
        socket.write_all(b"* OK local test server\r\n").unwrap();

        let mut buf = [0u8; 256];
        let n = socket.read(&mut buf).unwrap();
        assert!(buf[..n].ends_with(b"LOGOUT\r\n"));
        socket.write_all(b"* BYE\r\nA0001 OK bye\r\n").unwrap();
    });

    let config = Config::builder("127.0.0.1")
        .port(port)
        .security(Security::None)
        .build();
    let mut client = Client::connect(&config).unwrap();
    client.logout().unwrap();

    server.join().unwrap();
}
