//! Blocking IMAP client.
//!
//! The client tracks the RFC 3501 connection state at runtime and refuses
//! commands that are not valid in the current state. Every call blocks on
//! the underlying stream until the server sends the tagged completion.

#![allow(clippy::missing_errors_doc)]

use std::io::{Read, Write};

use tracing::{debug, warn};

use super::config::Config;
use super::framed::{FramedStream, ResponseAccumulator};
use super::stream::{self, ImapStream};
use crate::command::{Command, FetchAttribute, TagGenerator};
use crate::parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
use crate::types::{
    Capability, MailboxStatus, ProtocolState, ResponseCode, SelectedState, SeqNum, Status,
};
use crate::{Error, Result};

/// IMAP client over a blocking stream.
pub struct Client<S> {
    stream: FramedStream<S>,
    tag_gen: TagGenerator,
    capabilities: Vec<Capability>,
    state: ProtocolState,
}

impl<S> std::fmt::Debug for Client<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("capabilities", &self.capabilities)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Client<ImapStream> {
    /// Connects, reads the greeting, then switches the socket to the I/O
    /// timeout.
    ///
    /// `connect_timeout` bounds the TCP connect, the TLS handshake and the
    /// wait for the greeting.
    pub fn connect(config: &Config) -> Result<Self> {
        let stream = stream::connect(config)?;
        let client = Self::from_stream(stream)?;
        client.stream.get_ref().set_io_timeout(config.io_timeout)?;
        Ok(client)
    }
}

impl<S> Client<S>
where
    S: Read + Write,
{
    /// Creates a new client from a connected stream.
    ///
    /// Reads the server greeting. A `PREAUTH` greeting puts the client
    /// straight into the authenticated state; a `BYE` greeting is an error.
    pub fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);

        let greeting = framed.read_response()?;
        let response = ResponseParser::parse(&greeting)?;

        let mut capabilities = Vec::new();
        let mut state = ProtocolState::NotAuthenticated;

        match response {
            Response::Untagged(UntaggedResponse::Ok { code, .. }) => {
                if let Some(ResponseCode::Capability(caps)) = code {
                    capabilities = caps;
                }
            }
            Response::Untagged(UntaggedResponse::PreAuth { code, .. }) => {
                if let Some(ResponseCode::Capability(caps)) = code {
                    capabilities = caps;
                }
                state = ProtocolState::Authenticated;
            }
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                return Err(Error::Bye(text));
            }
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }

        debug!(?state, capabilities = capabilities.len(), "greeting received");

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            capabilities,
            state,
        })
    }

    /// Returns the current protocol state.
    #[must_use]
    pub const fn state(&self) -> &ProtocolState {
        &self.state
    }

    /// Returns the server capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Checks if the server has a specific capability.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Returns true if LOGIN is disabled (e.g., before STARTTLS).
    #[must_use]
    pub fn login_disabled(&self) -> bool {
        self.has_capability(&Capability::LoginDisabled)
    }

    /// Authenticates with the server using LOGIN.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        if self.state != ProtocolState::NotAuthenticated {
            return Err(Error::InvalidState(format!(
                "LOGIN not allowed in state {:?}",
                self.state
            )));
        }
        reject_line_breaks("username", username)?;
        reject_line_breaks("password", password)?;

        let responses = self.execute(&Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        })?;

        for response in parsed(&responses) {
            if let Response::Untagged(UntaggedResponse::Capability(caps)) = response {
                self.capabilities = caps;
            }
        }

        self.state = ProtocolState::Authenticated;
        Ok(())
    }

    /// Selects a mailbox for read-write access.
    pub fn select(&mut self, mailbox: &str) -> Result<MailboxStatus> {
        self.open_mailbox(mailbox, false)
    }

    /// Examines a mailbox for read-only access.
    ///
    /// Messages fetched from an examined mailbox never get `\Seen` set,
    /// whichever fetch item is used.
    pub fn examine(&mut self, mailbox: &str) -> Result<MailboxStatus> {
        self.open_mailbox(mailbox, true)
    }

    fn open_mailbox(&mut self, mailbox: &str, read_only: bool) -> Result<MailboxStatus> {
        if !self.state.is_authenticated() {
            return Err(Error::InvalidState(
                "mailbox selection requires authentication".to_string(),
            ));
        }
        reject_line_breaks("mailbox", mailbox)?;

        let command = if read_only {
            Command::Examine {
                mailbox: mailbox.to_string(),
            }
        } else {
            Command::Select {
                mailbox: mailbox.to_string(),
            }
        };

        let result = self.execute(&command);

        // A failed SELECT leaves no mailbox selected (RFC 3501 6.3.1).
        let responses = match result {
            Ok(responses) => responses,
            Err(e) => {
                if e.is_rejection() && self.state.is_selected() {
                    self.state = ProtocolState::Authenticated;
                }
                return Err(e);
            }
        };

        let mut status = parse_mailbox_status(&responses);
        status.read_only |= read_only;

        self.state = ProtocolState::Selected(SelectedState {
            mailbox: mailbox.to_string(),
            read_only: status.read_only,
        });

        Ok(status)
    }

    /// Searches the selected mailbox.
    ///
    /// `criteria` is sent verbatim. Returns matching sequence numbers in
    /// the order the server reported them.
    pub fn search(&mut self, criteria: &str) -> Result<Vec<SeqNum>> {
        self.require_selected("SEARCH")?;
        reject_line_breaks("search criteria", criteria)?;

        let responses = self.execute(&Command::Search {
            criteria: criteria.to_string(),
        })?;

        let mut ids = Vec::new();
        for response in parsed(&responses) {
            if let Response::Untagged(UntaggedResponse::Search(found)) = response {
                ids.extend(found);
            }
        }

        Ok(ids)
    }

    /// Fetches data items for one message.
    ///
    /// Returns the items of every FETCH response for `sequence`; the list
    /// is empty when the server sent none.
    pub fn fetch(&mut self, sequence: SeqNum, items: Vec<FetchAttribute>) -> Result<Vec<FetchItem>> {
        self.require_selected("FETCH")?;

        let responses = self.execute(&Command::Fetch { sequence, items })?;

        let mut fetched = Vec::new();
        for response in parsed(&responses) {
            if let Response::Untagged(UntaggedResponse::Fetch { seq, items }) = response
                && seq == sequence
            {
                fetched.extend(items);
            }
        }

        Ok(fetched)
    }

    /// Logs out and closes the session.
    ///
    /// The server's reply is read on a best-effort basis; a connection
    /// dropped right after `BYE` still counts as a clean logout.
    pub fn logout(&mut self) -> Result<()> {
        let tag = self.tag_gen.next_tag();
        self.stream.write_command(&tag, &Command::Logout)?;
        self.state = ProtocolState::Logout;

        if let Err(e) = self.read_until_tagged(&tag) {
            debug!(error = %e, "no tagged LOGOUT reply");
        }
        Ok(())
    }

    /// Consumes the client and returns the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }

    fn require_selected(&self, command: &str) -> Result<()> {
        if self.state.is_selected() {
            Ok(())
        } else {
            Err(Error::InvalidState(format!(
                "{command} requires a selected mailbox"
            )))
        }
    }

    /// Sends a command and reads through its tagged completion, failing
    /// unless the completion is OK.
    fn execute(&mut self, command: &Command) -> Result<Vec<Vec<u8>>> {
        let tag = self.tag_gen.next_tag();
        debug!(%tag, command = %command.redacted(), "sending");

        self.stream.write_command(&tag, command)?;
        let responses = self.read_until_tagged(&tag)?;

        if let Err(e) = check_tagged_ok(&responses, &tag) {
            warn!(%tag, command = %command.redacted(), error = %e, "command failed");
            return Err(e);
        }
        Ok(responses)
    }

    fn read_until_tagged(&mut self, tag: &str) -> Result<Vec<Vec<u8>>> {
        let responses = ResponseAccumulator::new(tag).read_until_tagged(&mut self.stream)?;

        // An untagged BYE mid-command means the server is going away.
        for response in parsed(&responses) {
            if let Response::Untagged(UntaggedResponse::Bye { text, .. }) = response
                && self.state != ProtocolState::Logout
            {
                return Err(Error::Bye(text));
            }
        }

        Ok(responses)
    }
}

/// Parses responses, skipping any the parser cannot handle.
fn parsed(responses: &[Vec<u8>]) -> impl Iterator<Item = Response> + '_ {
    responses.iter().filter_map(|bytes| match ResponseParser::parse(bytes) {
        Ok(response) => Some(response),
        Err(e) => {
            debug!(error = %e, "skipping unparseable response");
            None
        }
    })
}

/// Checks that the tagged response is OK.
fn check_tagged_ok(responses: &[Vec<u8>], tag: &str) -> Result<()> {
    // The tagged response is normally the last one
    for response_bytes in responses.iter().rev() {
        if let Ok(Response::Tagged {
            tag: resp_tag,
            status,
            text,
            ..
        }) = ResponseParser::parse(response_bytes)
            && resp_tag.as_str() == tag
        {
            return match status {
                Status::Ok | Status::PreAuth => Ok(()),
                Status::No => Err(Error::No(text)),
                Status::Bad => Err(Error::Bad(text)),
                Status::Bye => Err(Error::Bye(text)),
            };
        }
    }

    Err(Error::Protocol("missing tagged response".to_string()))
}

/// Collects mailbox information from SELECT/EXAMINE responses.
fn parse_mailbox_status(responses: &[Vec<u8>]) -> MailboxStatus {
    let mut status = MailboxStatus::default();

    for response in parsed(responses) {
        match response {
            Response::Untagged(UntaggedResponse::Exists(n)) => status.exists = n,
            Response::Untagged(UntaggedResponse::Recent(n)) => status.recent = n,
            Response::Untagged(UntaggedResponse::Ok {
                code: Some(ResponseCode::UidValidity(v)),
                ..
            }) => status.uid_validity = Some(v),
            Response::Tagged {
                code: Some(ResponseCode::ReadOnly),
                ..
            } => status.read_only = true,
            _ => {}
        }
    }

    status
}

/// Refuses values that would break out of the command line.
fn reject_line_breaks(what: &str, value: &str) -> Result<()> {
    if value.contains(['\r', '\n']) {
        return Err(Error::InvalidArgument(format!(
            "{what} must not contain CR or LF"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::io::{self, Cursor};
    use std::net::TcpListener;
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::connection::Security;

    struct Scripted {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Scripted {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn client(script: &str) -> Client<Scripted> {
        Client::from_stream(Scripted {
            input: Cursor::new(script.as_bytes().to_vec()),
            output: Vec::new(),
        })
        .unwrap()
    }

    fn sent(client: Client<Scripted>) -> String {
        String::from_utf8(client.into_inner().output).unwrap()
    }

    #[test]
    fn test_greeting_capabilities() {
        let c = client("* OK [CAPABILITY IMAP4rev1 IDLE] ready\r\n");
        assert_eq!(c.state(), &ProtocolState::NotAuthenticated);
        assert!(c.has_capability(&Capability::Idle));
        assert!(!c.login_disabled());
    }

    #[test]
    fn test_preauth_greeting() {
        let c = client("* PREAUTH welcome back\r\n");
        assert!(c.state().is_authenticated());
    }

    #[test]
    fn test_bye_greeting() {
        let result = Client::from_stream(Scripted {
            input: Cursor::new(b"* BYE too busy\r\n".to_vec()),
            output: Vec::new(),
        });
        assert!(matches!(result, Err(Error::Bye(text)) if text == "too busy"));
    }

    #[test]
    fn test_login_success() {
        let mut c = client("* OK ready\r\nA0001 OK logged in\r\n");
        c.login("user@example.com", "secret").unwrap();
        assert!(c.state().is_authenticated());
        assert_eq!(sent(c), "A0001 LOGIN user@example.com secret\r\n");
    }

    #[test]
    fn test_login_rejected() {
        let mut c = client("* OK ready\r\nA0001 NO [AUTHENTICATIONFAILED] bad credentials\r\n");
        let err = c.login("user", "wrong").unwrap_err();
        assert!(matches!(err, Error::No(ref text) if text == "bad credentials"));
        assert!(err.is_rejection());
        assert_eq!(c.state(), &ProtocolState::NotAuthenticated);
    }

    #[test]
    fn test_login_line_break_refused_locally() {
        let mut c = client("* OK ready\r\n");
        let err = c.login("user", "pw\r\nA0002 DELETE INBOX").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(sent(c), "");
    }

    #[test]
    fn test_examine_status() {
        let mut c = client(
            "* PREAUTH ok\r\n\
             * 12 EXISTS\r\n\
             * 2 RECENT\r\n\
             * OK [UIDVALIDITY 3857529045] UIDs valid\r\n\
             A0001 OK [READ-ONLY] EXAMINE completed\r\n",
        );
        let status = c.examine("INBOX").unwrap();
        assert_eq!(status.exists, 12);
        assert_eq!(status.recent, 2);
        assert_eq!(status.uid_validity, Some(3_857_529_045));
        assert!(status.read_only);
        assert_eq!(c.state().selected_mailbox(), Some("INBOX"));
    }

    #[test]
    fn test_select_requires_auth() {
        let mut c = client("* OK ready\r\n");
        assert!(matches!(c.select("INBOX"), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_search_and_fetch() {
        let mut c = client(
            "* PREAUTH ok\r\n\
             * 3 EXISTS\r\n\
             A0001 OK [READ-ONLY] done\r\n\
             * SEARCH 1 2 3\r\n\
             A0002 OK SEARCH completed\r\n\
             * 3 FETCH (BODY[] {5}\r\nhello)\r\n\
             A0003 OK FETCH completed\r\n",
        );
        c.examine("INBOX").unwrap();

        let ids: Vec<u32> = c.search("ALL").unwrap().into_iter().map(SeqNum::get).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let items = c
            .fetch(SeqNum::new(3).unwrap(), vec![FetchAttribute::peek_full()])
            .unwrap();
        assert_eq!(
            items,
            vec![FetchItem::Body {
                section: None,
                origin: None,
                data: Some(b"hello".to_vec()),
            }]
        );

        assert_eq!(
            sent(c),
            "A0001 EXAMINE INBOX\r\nA0002 SEARCH ALL\r\nA0003 FETCH 3 BODY.PEEK[]\r\n"
        );
    }

    #[test]
    fn test_search_requires_selected() {
        let mut c = client("* PREAUTH ok\r\n");
        assert!(matches!(c.search("ALL"), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_search_rejected() {
        let mut c = client(
            "* PREAUTH ok\r\n\
             A0001 OK done\r\n\
             A0002 BAD invalid search criteria\r\n",
        );
        c.select("INBOX").unwrap();
        let err = c.search("NONSENSE(").unwrap_err();
        assert!(err.is_rejection());
    }

    #[test]
    fn test_untagged_bye_mid_command() {
        let mut c = client(
            "* PREAUTH ok\r\n\
             * BYE server shutting down\r\n\
             A0001 NO gone\r\n",
        );
        assert!(matches!(c.select("INBOX"), Err(Error::Bye(_))));
    }

    fn loopback(connect_timeout: Duration, io_timeout: Duration) -> (TcpListener, Config) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let config = Config::builder("127.0.0.1")
            .security(Security::None)
            .port(listener.local_addr().unwrap().port())
            .connect_timeout(connect_timeout)
            .io_timeout(io_timeout)
            .build();
        (listener, config)
    }

    #[test]
    fn test_silent_server_bounded_by_connect_timeout() {
        // The kernel completes the handshake from the backlog; nobody greets
        let (_listener, config) = loopback(Duration::from_millis(300), Duration::from_secs(10));

        let started = Instant::now();
        let result = Client::connect(&config);
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(Error::Io(_))), "{result:?}");
        assert!(elapsed < Duration::from_secs(5), "waited {elapsed:?}");
    }

    #[test]
    fn test_io_timeout_applied_after_greeting() {
        let (listener, config) = loopback(Duration::from_secs(5), Duration::from_secs(42));
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            socket.write_all(b"* OK ready\r\n").unwrap();
            socket
        });

        let client = Client::connect(&config).unwrap();
        let _socket = server.join().unwrap();

        let ImapStream::Plain(tcp) = client.into_inner() else {
            panic!("expected a plain stream");
        };
        assert_eq!(tcp.read_timeout().unwrap(), Some(Duration::from_secs(42)));
        assert_eq!(tcp.write_timeout().unwrap(), Some(Duration::from_secs(42)));
    }

    #[test]
    fn test_logout_tolerates_closed_connection() {
        let mut c = client("* PREAUTH ok\r\n* BYE logging out\r\n");
        c.logout().unwrap();
        assert_eq!(c.state(), &ProtocolState::Logout);
    }
}
