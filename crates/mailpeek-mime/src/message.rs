//! MIME message structure and handling.

use crate::charset;
use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_quoted_printable_lenient};
use crate::header::Headers;
use std::fmt;

/// Nesting limit for multipart and encapsulated messages. Deeper parts are
/// kept as opaque leaves.
const MAX_DEPTH: usize = 32;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// MIME entity: headers, raw body, and any nested entities.
///
/// `children` holds the body parts of a `multipart/*` entity, or the single
/// enclosed message of a `message/rfc822` entity. It is empty for leaves.
#[derive(Debug, Clone, Default)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw, still transfer-encoded).
    pub body: Vec<u8>,
    /// Nested parts.
    pub children: Vec<Part>,
}

impl Part {
    /// Parses an entity from raw bytes. Never fails; malformed structure
    /// degrades to a leaf holding the raw body.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        Self::parse_at_depth(raw, 0)
    }

    fn parse_at_depth(raw: &[u8], depth: usize) -> Self {
        let (header_bytes, body) = split_header_body(raw);
        let headers = Headers::parse(&String::from_utf8_lossy(header_bytes));
        let mut part = Self {
            headers,
            body: body.to_vec(),
            children: Vec::new(),
        };

        if depth >= MAX_DEPTH {
            return part;
        }

        let content_type = part.content_type();
        if content_type.is_multipart() {
            if let Some(boundary) = content_type.boundary() {
                part.children = split_multipart(&part.body, boundary)
                    .into_iter()
                    .map(|chunk| Self::parse_at_depth(chunk, depth + 1))
                    .collect();
            }
        } else if content_type.is_message() {
            let inner = part.decoded_body();
            part.children = vec![Self::parse_at_depth(&inner, depth + 1)];
        }

        part
    }

    fn declared_content_type(&self) -> Option<ContentType> {
        self.headers
            .get("content-type")
            .and_then(|value| ContentType::parse(value).ok())
    }

    /// Gets the content type, defaulting to `text/plain` when the header is
    /// absent or unparseable.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.declared_content_type()
            .unwrap_or_else(ContentType::text_plain)
    }

    /// Gets the charset declared in the `Content-Type` header, if any.
    #[must_use]
    pub fn charset(&self) -> Option<String> {
        self.declared_content_type()
            .and_then(|ct| ct.charset().map(str::to_string))
    }

    /// True when the `Content-Disposition` value mentions `attachment`
    /// anywhere, in any case.
    ///
    /// This also catches inline parts whose parameters name an attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.headers
            .get("content-disposition")
            .is_some_and(|value| value.to_ascii_lowercase().contains("attachment"))
    }

    /// Checks whether the part is a container (`multipart/*`).
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.content_type().is_multipart()
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// Base64 bodies that fail to decode are returned raw; invalid
    /// quoted-printable escapes pass through unchanged.
    #[must_use]
    pub fn decoded_body(&self) -> Vec<u8> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => {
                decode_base64(&self.body).unwrap_or_else(|_| self.body.clone())
            }
            TransferEncoding::QuotedPrintable => decode_quoted_printable_lenient(&self.body),
            _ => self.body.clone(),
        }
    }

    /// Gets the decoded body as text, using the declared charset and falling
    /// back to lossy UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        charset::decode_lossy(&self.decoded_body(), self.charset().as_deref())
    }

    /// Iterates over this part and every nested part, depth first.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Depth-first, pre-order iterator over a part tree.
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<&'a Part>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Part;

    fn next(&mut self) -> Option<Self::Item> {
        let part = self.stack.pop()?;
        self.stack.extend(part.children.iter().rev());
        Some(part)
    }
}

/// MIME message.
#[derive(Debug, Clone, Default)]
pub struct Message {
    root: Part,
}

impl Message {
    /// Parses a message from raw RFC 5322 bytes. Never fails.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        Self {
            root: Part::parse(raw),
        }
    }

    /// Gets the top-level entity.
    #[must_use]
    pub const fn root(&self) -> &Part {
        &self.root
    }

    /// Gets the top-level headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// Checks if this is a multipart message.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.root.is_multipart()
    }

    /// Iterates over every part of the message, root included, depth first.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        self.root.walk()
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.root.headers.get("from")
    }

    /// Gets the To header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.root.headers.get("to")
    }

    /// Gets the Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.root.headers.get("subject")
    }

    /// Gets the Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.root.headers.get("date")
    }

    /// Gets the Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.root.headers.get("message-id")
    }
}

/// Splits an entity at the first empty line.
fn split_header_body(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(body) = raw.strip_prefix(b"\r\n") {
        return (&[], body);
    }
    if let Some(body) = raw.strip_prefix(b"\n") {
        return (&[], body);
    }

    let crlf = find(raw, b"\r\n\r\n").map(|i| (i, i + 4));
    let lf = find(raw, b"\n\n").map(|i| (i, i + 2));
    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match split {
        Some((header_end, body_start)) => (&raw[..header_end], &raw[body_start..]),
        None => (raw, &[]),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Splits a multipart body into its raw body parts.
///
/// The preamble and epilogue are discarded. A missing closing delimiter
/// keeps everything after the last delimiter as the final part.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut part_start: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| pos + i + 1);
        let line = &body[pos..line_end];

        if let Some(rest) = line.strip_prefix(delimiter.as_bytes()) {
            let rest = rest.trim_ascii_end();
            let closing = rest == b"--";
            if closing || rest.is_empty() {
                if let Some(start) = part_start.take() {
                    parts.push(strip_line_ending(&body[start..pos]));
                }
                if closing {
                    return parts;
                }
                part_start = Some(line_end);
            }
        }

        pos = line_end;
    }

    if let Some(start) = part_start {
        if start < body.len() {
            parts.push(&body[start..]);
        }
    }
    parts
}

/// The line break before a delimiter belongs to the delimiter.
fn strip_line_ending(chunk: &[u8]) -> &[u8] {
    chunk
        .strip_suffix(b"\r\n")
        .or_else(|| chunk.strip_suffix(b"\n"))
        .unwrap_or(chunk)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MULTIPART: &[u8] = b"From: a@example.com\r\n\
Subject: Mixed\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
This is the preamble.\r\n\
--outer\r\n\
Content-Type: multipart/alternative; boundary=inner\r\n\
\r\n\
--inner\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Plain body\r\n\
--inner\r\n\
Content-Type: text/html; charset=utf-8\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
<p>Caf=C3=A9</p>\r\n\
--inner--\r\n\
--outer\r\n\
Content-Type: application/pdf\r\n\
Content-Disposition: attachment; filename=\"a.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0=\r\n\
--outer--\r\n\
epilogue\r\n";

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse(" quoted-printable "),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("x-uuencode"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
    }

    #[test]
    fn test_single_part() {
        let msg = Message::parse(b"Subject: Hi\r\nMessage-ID: <1@x>\r\n\r\nHello\r\n");
        assert!(!msg.is_multipart());
        assert_eq!(msg.subject(), Some("Hi"));
        assert_eq!(msg.message_id(), Some("<1@x>"));
        assert_eq!(msg.root().text(), "Hello\r\n");
        assert_eq!(msg.walk().count(), 1);
    }

    #[test]
    fn test_lf_only_line_endings() {
        let msg = Message::parse(b"Subject: Unix\n\nline one\nline two\n");
        assert_eq!(msg.subject(), Some("Unix"));
        assert_eq!(msg.root().text(), "line one\nline two\n");
    }

    #[test]
    fn test_nested_multipart_walk() {
        let msg = Message::parse(MULTIPART);
        assert!(msg.is_multipart());

        let types: Vec<String> = msg.walk().map(|p| p.content_type().to_string()).collect();
        assert_eq!(
            types,
            vec![
                "multipart/mixed",
                "multipart/alternative",
                "text/plain",
                "text/html",
                "application/pdf",
            ]
        );

        let parts: Vec<&Part> = msg.walk().collect();
        assert_eq!(parts[2].text(), "Plain body");
        assert_eq!(parts[3].text(), "<p>Café</p>");
        assert!(parts[4].is_attachment());
        assert_eq!(parts[4].decoded_body(), b"%PDF-");
    }

    #[test]
    fn test_attachment_detection() {
        let part = |disposition: &str| {
            Part::parse(format!("Content-Disposition: {disposition}\r\n\r\nx").as_bytes())
        };

        assert!(part("attachment; filename=a.pdf").is_attachment());
        assert!(part("Attachment").is_attachment());
        assert!(part("inline; filename=\"attachment.txt\"").is_attachment());
        assert!(!part("inline").is_attachment());
        assert!(!Part::parse(b"Content-Type: text/plain\r\n\r\nx").is_attachment());
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\r\n\r\n--b\r\n\r\ntail text";
        let msg = Message::parse(raw);
        assert_eq!(msg.root().children.len(), 1);
        assert_eq!(msg.root().children[0].text(), "tail text");
    }

    #[test]
    fn test_multipart_without_boundary_is_leaf() {
        let msg = Message::parse(b"Content-Type: multipart/mixed\r\n\r\nbody");
        assert!(msg.root().children.is_empty());
        assert_eq!(msg.root().body, b"body");
    }

    #[test]
    fn test_encapsulated_message() {
        let raw = b"Content-Type: multipart/mixed; boundary=m\r\n\r\n\
--m\r\n\
Content-Type: message/rfc822\r\n\
\r\n\
Subject: Inner\r\n\
Content-Type: text/plain\r\n\
\r\n\
Forwarded text\r\n\
--m--\r\n";
        let msg = Message::parse(raw);
        let inner = msg
            .walk()
            .find(|p| p.headers.get("subject") == Some("Inner"))
            .unwrap();
        assert_eq!(inner.text(), "Forwarded text");
    }

    #[test]
    fn test_charset_fallbacks() {
        let latin = Part::parse(b"Content-Type: text/plain; charset=iso-8859-1\r\n\r\ncaf\xe9");
        assert_eq!(latin.text(), "café");

        let unknown = Part::parse(b"Content-Type: text/plain; charset=x-bogus\r\n\r\nok\xff");
        assert_eq!(unknown.text(), "ok\u{FFFD}");

        let undeclared = Part::parse("\r\nnaïve".as_bytes());
        assert_eq!(undeclared.charset(), None);
        assert_eq!(undeclared.text(), "naïve");
    }

    #[test]
    fn test_bad_base64_used_raw() {
        let part = Part::parse(b"Content-Transfer-Encoding: base64\r\n\r\n!!not base64!!");
        assert_eq!(part.decoded_body(), b"!!not base64!!");
    }

    #[test]
    fn test_invalid_content_type_defaults() {
        let part = Part::parse(b"Content-Type: garbage\r\n\r\ntext");
        assert!(part.content_type().is("text", "plain"));
        assert_eq!(part.charset(), None);
    }

    #[test]
    fn test_empty_input() {
        let msg = Message::parse(b"");
        assert!(msg.headers().is_empty());
        assert!(msg.root().body.is_empty());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_arbitrary_bytes(data in proptest::collection::vec(any::<u8>(), 0..512)) {
                let msg = Message::parse(&data);
                for part in msg.walk() {
                    let _ = part.text();
                }
            }

            #[test]
            fn split_keeps_part_count(bodies in proptest::collection::vec("[a-z ]{0,20}", 1..6)) {
                let mut raw = String::from("Content-Type: multipart/mixed; boundary=zz\r\n\r\n");
                for body in &bodies {
                    raw.push_str("--zz\r\n\r\n");
                    raw.push_str(body);
                    raw.push_str("\r\n");
                }
                raw.push_str("--zz--\r\n");

                let msg = Message::parse(raw.as_bytes());
                let texts: Vec<String> = msg.root().children.iter().map(Part::text).collect();
                prop_assert_eq!(texts, bodies);
            }
        }
    }
}
