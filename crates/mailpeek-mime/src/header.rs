//! Header block parsing.

use crate::encoding::decode_rfc2047;
use crate::error::Result;

/// Header fields of one entity, in the order they appeared.
///
/// Lookups ignore case. A repeated field keeps every occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// An empty header block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// First value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    /// Every value of `name`, in order.
    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.fields
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over `(name, value)` pairs with names as written.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses a header block.
    ///
    /// Stops at the first empty line. Folded lines (leading space or tab)
    /// are joined to the previous field with a single space. Lines without
    /// a colon are dropped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut pending: Option<(String, String)> = None;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = pending.as_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }

            if let Some((name, value)) = pending.take() {
                headers.add(name, value.trim_end());
            }
            pending = line
                .split_once(':')
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()));
        }

        if let Some((name, value)) = pending {
            headers.add(name, value.trim_end());
        }

        headers
    }

    /// Decodes RFC 2047 encoded words in a field value.
    ///
    /// # Errors
    ///
    /// Returns an error if an encoded word is malformed.
    pub fn decode_value(value: &str) -> Result<String> {
        decode_rfc2047(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let mut headers = Headers::new();
        headers.add("Message-ID", "<1@x>");
        assert_eq!(headers.get("message-id"), Some("<1@x>"));
        assert_eq!(headers.get("MESSAGE-ID"), Some("<1@x>"));
        assert_eq!(headers.get("Subject"), None);
    }

    #[test]
    fn repeated_fields_keep_order() {
        let headers = Headers::parse("Received: hop 1\r\nX-A: a\r\nReceived: hop 2\r\n");
        assert_eq!(headers.get("received"), Some("hop 1"));
        assert_eq!(
            headers.get_all("Received").collect::<Vec<_>>(),
            vec!["hop 1", "hop 2"]
        );
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.iter().nth(1), Some(("X-A", "a")));
    }

    #[test]
    fn parse_stops_at_blank_line() {
        let text = "Subject: Quarterly report\r\n\
Content-Type: text/plain;\r\n\
\tcharset=\"iso-8859-1\"\r\n\
\r\n\
Not-A-Header: part of the body\r\n";

        let headers = Headers::parse(text);
        assert_eq!(headers.get("subject"), Some("Quarterly report"));
        assert_eq!(
            headers.get("content-type"),
            Some("text/plain; charset=\"iso-8859-1\"")
        );
        assert_eq!(headers.get("not-a-header"), None);
    }

    #[test]
    fn junk_lines_dropped() {
        let headers = Headers::parse("garbage line\nTo: a@b.c\n");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("to"), Some("a@b.c"));
    }

    #[test]
    fn folded_encoded_words_decode() {
        let headers = Headers::parse("Subject: =?utf-8?Q?Hello?=\r\n =?utf-8?Q?_World?=\r\n");
        let raw = headers.get("subject").unwrap();
        assert_eq!(Headers::decode_value(raw).unwrap(), "Hello World");
    }
}
