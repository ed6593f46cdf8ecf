//! Raw message to [`MessageRecord`] conversion.

use mailpeek_mime::{Headers, Message};
use serde::{Deserialize, Serialize};

/// Normalized view of one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Decoded `Subject`.
    pub subject: String,
    /// Decoded `From`.
    pub from: String,
    /// Decoded `To`.
    pub to: String,
    /// Decoded `Date`.
    pub date: String,
    /// `Message-ID`, as sent.
    pub message_id: String,
    /// Plain-text body.
    pub body_text: String,
    /// HTML body, or the plain body wrapped in `<pre>` when there is none.
    pub body_html: String,
}

/// Decodes a raw RFC 5322 message.
///
/// Never fails: undecodable headers are kept raw, undecodable bodies are
/// decoded as lossy UTF-8.
#[must_use]
pub fn decode_message(raw: &[u8]) -> MessageRecord {
    let message = Message::parse(raw);

    let (body_text, mut body_html) = extract_bodies(&message);
    if body_html.is_empty() && !body_text.is_empty() {
        body_html = render_pre(&body_text);
    }

    MessageRecord {
        subject: decode_header(message.subject()),
        from: decode_header(message.from()),
        to: decode_header(message.to()),
        date: decode_header(message.date()),
        message_id: message.message_id().unwrap_or_default().to_string(),
        body_text,
        body_html,
    }
}

/// Decodes RFC 2047 encoded words, keeping the raw value on failure.
#[must_use]
pub fn decode_header(value: Option<&str>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    Headers::decode_value(value).unwrap_or_else(|_| value.to_string())
}

fn extract_bodies(message: &Message) -> (String, String) {
    let root = message.root();
    if root.children.is_empty() {
        let text = root.text().trim().to_string();
        return if root.content_type().is("text", "html") {
            (String::new(), text)
        } else {
            (text, String::new())
        };
    }

    let mut plain = Vec::new();
    let mut html = Vec::new();

    for part in message.walk() {
        if part.is_multipart() || part.is_attachment() {
            continue;
        }
        let content_type = part.content_type();
        if content_type.is("text", "plain") {
            plain.push(part.text());
        } else if content_type.is("text", "html") {
            html.push(part.text());
        }
    }

    (
        plain.join("\n").trim().to_string(),
        html.join("\n").trim().to_string(),
    )
}

/// Escapes text for inclusion in HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Wraps plain text so it renders with its line breaks intact.
#[must_use]
pub fn render_pre(text: &str) -> String {
    format!(
        "<pre style='white-space:pre-wrap;margin:0'>{}</pre>",
        escape_html(text)
    )
}
