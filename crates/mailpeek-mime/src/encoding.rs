//! MIME decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header decoding.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::charset;
use crate::error::{Error, Result};

/// Base64 engine that accepts missing or superfluous padding, as mail
/// producers routinely get padding wrong.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decodes Base64 data.
///
/// Whitespace (line breaks in transfer-encoded bodies) is ignored.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    LENIENT_BASE64.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains an invalid escape sequence.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    qp_decode(data, true)
}

/// Decodes Quoted-Printable data, passing invalid escape sequences through
/// unchanged instead of failing.
#[must_use]
pub fn decode_quoted_printable_lenient(data: &[u8]) -> Vec<u8> {
    // Lenient mode never returns an error.
    qp_decode(data, false).unwrap_or_else(|_| data.to_vec())
}

fn qp_decode(data: &[u8], strict: bool) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break
        match data.get(i + 1..i + 3) {
            Some(b"\r\n") => {
                i += 3;
                continue;
            }
            _ if data.get(i + 1) == Some(&b'\n') => {
                i += 2;
                continue;
            }
            _ => {}
        }

        // Hex encoded byte
        let decoded = data
            .get(i + 1..i + 3)
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());

        match decoded {
            Some(b) => {
                result.push(b);
                i += 3;
            }
            None if strict => {
                return Err(Error::InvalidEncoding(format!(
                    "Invalid quoted-printable escape at byte {i}"
                )));
            }
            None => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    Ok(result)
}

/// One `=?charset?encoding?text?=` token.
struct EncodedWord<'a> {
    charset: &'a str,
    encoding: &'a str,
    text: &'a str,
}

impl EncodedWord<'_> {
    fn decode(&self) -> Result<String> {
        let bytes = match self.encoding.to_ascii_uppercase().as_str() {
            "B" => decode_base64(self.text.as_bytes())?,
            "Q" => {
                // Underscore stands for space in the Q encoding
                let text = self.text.replace('_', " ");
                decode_quoted_printable(text.as_bytes())?
            }
            other => {
                return Err(Error::InvalidEncoding(format!(
                    "Unknown encoding: {other}"
                )));
            }
        };
        charset::decode(&bytes, self.charset)
    }
}

/// Recognises an encoded word at the start of `s`, returning it and the
/// number of bytes it spans.
fn parse_encoded_word(s: &str) -> Option<(EncodedWord<'_>, usize)> {
    let body = s.strip_prefix("=?")?;
    let (charset, after) = body.split_once('?')?;
    let (encoding, after) = after.split_once('?')?;
    let end = after.find("?=")?;
    let text = &after[..end];

    let has_space = |v: &str| v.contains(char::is_whitespace);
    if charset.is_empty() || encoding.is_empty() {
        return None;
    }
    if has_space(charset) || has_space(encoding) || has_space(text) {
        return None;
    }

    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    Some((
        EncodedWord {
            charset,
            encoding,
            text,
        },
        consumed,
    ))
}

/// Decodes an RFC 2047 header value.
///
/// Encoded words (`=?charset?B|Q?text?=`) may appear anywhere in the value
/// and are mixed freely with plain text. Whitespace between two adjacent
/// encoded words is dropped; everything else is kept as is.
///
/// # Errors
///
/// Returns an error if an encoded word carries invalid Base64 or
/// Quoted-Printable data, an unknown encoding, or an unknown charset.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);

        if let Some((word, consumed)) = parse_encoded_word(candidate) {
            let decoded = word.decode()?;
            if !(after_word && before.chars().all(char::is_whitespace)) {
                out.push_str(before);
            }
            out.push_str(&decoded);
            after_word = true;
            rest = &candidate[consumed..];
        } else {
            out.push_str(before);
            out.push_str("=?");
            after_word = false;
            rest = &candidate[2..];
        }
    }

    out.push_str(rest);
    Ok(out)
}
