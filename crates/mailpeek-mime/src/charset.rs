//! Character set conversion.
//!
//! Charset labels are resolved through the WHATWG encoding registry, which
//! covers every label commonly seen in mail (`utf-8`, `iso-8859-*`,
//! `windows-125*`, `koi8-r`, `gb2312`, `shift_jis`, ...).

use encoding_rs::{Encoding, UTF_8};

use crate::error::{Error, Result};

/// Looks up an encoding by its MIME charset label.
///
/// RFC 2231 language suffixes (`utf-8*en`) are ignored.
///
/// # Errors
///
/// Returns [`Error::UnknownCharset`] if the label is not recognised.
pub fn lookup(label: &str) -> Result<&'static Encoding> {
    let label = label.split('*').next().unwrap_or(label).trim();
    Encoding::for_label(label.as_bytes()).ok_or_else(|| Error::UnknownCharset(label.to_string()))
}

/// Decodes bytes in the given charset, replacing malformed sequences.
///
/// # Errors
///
/// Returns [`Error::UnknownCharset`] if the label is not recognised.
pub fn decode(bytes: &[u8], label: &str) -> Result<String> {
    let encoding = lookup(label)?;
    let (text, _, _) = encoding.decode(bytes);
    Ok(text.into_owned())
}

/// Decodes bytes using the declared charset if there is one and it is known,
/// and lossy UTF-8 otherwise. Never fails.
#[must_use]
pub fn decode_lossy(bytes: &[u8], label: Option<&str>) -> String {
    label
        .and_then(|l| decode(bytes, l).ok())
        .unwrap_or_else(|| {
            let (text, _, _) = UTF_8.decode(bytes);
            text.into_owned()
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode("Héllo".as_bytes(), "UTF-8").unwrap(), "Héllo");
    }

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode(b"caf\xe9", "iso-8859-1").unwrap(), "café");
    }

    #[test]
    fn test_decode_koi8r() {
        // "Привет" in KOI8-R
        let bytes = [0xF0, 0xD2, 0xC9, 0xD7, 0xC5, 0xD4];
        assert_eq!(decode(&bytes, "koi8-r").unwrap(), "Привет");
    }

    #[test]
    fn test_language_suffix_ignored() {
        assert_eq!(decode(b"abc", "utf-8*en").unwrap(), "abc");
    }

    #[test]
    fn test_unknown_charset() {
        assert!(matches!(
            decode(b"abc", "x-no-such-charset"),
            Err(Error::UnknownCharset(_))
        ));
    }

    #[test]
    fn test_decode_lossy_fallbacks() {
        assert_eq!(decode_lossy(b"ok\xff", None), "ok\u{FFFD}");
        assert_eq!(decode_lossy(b"ok\xff", Some("bogus")), "ok\u{FFFD}");
        assert_eq!(decode_lossy(b"\xe9", Some("latin1")), "é");
    }
}
