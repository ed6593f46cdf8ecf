//! Command serialization helpers.

use bytes::{BufMut, BytesMut};

use super::FetchAttribute;

/// Writes an astring (atom or quoted string).
pub fn write_astring(buf: &mut BytesMut, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        buf.put_u8(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                buf.put_u8(b'\\');
            }
            buf.put_u8(b);
        }
        buf.put_u8(b'"');
    } else {
        buf.put_slice(s.as_bytes());
    }
}

/// Returns true if the byte needs quoting.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']')
        || b < 0x20
        || b >= 0x7F
}

/// Writes FETCH items, parenthesized when there is more than one.
pub fn write_fetch_items(buf: &mut BytesMut, attrs: &[FetchAttribute]) {
    if let [attr] = attrs {
        write_fetch_attribute(buf, attr);
        return;
    }

    buf.put_u8(b'(');
    for (i, attr) in attrs.iter().enumerate() {
        if i > 0 {
            buf.put_u8(b' ');
        }
        write_fetch_attribute(buf, attr);
    }
    buf.put_u8(b')');
}

/// Writes a single FETCH attribute.
pub fn write_fetch_attribute(buf: &mut BytesMut, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Flags => buf.put_slice(b"FLAGS"),
        FetchAttribute::Uid => buf.put_slice(b"UID"),
        FetchAttribute::Rfc822Size => buf.put_slice(b"RFC822.SIZE"),
        FetchAttribute::Rfc822 => buf.put_slice(b"RFC822"),
        FetchAttribute::Body { section, peek } => {
            if *peek {
                buf.put_slice(b"BODY.PEEK[");
            } else {
                buf.put_slice(b"BODY[");
            }
            if let Some(s) = section {
                buf.put_slice(s.as_bytes());
            }
            buf.put_u8(b']');
        }
    }
}
