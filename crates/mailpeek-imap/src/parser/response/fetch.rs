//! FETCH response parsing.

use crate::parser::lexer::{Lexer, Token};
use crate::{Error, Result};

use super::helpers::parse_flag_list;
use super::types::FetchItem;

/// Parses the parenthesized data items of a FETCH response.
pub fn parse_fetch_response(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(Token::LParen)?;

    let mut items = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => match name.to_uppercase().as_str() {
                "FLAGS" => {
                    lexer.expect_space()?;
                    items.push(FetchItem::Flags(parse_flag_list(lexer)?));
                }
                "UID" => {
                    lexer.expect_space()?;
                    items.push(FetchItem::Uid(lexer.read_number()?));
                }
                "RFC822.SIZE" => {
                    lexer.expect_space()?;
                    items.push(FetchItem::Rfc822Size(lexer.read_number()?));
                }
                "INTERNALDATE" => {
                    lexer.expect_space()?;
                    if let Token::QuotedString(date) = lexer.next_token()? {
                        items.push(FetchItem::InternalDate(date));
                    }
                }
                "BODY" | "BODY.PEEK" | "RFC822" | "RFC822.HEADER" | "RFC822.TEXT" => {
                    let (section, origin) = parse_body_section_and_origin(lexer);
                    lexer.expect_space()?;
                    let data = match lexer.next_token()? {
                        Token::Literal(d) => Some(d.to_vec()),
                        Token::QuotedString(s) => Some(s.into_bytes()),
                        _ => None,
                    };
                    items.push(FetchItem::Body {
                        section,
                        origin,
                        data,
                    });
                }
                _ => skip_fetch_item(lexer),
            },
            Token::Eof => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: "Unterminated FETCH data".to_string(),
                });
            }
            _ => {}
        }
    }

    Ok(items)
}

/// Parses the optional `[section]` and `<origin>` following a body item.
fn parse_body_section_and_origin(lexer: &mut Lexer<'_>) -> (Option<String>, Option<u32>) {
    let mut section = None;
    let mut origin = None;

    if lexer.peek() == Some(b'[') {
        lexer.advance();
        let mut buf = String::new();
        while let Some(b) = lexer.advance() {
            if b == b']' {
                break;
            }
            buf.push(char::from(b));
        }
        if !buf.is_empty() {
            section = Some(buf);
        }
    }

    if lexer.peek() == Some(b'<') {
        lexer.advance();
        let mut buf = String::new();
        while let Some(b) = lexer.advance() {
            if b == b'>' {
                break;
            }
            buf.push(char::from(b));
        }
        origin = buf.parse().ok();
    }

    (section, origin)
}

/// Skips the value of an item we don't interpret (atom, string, list).
fn skip_fetch_item(lexer: &mut Lexer<'_>) {
    if lexer.peek() == Some(b' ') {
        lexer.advance();
    }

    let mut paren_depth = 0usize;
    loop {
        match lexer.peek() {
            Some(b'(') => {
                paren_depth += 1;
                lexer.advance();
            }
            Some(b')') => {
                if paren_depth == 0 {
                    break;
                }
                paren_depth -= 1;
                lexer.advance();
            }
            Some(b' ') if paren_depth == 0 => break,
            Some(b'{' | b'"') => {
                // Let the lexer consume literals and quoted strings whole
                if lexer.next_token().is_err() {
                    lexer.advance();
                }
            }
            Some(_) => {
                lexer.advance();
            }
            None => break,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(data: &[u8]) -> Vec<FetchItem> {
        parse_fetch_response(&mut Lexer::new(data)).unwrap()
    }

    #[test]
    fn test_uid_and_flags() {
        let items = parse(b"(UID 123 FLAGS (\\Seen))");
        assert_eq!(
            items,
            vec![
                FetchItem::Uid(123),
                FetchItem::Flags(vec!["\\Seen".to_string()]),
            ]
        );
    }

    #[test]
    fn test_body_literal() {
        let items = parse(b"(BODY[] {11}\r\nSubject: x\n)");
        assert_eq!(
            items,
            vec![FetchItem::Body {
                section: None,
                origin: None,
                data: Some(b"Subject: x\n".to_vec()),
            }]
        );
    }

    #[test]
    fn test_rfc822_followed_by_flags() {
        let items = parse(b"(RFC822 {2}\r\nhi FLAGS (\\Seen))");
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], FetchItem::Body { data: Some(d), .. } if d == b"hi"));
        assert!(matches!(&items[1], FetchItem::Flags(f) if f == &["\\Seen"]));
    }

    #[test]
    fn test_body_nil() {
        let items = parse(b"(BODY[] NIL)");
        assert!(matches!(&items[0], FetchItem::Body { data: None, .. }));
    }

    #[test]
    fn test_section_and_origin() {
        let items = parse(b"(BODY[HEADER.FIELDS (SUBJECT)]<0> \"x\")");
        assert_eq!(
            items,
            vec![FetchItem::Body {
                section: Some("HEADER.FIELDS (SUBJECT)".to_string()),
                origin: Some(0),
                data: Some(b"x".to_vec()),
            }]
        );
    }

    #[test]
    fn test_unknown_items_skipped() {
        let items = parse(b"(X-GM-LABELS (\"\\\\Inbox\" foo) MODSEQ (12) UID 5)");
        assert_eq!(items, vec![FetchItem::Uid(5)]);
    }

    #[test]
    fn test_unterminated() {
        assert!(parse_fetch_response(&mut Lexer::new(b"(UID 5")).is_err());
    }
}
