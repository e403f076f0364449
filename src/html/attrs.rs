//! Forward-scan helpers over the token stream.
//!
//! Both helpers are meant to be called right after a `TagOpen` token and
//! consume from the same iterator the caller is walking. They stop at the
//! end of the current tag, so a tag that closes before the wanted
//! attribute shows up simply yields nothing.

use super::token::{Token, TokenKind};

/// Scan forward to the value of the named attribute within the current
/// tag. Returns the value without its canonical quotes. A scan that runs
/// past the end of the tag (self-closing, valueless, or unterminated)
/// returns `None`.
pub fn find_attr_value<'a, I>(tokens: &mut I, name: &str) -> Option<String>
where
    I: Iterator<Item = Token<'a>>,
{
    while let Some(token) = tokens.next() {
        if token.ends_tag() {
            return None;
        }
        if token.kind == TokenKind::AttrName && token.value == name {
            for token in tokens.by_ref() {
                if token.ends_tag() || token.kind == TokenKind::AttrEnd {
                    return None;
                }
                if token.kind == TokenKind::AttrValue {
                    return Some(token.unquoted().to_string());
                }
            }
            return None;
        }
    }
    None
}

/// Collect every `(name, value)` pair of the current tag. Valueless
/// attributes map to an empty string.
pub fn tag_attributes<'a, I>(tokens: &mut I) -> Vec<(String, String)>
where
    I: Iterator<Item = Token<'a>>,
{
    let mut attrs = Vec::new();
    let mut current: Option<String> = None;
    for token in tokens.by_ref() {
        if token.ends_tag() {
            break;
        }
        match token.kind {
            TokenKind::AttrName => {
                if let Some(name) = current.take() {
                    attrs.push((name, String::new()));
                }
                current = Some(token.value.into_owned());
            }
            TokenKind::AttrValue => {
                if let Some(name) = current.take() {
                    attrs.push((name, token.unquoted().to_string()));
                }
            }
            _ => {}
        }
    }
    if let Some(name) = current {
        attrs.push((name, String::new()));
    }
    attrs
}
