//! Streaming markup lexer.
//!
//! A hand-rolled pull-based tokenizer: `Lexer` implements `Iterator` and
//! produces one token per call, forward-only, with no backtracking. An
//! explicit mode stack tracks the lexing context (`main`, `tag`,
//! `attribute`, `comment`); each mode has exactly one exit path that pops
//! back. Malformed markup degrades to `Text` tokens, it never errors.
//!
//! The lexer knows nothing about tag semantics. `<script>` is just a tag;
//! interpretation lives in the scan and preload layers.

use std::borrow::Cow;

use super::token::{Token, TokenKind};

/// Lexing context. Entering a tag pushes `Tag`, `=` inside a tag pushes
/// `Attribute`, `<!--` pushes `Comment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Main,
    Tag,
    Attribute,
    Comment,
}

/// Pull-based tokenizer over a markup document.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    modes: Vec<Mode>,
    at_line_start: bool,
    /// Zero-width `AttrEnd` marker queued behind an `AttrValue`.
    pending: Option<Token<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            modes: Vec::new(),
            at_line_start: true,
            pending: None,
        }
    }

    fn mode(&self) -> Mode {
        self.modes.last().copied().unwrap_or(Mode::Main)
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Cut a token ending at absolute byte offset `end` and advance.
    fn emit(&mut self, kind: TokenKind, end: usize, value: Option<Cow<'a, str>>) -> Token<'a> {
        let text = &self.input[self.pos..end];
        let offset = self.pos;
        self.pos = end;
        self.at_line_start = kind == TokenKind::Newline;
        let value = value.unwrap_or(Cow::Borrowed(text));
        Token::new(kind, text, value, offset)
    }

    fn next_main(&mut self) -> Token<'a> {
        let rest = self.rest();
        let bytes = rest.as_bytes();

        if rest.starts_with("<!--") {
            self.modes.push(Mode::Comment);
            return self.emit(TokenKind::CommentStart, self.pos + 4, None);
        }

        // Declarations (`<!doctype html>` and friends) as one opaque token.
        if rest.starts_with("<!") {
            let end = match bytes.iter().position(|&b| b == b'>') {
                Some(i) => self.pos + i + 1,
                None => self.input.len(),
            };
            let value = lowercase(&self.input[self.pos..end]);
            return self.emit(TokenKind::DocType, end, Some(value));
        }

        if rest.starts_with("</") && bytes.get(2).is_some_and(u8::is_ascii_alphabetic) {
            let end = match bytes.iter().position(|&b| b == b'>') {
                Some(i) => self.pos + i + 1,
                None => self.input.len(),
            };
            let value = normalize_name(&self.input[self.pos..end]);
            return self.emit(TokenKind::TagClose, end, Some(value));
        }

        if bytes[0] == b'<' && bytes.get(1).is_some_and(u8::is_ascii_alphabetic) {
            let mut end = 1;
            while let Some(&b) = bytes.get(end) {
                if b.is_ascii_whitespace() || matches!(b, b'>' | b'/') {
                    break;
                }
                end += 1;
            }
            self.modes.push(Mode::Tag);
            let value = normalize_name(&rest[1..end]);
            return self.emit(TokenKind::TagOpen, self.pos + end, Some(value));
        }

        if bytes[0] == b'\r' && bytes.get(1) == Some(&b'\n') {
            return self.emit(TokenKind::Newline, self.pos + 2, None);
        }
        if bytes[0] == b'\n' {
            return self.emit(TokenKind::Newline, self.pos + 1, None);
        }

        if self.at_line_start && matches!(bytes[0], b' ' | b'\t') {
            let mut end = 0;
            while matches!(bytes.get(end).copied(), Some(b' ' | b'\t')) {
                end += 1;
            }
            return self.emit(TokenKind::Indent, self.pos + end, None);
        }

        // Text run up to the next markup or line boundary. Starts at one
        // byte so an orphan `<` cannot stall the lexer.
        let mut end = 1;
        while let Some(&b) = bytes.get(end) {
            if matches!(b, b'<' | b'\n' | b'\r') {
                break;
            }
            end += 1;
        }
        self.emit(TokenKind::Text, self.pos + end, None)
    }

    fn next_tag(&mut self) -> Token<'a> {
        let rest = self.rest();
        let bytes = rest.as_bytes();

        if rest.starts_with("/>") {
            self.modes.pop();
            return self.emit(TokenKind::TagSelfClose, self.pos + 2, None);
        }
        match bytes[0] {
            b'>' => {
                self.modes.pop();
                self.emit(TokenKind::TagEnd, self.pos + 1, None)
            }
            b'=' => {
                self.modes.push(Mode::Attribute);
                self.emit(TokenKind::AttrAssignment, self.pos + 1, None)
            }
            _ => {
                // Attribute name: leading whitespace plus one name run.
                let mut end = 0;
                while bytes.get(end).is_some_and(u8::is_ascii_whitespace) {
                    end += 1;
                }
                while let Some(&b) = bytes.get(end) {
                    if b.is_ascii_whitespace() || matches!(b, b'=' | b'>' | b'/') {
                        break;
                    }
                    end += 1;
                }
                // A structural byte with no name and no whitespace before
                // it is junk (stray quote or slash); swallow it alone so
                // the stream keeps moving.
                if end == 0 {
                    end = 1;
                }
                let value = normalize_name(&rest[..end]);
                self.emit(TokenKind::AttrName, self.pos + end, Some(value))
            }
        }
    }

    fn next_attribute(&mut self) -> Token<'a> {
        let rest = self.rest();
        let bytes = rest.as_bytes();

        let mut ws = 0;
        while bytes.get(ws).is_some_and(u8::is_ascii_whitespace) {
            ws += 1;
        }

        // `href=>`, `href=/>`, or assignment at end of input: no value.
        let ended = match bytes.get(ws).copied() {
            None | Some(b'>') => true,
            Some(b'/') if bytes.get(ws + 1) == Some(&b'>') => true,
            _ => false,
        };
        if ended {
            self.modes.pop();
            return self.emit(TokenKind::AttrEnd, self.pos + ws, Some(Cow::Borrowed("")));
        }

        let (end, inner) = match bytes[ws] {
            q @ (b'"' | b'\'') => {
                let inner_start = ws + 1;
                match bytes[inner_start..].iter().position(|&b| b == q) {
                    Some(i) => (
                        self.pos + inner_start + i + 1,
                        &rest[inner_start..inner_start + i],
                    ),
                    // Unterminated quote: best effort, value runs to EOF.
                    None => (self.input.len(), &rest[inner_start..]),
                }
            }
            _ => {
                let mut end = ws;
                while let Some(&b) = bytes.get(end) {
                    if b.is_ascii_whitespace() || b == b'>' {
                        break;
                    }
                    end += 1;
                }
                (self.pos + end, &rest[ws..end])
            }
        };

        self.modes.pop();
        let token = self.emit(
            TokenKind::AttrValue,
            end,
            Some(Cow::Owned(format!("\"{inner}\""))),
        );
        self.pending = Some(Token::new(
            TokenKind::AttrEnd,
            "",
            Cow::Borrowed(""),
            self.pos,
        ));
        token
    }

    fn next_comment(&mut self) -> Token<'a> {
        let rest = self.rest();
        if rest.starts_with("-->") {
            self.modes.pop();
            return self.emit(TokenKind::CommentEnd, self.pos + 3, None);
        }
        match rest.find("-->") {
            Some(i) => self.emit(TokenKind::CommentBody, self.pos + i, None),
            None => {
                // Unterminated comment swallows the remaining input.
                self.modes.pop();
                self.emit(TokenKind::CommentBody, self.input.len(), None)
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if let Some(token) = self.pending.take() {
            return Some(token);
        }
        if self.pos >= self.input.len() {
            return None;
        }
        let token = match self.mode() {
            Mode::Main => self.next_main(),
            Mode::Tag => self.next_tag(),
            Mode::Attribute => self.next_attribute(),
            Mode::Comment => self.next_comment(),
        };
        Some(token)
    }
}

/// Lower-case a tag/attribute name and strip interior whitespace.
fn normalize_name(text: &str) -> Cow<'_, str> {
    if text
        .chars()
        .any(|c| c.is_ascii_uppercase() || c.is_whitespace())
    {
        Cow::Owned(
            text.chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| c.to_ascii_lowercase())
                .collect(),
        )
    } else {
        Cow::Borrowed(text)
    }
}

fn lowercase(text: &str) -> Cow<'_, str> {
    if text.chars().any(|c| c.is_ascii_uppercase()) {
        Cow::Owned(text.to_ascii_lowercase())
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).map(|t| t.kind).collect()
    }

    /// Concatenated token texts must reproduce the input, and offsets must
    /// be contiguous.
    fn assert_round_trip(input: &str) {
        let mut rebuilt = String::new();
        let mut cursor = 0;
        for token in Lexer::new(input) {
            assert_eq!(token.offset, cursor, "offset gap in {input:?}");
            cursor += token.text.len();
            rebuilt.push_str(token.text);
        }
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn test_round_trip_document() {
        assert_round_trip(concat!(
            "<!DOCTYPE html>\n",
            "<html>\n",
            "  <head>\n",
            "    <!-- a comment with <tags> inside -->\n",
            "    <link rel='stylesheet' href=\"/main.css\">\n",
            "  </head>\n",
            "  <body>\n",
            "    <p class=intro>Hello & welcome</p>\n",
            "    <br/>\n",
            "  </body>\n",
            "</html>\n",
        ));
    }

    #[test]
    fn test_round_trip_malformed() {
        assert_round_trip("a < b > c");
        assert_round_trip("<div");
        assert_round_trip("<a href=");
        assert_round_trip("<a href=\"unterminated");
        assert_round_trip("<!-- never closed");
        assert_round_trip("< ");
        assert_round_trip("text<");
        assert_round_trip("<a href=\"x\" >");
        assert_round_trip("<a \"junk\">");
    }

    #[test]
    fn test_trailing_space_before_tag_end() {
        let kinds = kinds("<a href=\"x\" >");
        assert_eq!(kinds.last(), Some(&TokenKind::TagEnd));
    }

    #[test]
    fn test_tag_open_normalized() {
        let token = Lexer::new("<DIV id=x>").next().unwrap();
        assert_eq!(token.kind, TokenKind::TagOpen);
        assert_eq!(token.text, "<DIV");
        assert_eq!(token.value, "div");
    }

    #[test]
    fn test_tag_close_normalized() {
        let tokens: Vec<_> = Lexer::new("</ HEAD >").collect();
        // `</` not followed by a letter is text, so use a spaced name form
        // that the close-tag rule does accept.
        assert!(tokens.iter().all(|t| t.kind != TokenKind::TagClose));

        let token = Lexer::new("</HEAD >").next().unwrap();
        assert_eq!(token.kind, TokenKind::TagClose);
        assert_eq!(token.value, "</head>");
        assert_eq!(token.text, "</HEAD >");
    }

    #[test]
    fn test_attribute_quote_styles() {
        for doc in ["<a href=\"/x\">", "<a href='/x'>", "<a href=/x>"] {
            let value = Lexer::new(doc)
                .find(|t| t.kind == TokenKind::AttrValue)
                .unwrap();
            assert_eq!(value.value, "\"/x\"", "in {doc:?}");
            assert_round_trip(doc);
        }
    }

    #[test]
    fn test_attribute_name_normalized() {
        let name = Lexer::new("<a  HREF='/x'>")
            .find(|t| t.kind == TokenKind::AttrName)
            .unwrap();
        assert_eq!(name.text, "  HREF");
        assert_eq!(name.value, "href");
    }

    #[test]
    fn test_attr_end_follows_value() {
        let kinds = kinds("<a href=\"/x\">");
        assert_eq!(
            kinds,
            vec![
                TokenKind::TagOpen,
                TokenKind::AttrName,
                TokenKind::AttrAssignment,
                TokenKind::AttrValue,
                TokenKind::AttrEnd,
                TokenKind::TagEnd,
            ]
        );
    }

    #[test]
    fn test_boolean_attribute_has_no_value() {
        let kinds = kinds("<script defer>");
        assert_eq!(
            kinds,
            vec![TokenKind::TagOpen, TokenKind::AttrName, TokenKind::TagEnd]
        );
    }

    #[test]
    fn test_comment_is_opaque() {
        let tokens: Vec<_> = Lexer::new("<!-- <script src=\"evil.js\"> -->").collect();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::CommentStart,
                TokenKind::CommentBody,
                TokenKind::CommentEnd,
            ]
        );
        assert_eq!(tokens[1].text, " <script src=\"evil.js\"> ");
    }

    #[test]
    fn test_empty_comment() {
        assert_eq!(
            kinds("<!---->"),
            vec![TokenKind::CommentStart, TokenKind::CommentEnd]
        );
    }

    #[test]
    fn test_doctype() {
        let token = Lexer::new("<!DOCTYPE html>").next().unwrap();
        assert_eq!(token.kind, TokenKind::DocType);
        assert_eq!(token.value, "<!doctype html>");
    }

    #[test]
    fn test_indent_and_newline() {
        let tokens: Vec<_> = Lexer::new("<p>\n  <b>\n").collect();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::TagOpen,
                TokenKind::TagEnd,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::TagOpen,
                TokenKind::TagEnd,
                TokenKind::Newline,
            ]
        );
        assert_eq!(tokens[3].text, "  ");
        assert!(tokens[2].line_breaks);
        assert!(!tokens[3].line_breaks);
    }

    #[test]
    fn test_mid_line_whitespace_is_text() {
        let kinds = kinds("a  b");
        assert_eq!(kinds, vec![TokenKind::Text]);
    }

    #[test]
    fn test_self_closing_tag() {
        assert_eq!(
            kinds("<br/>"),
            vec![TokenKind::TagOpen, TokenKind::TagSelfClose]
        );
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let tokens: Vec<_> = Lexer::new("1 < 2").collect();
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Text));
        assert_round_trip("1 < 2");
    }
}
