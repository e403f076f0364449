//! Offset-tracked document rewriting.
//!
//! Injects markup fragments right before `</head>` and `</body>` without
//! a parse/re-serialize round trip. The token walk runs exactly once over
//! the unmodified document; insertion points use the original token
//! offsets corrected by the cumulative length of earlier insertions, so
//! the document is never re-tokenized.

use super::lexer::Lexer;
use super::token::TokenKind;

/// Fragments to splice in before the matching close tags. A `None` slot
/// leaves that boundary untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct Injection<'a> {
    pub head_end: Option<&'a str>,
    pub body_end: Option<&'a str>,
}

/// Splice the fragments into `doc`, preserving the document's indentation
/// style. Each fragment is placed one indent level below the line that
/// holds the close tag (two extra spaces, or a tab for tab-indented
/// documents). Returns the document unchanged when no target tag exists.
pub fn inject(doc: &str, injection: Injection<'_>) -> String {
    let mut head_end = injection.head_end.filter(|f| !f.is_empty());
    let mut body_end = injection.body_end.filter(|f| !f.is_empty());
    if head_end.is_none() && body_end.is_none() {
        return doc.to_string();
    }

    let mut out = doc.to_string();
    let mut inserted = 0;
    let mut indent = "";

    for token in Lexer::new(doc) {
        match token.kind {
            TokenKind::Indent => indent = token.text,
            TokenKind::TagClose => {
                let fragment = match token.value.as_ref() {
                    "</head>" => head_end.take(),
                    "</body>" => body_end.take(),
                    _ => None,
                };
                if let Some(fragment) = fragment {
                    let text = indented(fragment, indent);
                    out.insert_str(token.offset + inserted, &text);
                    inserted += text.len();
                }
            }
            _ => {}
        }
    }
    out
}

/// Lay a fragment out at one indent level below `indent`. The insertion
/// point sits after the close tag's own indent, so the first line only
/// adds the extra level; continuation lines carry the full child indent,
/// and the trailing indent re-aligns the close tag.
fn indented(fragment: &str, indent: &str) -> String {
    let extra = if indent.contains('\t') { "\t" } else { "  " };
    let child = format!("{indent}{extra}");

    let mut text = String::new();
    for (i, line) in fragment.trim_end().lines().enumerate() {
        text.push_str(if i == 0 { extra } else { &child });
        text.push_str(line);
        text.push('\n');
    }
    text.push_str(indent);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_head_close() {
        let doc = "<html><head></head></html>";
        let out = inject(
            doc,
            Injection {
                head_end: Some("<x/>"),
                body_end: None,
            },
        );
        let at = out.find("<x/>").unwrap();
        assert!(at < out.find("</head>").unwrap());
        // Everything outside the insertion is byte-identical.
        assert_eq!(out.replace("  <x/>\n", ""), doc);
    }

    #[test]
    fn test_inject_preserves_space_indent() {
        let doc = "<html>\n  <head>\n  </head>\n</html>\n";
        let out = inject(
            doc,
            Injection {
                head_end: Some("<x/>"),
                body_end: None,
            },
        );
        assert_eq!(out, "<html>\n  <head>\n    <x/>\n  </head>\n</html>\n");
    }

    #[test]
    fn test_inject_preserves_tab_indent() {
        let doc = "<html>\n\t<head>\n\t</head>\n</html>\n";
        let out = inject(
            doc,
            Injection {
                head_end: Some("<x/>"),
                body_end: None,
            },
        );
        assert_eq!(out, "<html>\n\t<head>\n\t\t<x/>\n\t</head>\n</html>\n");
    }

    #[test]
    fn test_inject_both_boundaries() {
        let doc = "<html>\n  <head>\n  </head>\n  <body>\n  </body>\n</html>\n";
        let out = inject(
            doc,
            Injection {
                head_end: Some("<h/>"),
                body_end: Some("<b/>"),
            },
        );
        assert_eq!(
            out,
            "<html>\n  <head>\n    <h/>\n  </head>\n  <body>\n    <b/>\n  </body>\n</html>\n"
        );
    }

    #[test]
    fn test_inject_multiline_fragment() {
        let doc = "<html>\n  <head>\n  </head>\n</html>\n";
        let out = inject(
            doc,
            Injection {
                head_end: Some("<a/>\n<b/>"),
                body_end: None,
            },
        );
        assert_eq!(
            out,
            "<html>\n  <head>\n    <a/>\n    <b/>\n  </head>\n</html>\n"
        );
    }

    #[test]
    fn test_inject_without_targets_is_identity() {
        let doc = "<div>no head here</div>";
        let out = inject(
            doc,
            Injection {
                head_end: Some("<x/>"),
                body_end: Some("<y/>"),
            },
        );
        assert_eq!(out, doc);
    }

    #[test]
    fn test_inject_only_first_close_tag() {
        let doc = "<head></head><head></head>";
        let out = inject(
            doc,
            Injection {
                head_end: Some("<x/>"),
                body_end: None,
            },
        );
        assert_eq!(out.matches("<x/>").count(), 1);
    }

    #[test]
    fn test_comment_close_tag_is_ignored() {
        let doc = "<html><!-- </head> --><head></head></html>";
        let out = inject(
            doc,
            Injection {
                head_end: Some("<x/>"),
                body_end: None,
            },
        );
        let at = out.find("<x/>").unwrap();
        assert!(at > out.find("-->").unwrap());
    }
}
