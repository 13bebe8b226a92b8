//! Structural parser: text → [`Document`].
//!
//! The parser never fails on content.  Every physical line becomes exactly one
//! header or [`Node`]; a line that matches no known shape is kept verbatim as
//! a comment with an empty indicator.  The only failure is at the byte level:
//! [`parse_bytes`] rejects input that is not valid UTF-8.
//!
//! # Line classification
//!
//! ```text
//! ""  / "   "          → Blank
//! "# text" / "; text"  → Comment { indicator: "#", text: " text" }
//! "[name] ; note"      → new Section, header with trailing comment
//! "key = value"        → KeyValue { key: "key", delimiter: " = ", value: "value" }
//! anything else        → Comment { indicator: "", text: <raw line> }
//! ```

use thiserror::Error;
use tracing::debug;

use crate::domain::document::{Document, Header, Line, Node, Section, TrailingComment, Value};
use crate::format::dialect::Dialect;

const BOM: char = '\u{feff}';
const DEFAULT_NEWLINE: &str = "\n";

/// Errors that can occur while turning bytes into a document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The input bytes are not valid UTF-8 text.
    #[error("configuration is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parses configuration text with the default [`Dialect`].
///
/// # Examples
///
/// ```rust
/// use nodeconf_core::{parse, serialize};
///
/// let text = "foo=1\n[main]\nbar = 2\n";
/// let doc = parse(text);
/// assert_eq!(doc.sections.len(), 2);
/// assert_eq!(serialize(&doc), text);
/// ```
pub fn parse(text: &str) -> Document {
    parse_with(text, &Dialect::default())
}

/// Decodes `bytes` as UTF-8 and parses the result.
///
/// # Errors
///
/// Returns [`ParseError::InvalidUtf8`] when the bytes cannot be decoded.
pub fn parse_bytes(bytes: &[u8]) -> Result<Document, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ParseError::InvalidUtf8 {
        valid_up_to: e.valid_up_to(),
    })?;
    Ok(parse(text))
}

/// Parses configuration text with an explicit [`Dialect`].
pub fn parse_with(text: &str, dialect: &Dialect) -> Document {
    let (bom, body) = match text.strip_prefix(BOM) {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let mut sections: Vec<Section> = Vec::new();
    let mut current = Section::global(String::new());
    let mut unrecognized = 0usize;

    for (content, eol) in split_lines(body) {
        match parse_header(content, eol, dialect) {
            Some(header) => {
                finish_section(&mut sections, current);
                current = Section::with_header(header, String::new());
            }
            None => {
                let line = parse_line(content, dialect);
                if line.is_unrecognized() {
                    unrecognized += 1;
                }
                current.nodes.push(Node::new(line, eol));
            }
        }
        if current.newline.is_empty() && !eol.is_empty() {
            current.newline = eol.to_string();
        }
    }
    finish_section(&mut sections, current);

    debug!(
        sections = sections.len(),
        unrecognized, "parsed configuration document"
    );

    Document { bom, sections }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Splits text into `(content, terminator)` pairs.
///
/// `"\r\n"` is kept together as one terminator; a final line without a
/// newline gets an empty terminator.  Empty input yields no lines.
fn split_lines(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.split_inclusive('\n').map(|piece| {
        if let Some(content) = piece.strip_suffix("\r\n") {
            (content, "\r\n")
        } else if let Some(content) = piece.strip_suffix('\n') {
            (content, "\n")
        } else {
            (piece, "")
        }
    })
}

/// Pushes a finished section, dropping an implicit leading section that
/// never received a line.
fn finish_section(sections: &mut Vec<Section>, mut section: Section) {
    if section.header.is_none() && section.nodes.is_empty() {
        return;
    }
    if section.newline.is_empty() {
        section.newline = sections
            .last()
            .map(|s| s.newline.clone())
            .unwrap_or_else(|| DEFAULT_NEWLINE.to_string());
    }
    sections.push(section);
}

/// Splits leading whitespace off `text`.
fn split_indent(text: &str) -> (&str, &str) {
    let rest = text.trim_start();
    (&text[..text.len() - rest.len()], rest)
}

/// Recognizes `[name]`, optionally followed by whitespace and a comment.
fn parse_header(content: &str, eol: &str, dialect: &Dialect) -> Option<Header> {
    let (indent, rest) = split_indent(content);
    let inner = rest.strip_prefix('[')?;
    let close = inner.find(']')?;
    let raw_name = &inner[..close];
    let (gap, after) = split_indent(&inner[close + 1..]);

    let trailing_comment = match after.chars().next() {
        None => None,
        Some(c) if dialect.is_comment_indicator(c) => Some(TrailingComment {
            indicator: c.to_string(),
            text: after[c.len_utf8()..].to_string(),
        }),
        // Text after `]` that is not a comment: not a header.
        Some(_) => return None,
    };

    Some(Header {
        indent: indent.to_string(),
        raw_name: raw_name.to_string(),
        gap: gap.to_string(),
        trailing_comment,
        eol: eol.to_string(),
    })
}

/// Classifies a non-header line.
fn parse_line(content: &str, dialect: &Dialect) -> Line {
    if content.trim().is_empty() {
        return Line::Blank {
            whitespace: content.to_string(),
        };
    }

    let (indent, rest) = split_indent(content);

    if let Some(c) = rest.chars().next().filter(|c| dialect.is_comment_indicator(*c)) {
        return Line::Comment {
            indent: indent.to_string(),
            indicator: c.to_string(),
            text: rest[c.len_utf8()..].to_string(),
        };
    }

    let Some((pos, len)) = dialect.find_delimiter(rest) else {
        return Line::unrecognized(content);
    };

    let key_part = &rest[..pos];
    let key = key_part.trim_end();
    if key.is_empty() {
        return Line::unrecognized(content);
    }
    let before_delim = &key_part[key.len()..];
    let (after_delim, value_part) = split_indent(&rest[pos + len..]);
    let value = value_part.trim_end();
    let trailing = &value_part[value.len()..];

    Line::KeyValue {
        indent: indent.to_string(),
        key: key.to_string(),
        delimiter: format!("{before_delim}{}{after_delim}", &rest[pos..pos + len]),
        value: Value::Text(value.to_string()),
        trailing: trailing.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn only_line(text: &str) -> Line {
        let doc = parse(text);
        assert_eq!(doc.sections.len(), 1, "expected a single section");
        assert_eq!(doc.sections[0].nodes.len(), 1, "expected a single line");
        doc.sections[0].nodes[0].line.clone()
    }

    #[test]
    fn test_empty_input_yields_no_sections() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_key_value_keeps_delimiter_spacing() {
        // Arrange / Act
        let line = only_line("rpcport = 51935\n");

        // Assert
        assert_eq!(
            line,
            Line::KeyValue {
                indent: String::new(),
                key: "rpcport".to_string(),
                delimiter: " = ".to_string(),
                value: Value::Text("51935".to_string()),
                trailing: String::new(),
            }
        );
    }

    #[test]
    fn test_key_value_splits_indent_and_trailing_whitespace() {
        let line = only_line("  server=1  \n");
        match line {
            Line::KeyValue {
                indent,
                key,
                value,
                trailing,
                ..
            } => {
                assert_eq!(indent, "  ");
                assert_eq!(key, "server");
                assert_eq!(value, Value::Text("1".to_string()));
                assert_eq!(trailing, "  ");
            }
            other => panic!("expected key/value, got {other:?}"),
        }
    }

    #[test]
    fn test_value_may_contain_delimiter() {
        let line = only_line("rpcauth=user:salt$hash=\n");
        assert_eq!(line.key(), Some("rpcauth"));
        match line {
            Line::KeyValue { value, .. } => {
                assert_eq!(value, Value::Text("user:salt$hash=".to_string()))
            }
            other => panic!("expected key/value, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_value_is_key_value() {
        let line = only_line("proxy=\n");
        assert_eq!(line.key(), Some("proxy"));
    }

    #[test]
    fn test_comment_indicators_are_preserved() {
        assert_eq!(
            only_line("# hash\n"),
            Line::Comment {
                indent: String::new(),
                indicator: "#".to_string(),
                text: " hash".to_string(),
            }
        );
        assert_eq!(
            only_line("  ;semi\n"),
            Line::Comment {
                indent: "  ".to_string(),
                indicator: ";".to_string(),
                text: "semi".to_string(),
            }
        );
    }

    #[test]
    fn test_whitespace_only_line_is_blank() {
        assert_eq!(
            only_line(" \t\n"),
            Line::Blank {
                whitespace: " \t".to_string()
            }
        );
    }

    #[test]
    fn test_line_without_delimiter_degrades_to_unrecognized() {
        let line = only_line("addressindex\n");
        assert!(line.is_unrecognized());
        assert_eq!(line, Line::unrecognized("addressindex"));
    }

    #[test]
    fn test_line_with_empty_key_degrades_to_unrecognized() {
        let line = only_line("  = 5\n");
        assert_eq!(line, Line::unrecognized("  = 5"));
    }

    #[test]
    fn test_header_starts_new_section() {
        let doc = parse("foo=1\n[main]\nbar=2\n");
        assert_eq!(doc.sections.len(), 2);
        assert!(doc.sections[0].is_global());
        assert_eq!(doc.sections[1].name(), Some("main"));
        assert_eq!(doc.sections[1].nodes.len(), 1);
    }

    #[test]
    fn test_leading_header_has_no_implicit_global_section() {
        let doc = parse("[main]\nbar=2\n");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].name(), Some("main"));
        assert!(doc.global_section().is_none());
    }

    #[test]
    fn test_empty_brackets_normalize_to_global() {
        let doc = parse("[]\nfoo=1\n[  ]\nbar=2\n");
        assert_eq!(doc.sections.len(), 2);
        assert!(doc.sections.iter().all(Section::is_global));
    }

    #[test]
    fn test_header_trailing_comment_is_captured() {
        let doc = parse("[test]  ; testnet only\n");
        let header = doc.sections[0].header.as_ref().unwrap();
        assert_eq!(header.gap, "  ");
        assert_eq!(
            header.trailing_comment,
            Some(TrailingComment {
                indicator: ";".to_string(),
                text: " testnet only".to_string(),
            })
        );
    }

    #[test]
    fn test_header_followed_by_text_is_not_a_header() {
        let doc = parse("[main] junk\n");
        assert_eq!(doc.sections.len(), 1);
        assert!(doc.sections[0].header.is_none());
        assert_eq!(
            doc.sections[0].nodes[0].line,
            Line::unrecognized("[main] junk")
        );
    }

    #[test]
    fn test_crlf_is_recorded_per_line_and_per_section() {
        let doc = parse("a=1\r\nb=2\n");
        let section = &doc.sections[0];
        assert_eq!(section.newline, "\r\n");
        assert_eq!(section.nodes[0].eol, "\r\n");
        assert_eq!(section.nodes[1].eol, "\n");
    }

    #[test]
    fn test_unterminated_last_line_has_empty_eol() {
        let doc = parse("a=1\nb=2");
        assert_eq!(doc.sections[0].nodes[1].eol, "");
    }

    #[test]
    fn test_section_without_newline_inherits_previous_style() {
        let doc = parse("a=1\r\n[main]");
        assert_eq!(doc.sections[1].newline, "\r\n");
    }

    #[test]
    fn test_bom_is_stripped_and_recorded() {
        let doc = parse("\u{feff}server=1\n");
        assert!(doc.bom);
        assert_eq!(doc.sections[0].nodes[0].line.key(), Some("server"));
    }

    #[test]
    fn test_parse_bytes_rejects_invalid_utf8() {
        let result = parse_bytes(&[b'a', b'=', 0xFF, b'\n']);
        assert_eq!(result, Err(ParseError::InvalidUtf8 { valid_up_to: 2 }));
    }

    #[test]
    fn test_parse_bytes_accepts_utf8() {
        let doc = parse_bytes("wallet=főnix\n".as_bytes()).expect("valid utf-8");
        assert_eq!(doc.sections[0].nodes[0].line.key(), Some("wallet"));
    }
}
