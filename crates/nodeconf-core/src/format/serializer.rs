//! Serializer: [`Document`] → text.
//!
//! Each node is rebuilt from the exact pieces the parser stored, so untouched
//! lines come back byte-for-byte.  Lines added by the merger use the default
//! `=` delimiter and their section's newline style.

use std::fmt::Write as _;

use crate::domain::document::{Document, Header, Line, Node};

/// Renders a document back to configuration text.
///
/// # Examples
///
/// ```rust
/// use nodeconf_core::{parse, serialize};
///
/// let text = "; comment\r\n  key =  value \r\n\r\n[s] # note\r\n";
/// assert_eq!(serialize(&parse(text)), text);
/// ```
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    if doc.bom {
        out.push('\u{feff}');
    }
    for section in &doc.sections {
        if let Some(header) = &section.header {
            write_header(&mut out, header);
        }
        for node in &section.nodes {
            write_node(&mut out, node);
        }
    }
    out
}

fn write_header(out: &mut String, header: &Header) {
    out.push_str(&header.indent);
    out.push('[');
    out.push_str(&header.raw_name);
    out.push(']');
    out.push_str(&header.gap);
    if let Some(comment) = &header.trailing_comment {
        out.push_str(&comment.indicator);
        out.push_str(&comment.text);
    }
    out.push_str(&header.eol);
}

fn write_node(out: &mut String, node: &Node) {
    match &node.line {
        Line::KeyValue {
            indent,
            key,
            delimiter,
            value,
            trailing,
        } => {
            // Writing into a String cannot fail.
            let _ = write!(out, "{indent}{key}{delimiter}{value}{trailing}");
        }
        Line::Comment {
            indent,
            indicator,
            text,
        } => {
            out.push_str(indent);
            out.push_str(indicator);
            out.push_str(text);
        }
        Line::Blank { whitespace } => out.push_str(whitespace),
    }
    out.push_str(&node.eol);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
