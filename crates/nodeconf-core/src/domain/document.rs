//! The structural document tree.
//!
//! A configuration file such as
//!
//! ```text
//! # node settings
//! server=1
//!
//! [test]   ; testnet overrides
//! rpcport = 51935
//! ```
//!
//! is represented as:
//!
//! ```text
//! Document
//!  ├─ Section (no header: the global section)
//!  │    ├─ Node: Comment  { indicator: "#", text: " node settings" }
//!  │    ├─ Node: KeyValue { key: "server", delimiter: "=", value: "1" }
//!  │    └─ Node: Blank
//!  └─ Section (header "[test]", trailing comment "; testnet overrides")
//!       └─ Node: KeyValue { key: "rpcport", delimiter: " = ", value: "51935" }
//! ```
//!
//! Every node keeps the exact characters it was parsed from (indentation,
//! delimiter spacing, trailing whitespace and line terminator), which is what
//! makes byte-for-byte re-serialization possible.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Value ─────────────────────────────────────────────────────────────────────

/// A setting value.
///
/// Values read from disk are always [`Value::Text`].  The other variants are
/// produced when a caller submits typed changes (for example a JSON `true`).
///
/// # Rendering
///
/// [`fmt::Display`] produces the on-disk form.  Booleans render as `1` / `0`
/// because the daemon's own parser does not understand `true` / `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Converts a JSON value into a setting value.
    ///
    /// Returns `None` for `null`, arrays and objects: those shapes can never
    /// be written to a flat key/value file.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Integer(i)),
                // Above i64::MAX: keep the exact digits rather than rounding
                // through f64.
                None if n.is_u64() => Some(Value::Text(n.to_string())),
                None => n.as_f64().map(Value::Float),
            },
            serde_json::Value::Null
            | serde_json::Value::Array(_)
            | serde_json::Value::Object(_) => None,
        }
    }

    /// Converts the value back into JSON for IPC responses.
    ///
    /// Non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Returns the on-disk text of this value.
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Returns the string slice for text values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interprets the value as a daemon-style flag (`1`, `true`, non-zero).
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Text(s) => {
                let s = s.trim();
                s.eq_ignore_ascii_case("true") || s.parse::<i64>().map(|n| n != 0).unwrap_or(false)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", u8::from(*b)),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

// ── Lines ─────────────────────────────────────────────────────────────────────

/// The semantic role of one physical line.
///
/// Exactly one variant is active per line.  Matching on this enum is always
/// exhaustive, so adding a new kind of line is a compile error everywhere a
/// line is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Line {
    /// `key<delimiter>value`, e.g. `addressindex = 1`.
    KeyValue {
        /// Whitespace before the key.
        indent: String,
        /// The key, without surrounding whitespace.
        key: String,
        /// The separator including its surrounding whitespace (`"="`, `" = "`).
        delimiter: String,
        /// The value, without trailing whitespace.
        value: Value,
        /// Whitespace after the value.
        trailing: String,
    },

    /// A comment line, e.g. `# enable the address index`.
    ///
    /// An empty `indicator` marks a line the parser could not classify; it is
    /// kept verbatim in `text` so that no byte of the file is ever lost.
    Comment {
        indent: String,
        indicator: String,
        text: String,
    },

    /// An empty or whitespace-only line.
    Blank { whitespace: String },
}

impl Line {
    /// Builds a key/value line with the default `=` delimiter.
    pub fn key_value(key: impl Into<String>, value: Value) -> Self {
        Line::KeyValue {
            indent: String::new(),
            key: key.into(),
            delimiter: "=".to_string(),
            value,
            trailing: String::new(),
        }
    }

    /// Builds a line the parser could not classify.
    pub fn unrecognized(raw: impl Into<String>) -> Self {
        Line::Comment {
            indent: String::new(),
            indicator: String::new(),
            text: raw.into(),
        }
    }

    /// Returns the key for key/value lines.
    pub fn key(&self) -> Option<&str> {
        match self {
            Line::KeyValue { key, .. } => Some(key),
            Line::Comment { .. } | Line::Blank { .. } => None,
        }
    }

    /// Returns `true` when the line was kept verbatim because it could not be
    /// parsed.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Line::Comment { indicator, .. } if indicator.is_empty())
    }
}

/// One physical line: its semantic role plus its own line terminator.
///
/// `eol` is `"\n"`, `"\r\n"`, or `""` for a final line without a terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub line: Line,
    pub eol: String,
}

impl Node {
    pub fn new(line: Line, eol: impl Into<String>) -> Self {
        Self {
            line,
            eol: eol.into(),
        }
    }
}

// ── Sections ──────────────────────────────────────────────────────────────────

/// A comment written on the same line as a section header:
/// `[test] ; testnet overrides`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailingComment {
    pub indicator: String,
    pub text: String,
}

/// A `[name]` header line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Whitespace before `[`.
    pub indent: String,
    /// Everything between `[` and `]`, untrimmed.
    pub raw_name: String,
    /// Whitespace between `]` and the trailing comment (or end of line).
    pub gap: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_comment: Option<TrailingComment>,
    pub eol: String,
}

impl Header {
    /// Builds a plain `[name]` header.
    pub fn named(name: impl Into<String>, eol: impl Into<String>) -> Self {
        Self {
            indent: String::new(),
            raw_name: name.into(),
            gap: String::new(),
            trailing_comment: None,
            eol: eol.into(),
        }
    }

    /// Returns the trimmed section name, or `None` for `[]` / `[   ]`.
    pub fn name(&self) -> Option<&str> {
        let name = self.raw_name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

/// An ordered group of lines, optionally introduced by a `[name]` header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// `None` for the lines before the first header of the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,
    pub nodes: Vec<Node>,
    /// Newline style of this section, used for lines appended to it.
    pub newline: String,
}

impl Section {
    /// Creates an empty header-less (global) section.
    pub fn global(newline: impl Into<String>) -> Self {
        Self {
            header: None,
            nodes: Vec::new(),
            newline: newline.into(),
        }
    }

    /// Creates an empty section introduced by `header`.
    pub fn with_header(header: Header, newline: impl Into<String>) -> Self {
        Self {
            header: Some(header),
            nodes: Vec::new(),
            newline: newline.into(),
        }
    }

    /// Returns the trimmed section name; `None` means the section is global.
    pub fn name(&self) -> Option<&str> {
        self.header.as_ref().and_then(Header::name)
    }

    /// Returns `true` for header-less sections and `[]`-style headers.
    pub fn is_global(&self) -> bool {
        self.name().is_none()
    }

    /// Iterates over the `(key, value)` pairs of this section in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.nodes.iter().filter_map(|node| match &node.line {
            Line::KeyValue { key, value, .. } => Some((key.as_str(), value)),
            Line::Comment { .. } | Line::Blank { .. } => None,
        })
    }

    /// Appends a line terminated with this section's newline style.
    ///
    /// If the current last line has no terminator (end of file), it receives
    /// one first; otherwise the two lines would be glued together.
    pub fn push_line(&mut self, line: Line) {
        if let Some(last) = self.nodes.last_mut() {
            if last.eol.is_empty() {
                last.eol = self.newline.clone();
            }
        } else if let Some(header) = self.header.as_mut() {
            if header.eol.is_empty() {
                header.eol = self.newline.clone();
            }
        }
        let eol = self.newline.clone();
        self.nodes.push(Node::new(line, eol));
    }
}

// ── Document ──────────────────────────────────────────────────────────────────

/// A whole configuration file as an ordered list of sections.
///
/// A missing file is represented by `Document::default()` (zero sections).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// `true` when the source started with a UTF-8 byte order mark.
    #[serde(default)]
    pub bom: bool,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the document has no sections at all.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Returns the newline style used by the first section, or `"\n"`.
    pub fn newline_hint(&self) -> &str {
        self.sections
            .first()
            .map(|s| s.newline.as_str())
            .unwrap_or("\n")
    }

    /// Returns the leading global section, if the document starts with one.
    pub fn global_section(&self) -> Option<&Section> {
        self.sections.first().filter(|s| s.is_global())
    }

    /// Mutable variant of [`Document::global_section`].
    pub fn global_section_mut(&mut self) -> Option<&mut Section> {
        self.sections.first_mut().filter(|s| s.is_global())
    }

    /// Returns every section with the given trimmed name, in file order.
    pub fn sections_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Section> {
        self.sections.iter().filter(move |s| s.name() == Some(name))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
