//! View projector: flattens a [`Document`] into `section → key → value`.
//!
//! ```text
//! foo=1            →  { "global": { "foo": "1", "baz": "4" },
//! [main]                "main":   { "bar": "3" } }
//! bar=2
//! []
//! baz=4
//! [main]
//! bar=3
//! ```
//!
//! Header-less sections and `[]` sections share the `"global"` bucket.
//! Sections that repeat a name share one bucket; a key seen later overwrites
//! the earlier value, which matches how the daemon itself reads the file.

use indexmap::IndexMap;
use thiserror::Error;
use tracing::warn;

use crate::domain::document::{Document, Line, Value};

/// Bucket name used for unnamed sections.
pub const GLOBAL_BUCKET: &str = "global";

/// Flattened settings, in first-seen order.
pub type Settings = IndexMap<String, IndexMap<String, Value>>;

/// Inconsistencies that make a document impossible to flatten.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectionError {
    /// A key/value line carries an empty key.  The parser never produces
    /// one, but documents can be built or deserialized by hand.
    #[error("section {section:?} contains a key/value line with an empty key")]
    EmptyKey { section: String },
}

/// Flattens a document, returning an empty mapping when it is inconsistent.
///
/// Callers must treat an empty result as a valid state: it means "nothing to
/// show", not necessarily "file missing".
pub fn project(doc: &Document) -> Settings {
    match try_project(doc) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("discarding settings view: {e}");
            Settings::new()
        }
    }
}

/// Flattens a document.
///
/// # Errors
///
/// Returns [`ProjectionError::EmptyKey`] if any key/value line has an empty
/// key.  No partial result is returned.
pub fn try_project(doc: &Document) -> Result<Settings, ProjectionError> {
    let mut settings = Settings::new();

    for section in &doc.sections {
        let bucket_name = section.name().unwrap_or(GLOBAL_BUCKET);
        let bucket = settings.entry(bucket_name.to_string()).or_default();

        for node in &section.nodes {
            match &node.line {
                Line::KeyValue { key, value, .. } => {
                    if key.trim().is_empty() {
                        return Err(ProjectionError::EmptyKey {
                            section: bucket_name.to_string(),
                        });
                    }
                    bucket.insert(key.clone(), value.clone());
                }
                Line::Comment { .. } | Line::Blank { .. } => {}
            }
        }
    }

    Ok(settings)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::{Node, Section};
    use crate::format::parser::parse;

    fn text(v: &str) -> Value {
        Value::Text(v.to_string())
    }

    #[test]
    fn test_empty_document_projects_to_empty_mapping() {
        assert!(project(&Document::new()).is_empty());
    }

    #[test]
    fn test_leading_lines_go_to_global_bucket() {
        // Arrange
        let doc = parse("foo=1\n[main]\nbar=2\n");

        // Act
        let settings = project(&doc);

        // Assert
        assert_eq!(settings[GLOBAL_BUCKET]["foo"], text("1"));
        assert_eq!(settings["main"]["bar"], text("2"));
    }

    #[test]
    fn test_repeated_section_names_merge_last_write_wins() {
        let doc = parse("[main]\na=1\nb=1\n[other]\nc=1\n[main]\na=2\n");
        let settings = project(&doc);

        assert_eq!(settings["main"]["a"], text("2"));
        assert_eq!(settings["main"]["b"], text("1"));
        assert_eq!(settings.len(), 2);
    }

    #[test]
    fn test_empty_bracket_sections_join_global_bucket() {
        let doc = parse("foo=1\n[main]\nbar=2\n[ ]\nbaz=3\n");
        let settings = project(&doc);

        assert_eq!(settings[GLOBAL_BUCKET].len(), 2);
        assert_eq!(settings[GLOBAL_BUCKET]["baz"], text("3"));
    }

    #[test]
    fn test_section_names_are_trimmed() {
        let doc = parse("[ test ]\nrpcport=1\n");
        assert!(project(&doc).contains_key("test"));
    }

    #[test]
    fn test_comments_blanks_and_unrecognized_lines_are_ignored() {
        let doc = parse("# c\n\njunk\nkey=\n");
        let settings = project(&doc);

        assert_eq!(settings[GLOBAL_BUCKET].len(), 1);
        assert_eq!(settings[GLOBAL_BUCKET]["key"], text(""));
    }

    #[test]
    fn test_header_only_section_yields_empty_bucket() {
        let settings = project(&parse("[main]\n"));
        assert!(settings["main"].is_empty());
    }

    #[test]
    fn test_empty_key_makes_projection_empty() {
        // Arrange: hand-built inconsistent document
        let mut section = Section::global("\n");
        section.nodes.push(Node::new(
            Line::KeyValue {
                indent: String::new(),
                key: "  ".to_string(),
                delimiter: "=".to_string(),
                value: text("1"),
                trailing: String::new(),
            },
            "\n",
        ));
        let doc = Document {
            bom: false,
            sections: vec![parse("ok=1\n").sections.remove(0), section],
        };

        // Act / Assert
        assert!(matches!(
            try_project(&doc),
            Err(ProjectionError::EmptyKey { .. })
        ));
        assert!(project(&doc).is_empty());
    }
}
