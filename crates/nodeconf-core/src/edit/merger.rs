//! Selective merger: applies whitelisted changes to the global section.
//!
//! # Algorithm
//!
//! 1. **Filter** – keep only changes whose key is in [`AllowedKeys`] and whose
//!    JSON value is a string, number or boolean without line breaks.
//!    Everything else is dropped without an error: callers must never be able
//!    to write arbitrary keys.
//! 2. **Update in place** – walk the key/value lines of every unnamed section.
//!    A line whose key is pending gets the new value if its rendered text
//!    differs.  Found keys leave the pending set.
//! 3. **Append** – keys that were not found are appended, in change order, at
//!    the end of the leading global section.  If the document starts with a
//!    named section (or is empty), a new global section is prepended.
//!
//! ```text
//! before                 changes {addressindex: true}      after
//! ──────                 ────────────────────────────      ─────
//! foo=1                                                    foo=1
//! [main]                                                   addressindex=1
//! bar=2                                                    [main]
//!                                                          bar=2
//! ```
//!
//! Booleans are written as `1` / `0` (see [`Value`]'s `Display`).

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::domain::document::{Document, Line, Section, Value};

// ── Allowed keys ──────────────────────────────────────────────────────────────

/// The set of key names a caller is permitted to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedKeys(BTreeSet<String>);

impl AllowedKeys {
    /// Builds a whitelist from key names.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the allowed keys in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for AllowedKeys {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

// ── Merge result ──────────────────────────────────────────────────────────────

/// Result of [`merge`].
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    /// The document after the merge (identical to the input when
    /// `modified` is `false`).
    pub document: Document,
    /// `true` if any line was changed or added.
    pub modified: bool,
    /// Keys whose existing lines received a new value.
    pub updated: Vec<String>,
    /// Keys that were appended as new lines.
    pub appended: Vec<String>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Applies whitelisted `changes` to the global section of `doc`.
///
/// The caller decides whether to persist the result; this function only
/// reports whether anything changed.
///
/// # Examples
///
/// ```rust
/// use nodeconf_core::{merge, parse, serialize, AllowedKeys};
///
/// let doc = parse("foo=1\n[main]\nbar=2\n");
/// let changes = serde_json::json!({ "addressindex": true, "rpcpassword": "x" });
/// let allowed = AllowedKeys::new(["addressindex"]);
///
/// let merged = merge(doc, changes.as_object().unwrap(), &allowed);
/// assert!(merged.modified);
/// assert_eq!(
///     serialize(&merged.document),
///     "foo=1\naddressindex=1\n[main]\nbar=2\n"
/// );
/// ```
pub fn merge(
    mut doc: Document,
    changes: &serde_json::Map<String, serde_json::Value>,
    allowed: &AllowedKeys,
) -> Merged {
    let mut pending = filter_changes(changes, allowed);
    let updated = update_existing(&mut doc, &mut pending);
    let appended = append_pending(&mut doc, pending);

    let modified = !updated.is_empty() || !appended.is_empty();
    debug!(modified, ?updated, ?appended, "merged configuration changes");

    Merged {
        document: doc,
        modified,
        updated,
        appended,
    }
}

// ── Steps ─────────────────────────────────────────────────────────────────────

fn filter_changes(
    changes: &serde_json::Map<String, serde_json::Value>,
    allowed: &AllowedKeys,
) -> IndexMap<String, Value> {
    let mut pending = IndexMap::new();
    for (key, json) in changes {
        if !allowed.contains(key) {
            debug!(key = %key, "ignoring change to a key outside the whitelist");
            continue;
        }
        match Value::from_json(json) {
            Some(value) if is_single_line(&value) => {
                pending.insert(key.clone(), value);
            }
            Some(_) => debug!(key = %key, "ignoring change with a line break in its value"),
            None => debug!(key = %key, "ignoring change with a non-scalar value"),
        }
    }
    pending
}

/// A value spanning several lines would smuggle extra lines into the file.
fn is_single_line(value: &Value) -> bool {
    !value.render().contains(['\n', '\r'])
}

fn update_existing(doc: &mut Document, pending: &mut IndexMap<String, Value>) -> Vec<String> {
    let mut updated = Vec::new();
    if pending.is_empty() {
        return updated;
    }

    let mut found = HashSet::new();
    for section in doc.sections.iter_mut().filter(|s| s.is_global()) {
        for node in &mut section.nodes {
            let Line::KeyValue { key, value, .. } = &mut node.line else {
                continue;
            };
            let Some(requested) = pending.get(key.as_str()) else {
                continue;
            };
            found.insert(key.clone());
            if value.render().trim() != requested.render().trim() {
                *value = requested.clone();
                if !updated.contains(key) {
                    updated.push(key.clone());
                }
            }
        }
    }

    pending.retain(|key, _| !found.contains(key));
    updated
}

fn append_pending(doc: &mut Document, pending: IndexMap<String, Value>) -> Vec<String> {
    let mut appended = Vec::new();
    if pending.is_empty() {
        return appended;
    }

    if doc.global_section().is_none() {
        let newline = doc.newline_hint().to_string();
        doc.sections.insert(0, Section::global(newline));
    }

    if let Some(section) = doc.global_section_mut() {
        for (key, value) in pending {
            section.push_line(Line::key_value(key.clone(), value));
            appended.push(key);
        }
    }
    appended
}

// ── Tests ─────────────────────────────────────────────────────────────────────
