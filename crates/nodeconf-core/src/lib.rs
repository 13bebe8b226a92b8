//! # nodeconf-core
//!
//! Shared library for reading and rewriting a node daemon's INI-style
//! configuration file (`node.conf`) without losing anything the operator
//! wrote by hand.
//!
//! This crate has zero dependencies on file systems, sockets, or async
//! runtimes.  The service crate owns all I/O and calls into this crate with
//! plain strings and byte slices.
//!
//! # Architecture overview (for beginners)
//!
//! A naive "parse into a `HashMap`, change a key, write the map back" approach
//! destroys comments, blank lines, section order and spacing.  Operators rely
//! on those when they edit the file by hand, so this crate never works with a
//! plain map when it needs to write.  Instead:
//!
//! - **`domain`** – The structural tree.  A [`Document`] is a list of
//!   [`Section`]s; each section is a list of [`Node`]s; each node is one
//!   physical line tagged as a key/value pair, a comment, or a blank line, and
//!   it remembers its own delimiter, indentation and newline characters.
//!
//! - **`format`** – Converting text to a tree ([`parse`]) and back
//!   ([`serialize`]).  For every input, `serialize(&parse(text)) == text`.
//!
//! - **`view`** – A read-only flattened map (`section → key → value`) used by
//!   callers that only want to look settings up.
//!
//! - **`edit`** – The selective merger that applies a small whitelisted set of
//!   changes to the global section in place.

pub mod domain;
pub mod edit;
pub mod format;
pub mod view;

// Re-export the most-used items at the crate root so callers can write
// `nodeconf_core::parse` instead of `nodeconf_core::format::parser::parse`.
pub use domain::document::{Document, Header, Line, Node, Section, TrailingComment, Value};
pub use edit::merger::{merge, AllowedKeys, Merged};
pub use format::dialect::Dialect;
pub use format::parser::{parse, parse_bytes, parse_with, ParseError};
pub use format::serializer::serialize;
pub use view::projector::{project, try_project, ProjectionError, Settings, GLOBAL_BUCKET};
