//! Domain entities for nodeconf.
//!
//! This module contains the structural tree of a configuration file and
//! nothing else: no parsing, no I/O.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The innermost layer of a Clean Architecture codebase is the **domain**.
//! Domain code defines the data types that make the system what it is (here:
//! a configuration file seen as an ordered list of lines) and never imports
//! file systems, sockets or UI frameworks.  Outer layers depend on the domain;
//! the domain depends on nothing.

/// The structural document tree, the core domain concept.
///
/// See [`document::Document`] for the main type.
pub mod document;
