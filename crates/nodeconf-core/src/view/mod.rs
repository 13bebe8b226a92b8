//! Read-only views of a document.

pub mod projector;

pub use projector::{project, try_project, ProjectionError, Settings, GLOBAL_BUCKET};
