//! Document editing.
//!
//! Only one kind of edit exists: the selective merge of whitelisted global
//! keys.  Section-scoped edits are not supported yet.

pub mod merger;

pub use merger::{merge, AllowedKeys, Merged};
