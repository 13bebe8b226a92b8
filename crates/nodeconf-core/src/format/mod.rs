//! Text format module: dialect settings, the structural parser and the
//! serializer.

pub mod dialect;
pub mod parser;
pub mod serializer;

pub use dialect::Dialect;
pub use parser::{parse, parse_bytes, parse_with, ParseError};
pub use serializer::serialize;
