//! tle_json: The spanned JSON document tree.
//!
//! Deployment templates are JSON documents (with comments permitted), and the
//! expression analysis needs to know the exact byte span of every value in
//! order to answer position queries. This crate provides the value tree the
//! scope builder and query engine navigate, plus a tolerant reader that
//! produces it. Navigation is case-sensitive at the JSON level; any
//! case-insensitivity is applied by the scope model's own lookups.

mod reader;
mod value;

pub use reader::{parse, DocumentParse};
pub use value::{ArrayValue, ObjectValue, Property, StringValue, Value};
