//! tle_parser: Recursive descent parser for template language expressions.
//!
//! Tolerant by construction: malformed user text always produces a
//! best-effort partial tree plus issues, never a failure. The only hard
//! failures are contract violations (empty input, missing surrounding
//! quotes), which indicate a caller bug.

mod parser;

pub use parser::{parse, ParseResult};
