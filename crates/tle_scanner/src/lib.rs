//! tle_scanner: The expression tokenizer.
//!
//! Converts the text inside a quoted TLE string into a flat token stream for
//! the parser.

mod tokenizer;

pub use tokenizer::Tokenizer;
