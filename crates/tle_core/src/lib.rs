//! tle_core: Core utilities for the TLE static-analysis pipeline.
//!
//! Provides the fundamental text span type and the case-insensitive ordered
//! name map used by the scope model.

pub mod collections;
pub mod text;

// Re-export commonly used types
pub use collections::{unquote, NameMap};
pub use text::{Span, TextPos};
