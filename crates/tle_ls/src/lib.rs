//! tle_ls: The position-addressable query engine.
//!
//! Builds the full semantic model of one document snapshot — JSON tree,
//! scope tree, every string value parsed against its scope — and answers
//! editor-style queries: whole-document diagnostics, and per-offset contexts
//! exposing references, hover text, go-to-definition targets, and completion
//! anchors. The model is immutable; a document edit means building a new one.

mod context;
mod document;

pub use context::{PositionContext, ReferenceList, ReferenceSiteInfo};
pub use document::DeploymentTemplate;
