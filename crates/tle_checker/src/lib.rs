//! tle_checker: Semantic checks over parsed expressions.
//!
//! Everything here is a read-only walk over an immutable parse result plus
//! the document's scope tree: undefined-reference detection, unrecognized
//! functions, argument counts, variable property access, find-references,
//! and unused-definition accounting. Checks never mutate their inputs and
//! report problems only as [`tle_diagnostics::Issue`] values.

mod references;
mod unused;
mod visitors;

pub use references::{collect_references, unquoted_token_span};
pub use unused::{unused_definition_issues, UsageAccounting};
pub use visitors::{
    check, ArgumentCountVisitor, UndefinedReferenceVisitor, UnrecognizedFunctionVisitor,
    VariablePropertyVisitor,
};
