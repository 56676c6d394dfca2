//! tle_scopes: The lexical scope model.
//!
//! Scopes form a tree built once from the document's JSON tree; each scope
//! exposes the parameter, variable, and namespace definitions visible at a
//! point in the document. Lookup is case-insensitive with
//! last-definition-wins semantics, matching the host runtime. Nested
//! deployments introduce child scopes that are either isolated (`inner`) or
//! forwarding (`outer`).

mod builder;
mod definitions;
mod scope;

pub use builder::{build, ScopeAttachment, ScopeBundle};
pub use definitions::{
    DefinitionKind, NamespaceDefinition, ParameterDefinition, ReferenceTarget,
    UserFunctionDefinition, UserFunctionParameter, VariableDefinition,
};
pub use scope::{ScopeArena, ScopeContext, ScopeId, TemplateScope};
