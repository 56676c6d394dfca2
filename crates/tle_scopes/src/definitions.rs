//! Named definitions: parameters, variables, namespaces, user functions.
//!
//! Definitions are created when the owning scope is built from the JSON tree
//! and are immutable thereafter; a document edit produces an entirely new
//! scope/definition tree.

use crate::scope::ScopeId;
use tle_core::text::Span;
use tle_json::Value;

/// What kind of thing a definition (or reference target) is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    Parameter,
    Variable,
    Namespace,
    UserFunction,
    UserFunctionParameter,
    BuiltinFunction,
}

/// A template parameter definition, or a user-function parameter when it
/// lives in a `UserFunction` scope.
#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    pub name: String,
    /// The span of the name in the document, without quotes. This is the
    /// go-to-definition target.
    pub name_span: Span,
    /// The span of the whole definition.
    pub full_span: Span,
    pub declared_type: Option<String>,
    pub default_value: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct VariableDefinition {
    pub name: String,
    pub name_span: Span,
    pub full_span: Span,
    pub value: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct UserFunctionParameter {
    pub name: String,
    pub name_span: Span,
    pub declared_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserFunctionDefinition {
    pub name: String,
    pub name_span: Span,
    pub full_span: Span,
    /// The owning namespace's name.
    pub namespace: String,
    pub parameters: Vec<UserFunctionParameter>,
    pub output_type: Option<String>,
    /// The function's own isolated scope: only its declared parameters are
    /// visible inside the body, never top-level parameters or variables.
    pub scope: ScopeId,
}

impl UserFunctionDefinition {
    /// The namespace-qualified name, `ns.fn`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// A usage string like `ns.fn(a, b)`, synthesized from the declared
    /// parameter list. Feeds hover text.
    pub fn usage(&self) -> String {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        format!("{}.{}({})", self.namespace, self.name, params.join(", "))
    }

    /// The exact argument count a call must supply.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

#[derive(Debug, Clone)]
pub struct NamespaceDefinition {
    pub name: String,
    pub name_span: Span,
    pub full_span: Span,
    pub members: tle_core::NameMap<UserFunctionDefinition>,
}

/// Identifies one definition for find-references and go-to-definition.
///
/// Two targets are the same definition when kind, owning scope, and folded
/// name all match; `name_span` additionally pins down which of several
/// same-named definitions is meant, though lookup always resolves to the
/// last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTarget {
    pub kind: DefinitionKind,
    /// The scope the definition lives in (after inner/outer forwarding).
    pub scope: ScopeId,
    /// For user functions, the namespace the member belongs to.
    pub namespace: Option<String>,
    pub name: String,
    /// The unquoted span of the definition's name in the document.
    pub name_span: Span,
}

impl ReferenceTarget {
    /// Whether a reference with this kind/scope/name resolves to this target.
    pub fn matches(&self, kind: DefinitionKind, scope: ScopeId, name: &str) -> bool {
        self.kind == kind
            && self.scope == scope
            && self.name.eq_ignore_ascii_case(tle_core::unquote(name))
    }
}
