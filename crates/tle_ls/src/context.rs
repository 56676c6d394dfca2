//! Position contexts: turning a document offset into semantic answers.
//!
//! A [`PositionContext`] is a pure view over the immutable document model.
//! Every accessor re-derives its answer from the model, so contexts can be
//! queried repeatedly and concurrently without side effects.

use tle_ast::{Expr, ExprId};
use tle_checker::{collect_references, unquoted_token_span};
use tle_core::{Span, TextPos};
use tle_functions::FunctionMetadata;
use tle_scopes::{
    DefinitionKind, NamespaceDefinition, ParameterDefinition, ReferenceTarget, ScopeContext,
    UserFunctionDefinition, VariableDefinition,
};

use crate::document::DeploymentTemplate;

/// Every reference to one definition: the definition's own name plus each
/// use, as document spans in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceList {
    pub kind: DefinitionKind,
    pub spans: Vec<Span>,
}

/// What a position refers to, for go-to-definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSiteInfo {
    pub kind: DefinitionKind,
    /// The document span of the definition's name.
    pub definition_span: Span,
    /// Whether the queried position is the definition itself rather than a
    /// use of it.
    pub is_definition: bool,
}

/// The semantic context at one document offset.
pub struct PositionContext<'a> {
    template: &'a DeploymentTemplate,
    offset: TextPos,
    site: Site,
}

enum Site {
    /// The offset sits on a definition's name in the JSON tree.
    Definition(ReferenceTarget),
    /// The offset sits inside a parsed string value.
    Expression {
        index: usize,
        node: Option<ExprId>,
    },
}

/// What the context's position resolves to.
enum ResolvedSymbol<'a> {
    Parameter {
        definition: &'a ParameterDefinition,
        target: ReferenceTarget,
    },
    Variable {
        definition: &'a VariableDefinition,
        target: ReferenceTarget,
    },
    Namespace {
        definition: &'a NamespaceDefinition,
        target: ReferenceTarget,
    },
    UserFunction {
        definition: &'a UserFunctionDefinition,
        target: ReferenceTarget,
    },
    Builtin(&'a FunctionMetadata),
}

impl<'a> ResolvedSymbol<'a> {
    fn target(&self) -> Option<&ReferenceTarget> {
        match self {
            ResolvedSymbol::Parameter { target, .. }
            | ResolvedSymbol::Variable { target, .. }
            | ResolvedSymbol::Namespace { target, .. }
            | ResolvedSymbol::UserFunction { target, .. } => Some(target),
            ResolvedSymbol::Builtin(_) => None,
        }
    }
}

impl<'a> PositionContext<'a> {
    pub(crate) fn at(template: &'a DeploymentTemplate, offset: TextPos) -> Option<Self> {
        let site = if let Some(target) = definition_target_at(template, offset) {
            Site::Definition(target)
        } else {
            let index = template.string_at(offset)?;
            let string = &template.strings()[index];
            let relative = offset - string.span.start;
            let node = string
                .result
                .expression
                .and_then(|root| string.result.arena.most_specific_at(root, relative));
            Site::Expression { index, node }
        };
        Some(Self {
            template,
            offset,
            site,
        })
    }

    /// All references to the symbol at this position, or `None` when the
    /// position denotes nothing with a definition in the document (built-in
    /// functions included).
    pub fn references(&self) -> Option<ReferenceList> {
        let resolved = self.resolve()?;
        let target = resolved.target()?;
        let mut spans = vec![target.name_span];
        for string in self.template.strings() {
            for span in collect_references(&string.result, &self.template.scopes().arena, target) {
                spans.push(string.to_document(span));
            }
        }
        spans.sort_by_key(|span| span.start);
        Some(ReferenceList {
            kind: target.kind,
            spans,
        })
    }

    /// Hover text for the symbol at this position.
    pub fn hover_info(&self) -> Option<String> {
        let text = match self.resolve()? {
            ResolvedSymbol::Builtin(metadata) => {
                format!("{}\n{}", metadata.usage, metadata.description)
            }
            ResolvedSymbol::Parameter { definition, .. } => match &definition.declared_type {
                Some(declared) => format!("(parameter) {}: {}", definition.name, declared),
                None => format!("(parameter) {}", definition.name),
            },
            ResolvedSymbol::Variable { definition, .. } => {
                format!("(variable) {}", definition.name)
            }
            ResolvedSymbol::Namespace { definition, .. } => {
                format!("(user-defined namespace) {}", definition.name)
            }
            ResolvedSymbol::UserFunction { definition, .. } => {
                format!("(user-defined function) {}", definition.usage())
            }
        };
        Some(text)
    }

    /// The definition site to navigate to from this position. `None` for
    /// built-ins, which have no definition in the document.
    pub fn reference_site_info(&self) -> Option<ReferenceSiteInfo> {
        let resolved = self.resolve()?;
        let target = resolved.target()?;
        Some(ReferenceSiteInfo {
            kind: target.kind,
            definition_span: target.name_span,
            is_definition: matches!(self.site, Site::Definition(_)),
        })
    }

    /// The document span a completion at this position should replace: the
    /// function name or reference name under the cursor, or an empty span at
    /// the offset when nothing is there yet.
    pub fn completion_anchor(&self) -> Span {
        if let Site::Expression { index, node: Some(node) } = &self.site {
            let string = &self.template.strings()[*index];
            let relative = self.offset - string.span.start;
            match string.result.arena.get(*node) {
                Expr::StringLiteral { token } => {
                    if self.reference_call_argument(*index, *node).is_some() {
                        return string.to_document(unquoted_token_span(token));
                    }
                }
                Expr::FunctionCall(call) => {
                    if let Some(namespace) = &call.namespace {
                        if namespace.span.contains_inclusive(relative) {
                            return string.to_document(namespace.span);
                        }
                    }
                    if let Some(name) = &call.name {
                        if name.span.contains_inclusive(relative) {
                            return string.to_document(name.span);
                        }
                    }
                }
                _ => {}
            }
        }
        Span::empty(self.offset)
    }

    /// If `node` is the sole string argument of a `parameters()`/`variables()`
    /// call, the call's builtin name and the argument's unquoted text.
    fn reference_call_argument(&self, index: usize, node: ExprId) -> Option<(bool, String)> {
        let arena = &self.template.strings()[index].result.arena;
        let parent = arena.parent(node)?;
        let Expr::FunctionCall(call) = arena.get(parent) else {
            return None;
        };
        let token = arena.sole_string_argument(call)?;
        let Expr::StringLiteral { token: own } = arena.get(node) else {
            return None;
        };
        if token.span != own.span {
            return None;
        }
        if call.is_builtin_call("parameters") {
            Some((true, tle_core::unquote(&token.text).to_string()))
        } else if call.is_builtin_call("variables") {
            Some((false, tle_core::unquote(&token.text).to_string()))
        } else {
            None
        }
    }

    fn resolve(&self) -> Option<ResolvedSymbol<'a>> {
        match &self.site {
            Site::Definition(target) => self.resolve_definition(target),
            Site::Expression { index, node } => self.resolve_expression(*index, (*node)?),
        }
    }

    /// Find the definition a definition-site target points at, matched by
    /// name span so duplicates resolve to the one actually under the cursor.
    fn resolve_definition(&self, target: &ReferenceTarget) -> Option<ResolvedSymbol<'a>> {
        let scopes = &self.template.scopes().arena;
        let scope = scopes.get(target.scope);
        match target.kind {
            DefinitionKind::Parameter | DefinitionKind::UserFunctionParameter => {
                let definition = scope
                    .parameters
                    .as_ref()?
                    .values()
                    .find(|d| d.name_span == target.name_span)?;
                Some(ResolvedSymbol::Parameter {
                    definition,
                    target: target.clone(),
                })
            }
            DefinitionKind::Variable => {
                let definition = scope
                    .variables
                    .as_ref()?
                    .values()
                    .find(|d| d.name_span == target.name_span)?;
                Some(ResolvedSymbol::Variable {
                    definition,
                    target: target.clone(),
                })
            }
            DefinitionKind::Namespace => {
                let definition = scope
                    .namespaces
                    .as_ref()?
                    .values()
                    .find(|d| d.name_span == target.name_span)?;
                Some(ResolvedSymbol::Namespace {
                    definition,
                    target: target.clone(),
                })
            }
            DefinitionKind::UserFunction => {
                let namespace = scope.namespaces.as_ref()?.get(target.namespace.as_deref()?)?;
                let definition = namespace
                    .members
                    .values()
                    .find(|d| d.name_span == target.name_span)?;
                Some(ResolvedSymbol::UserFunction {
                    definition,
                    target: target.clone(),
                })
            }
            DefinitionKind::BuiltinFunction => None,
        }
    }

    fn resolve_expression(&self, index: usize, node: ExprId) -> Option<ResolvedSymbol<'a>> {
        let string = &self.template.strings()[index];
        let arena = &string.result.arena;
        let scopes = &self.template.scopes().arena;
        let scope = string.result.scope;
        let resolution = scopes.resolution_scope(scope);
        let relative = self.offset - string.span.start;

        match arena.get(node) {
            Expr::StringLiteral { .. } => {
                let (is_parameter, name) = self.reference_call_argument(index, node)?;
                if is_parameter {
                    let definition = scopes.parameter_definition(scope, &name)?;
                    let kind = if scopes.get(resolution).context == ScopeContext::UserFunction {
                        DefinitionKind::UserFunctionParameter
                    } else {
                        DefinitionKind::Parameter
                    };
                    Some(ResolvedSymbol::Parameter {
                        definition,
                        target: ReferenceTarget {
                            kind,
                            scope: resolution,
                            namespace: None,
                            name: definition.name.clone(),
                            name_span: definition.name_span,
                        },
                    })
                } else {
                    let definition = scopes.variable_definition(scope, &name)?;
                    Some(ResolvedSymbol::Variable {
                        definition,
                        target: ReferenceTarget {
                            kind: DefinitionKind::Variable,
                            scope: resolution,
                            namespace: None,
                            name: definition.name.clone(),
                            name_span: definition.name_span,
                        },
                    })
                }
            }
            Expr::FunctionCall(call) => match &call.namespace {
                Some(namespace) => {
                    if namespace.span.contains_inclusive(relative) {
                        let definition = scopes.namespace_definition(scope, &namespace.text)?;
                        return Some(ResolvedSymbol::Namespace {
                            definition,
                            target: ReferenceTarget {
                                kind: DefinitionKind::Namespace,
                                scope: resolution,
                                namespace: None,
                                name: definition.name.clone(),
                                name_span: definition.name_span,
                            },
                        });
                    }
                    let name = call.name.as_ref()?;
                    let definition =
                        scopes.user_function_definition(scope, &namespace.text, &name.text)?;
                    Some(ResolvedSymbol::UserFunction {
                        definition,
                        target: ReferenceTarget {
                            kind: DefinitionKind::UserFunction,
                            scope: resolution,
                            namespace: Some(definition.namespace.clone()),
                            name: definition.name.clone(),
                            name_span: definition.name_span,
                        },
                    })
                }
                None => {
                    let name = call.name.as_ref()?;
                    self.template
                        .catalog()
                        .lookup(&name.text)
                        .map(ResolvedSymbol::Builtin)
                }
            },
            _ => None,
        }
    }
}

/// Find a definition whose name span contains the offset, anywhere in the
/// scope tree.
fn definition_target_at(template: &DeploymentTemplate, offset: TextPos) -> Option<ReferenceTarget> {
    let scopes = &template.scopes().arena;
    for (id, scope) in scopes.iter() {
        if let Some(parameters) = &scope.parameters {
            for definition in parameters.values() {
                if definition.name_span.contains_inclusive(offset) {
                    let kind = if scope.context == ScopeContext::UserFunction {
                        DefinitionKind::UserFunctionParameter
                    } else {
                        DefinitionKind::Parameter
                    };
                    return Some(ReferenceTarget {
                        kind,
                        scope: id,
                        namespace: None,
                        name: definition.name.clone(),
                        name_span: definition.name_span,
                    });
                }
            }
        }
        if let Some(variables) = &scope.variables {
            for definition in variables.values() {
                if definition.name_span.contains_inclusive(offset) {
                    return Some(ReferenceTarget {
                        kind: DefinitionKind::Variable,
                        scope: id,
                        namespace: None,
                        name: definition.name.clone(),
                        name_span: definition.name_span,
                    });
                }
            }
        }
        if let Some(namespaces) = &scope.namespaces {
            for namespace in namespaces.values() {
                if namespace.name_span.contains_inclusive(offset) {
                    return Some(ReferenceTarget {
                        kind: DefinitionKind::Namespace,
                        scope: id,
                        namespace: None,
                        name: namespace.name.clone(),
                        name_span: namespace.name_span,
                    });
                }
                for member in namespace.members.values() {
                    if member.name_span.contains_inclusive(offset) {
                        return Some(ReferenceTarget {
                            kind: DefinitionKind::UserFunction,
                            scope: id,
                            namespace: Some(namespace.name.clone()),
                            name: member.name.clone(),
                            name_span: member.name_span,
                        });
                    }
                }
            }
        }
    }
    None
}
