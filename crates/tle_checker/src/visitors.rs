//! Per-expression semantic checks.
//!
//! Each check is a single-purpose, read-only walk over one parsed expression,
//! taking the resolved scope and emitting issues. The checks compose freely
//! because nothing mutates the tree.

use tle_ast::{walk, Expr, ExprArena, ExprId, ExprVisitor, FunctionCall, Token};
use tle_diagnostics::{messages, Issue, IssueCollection};
use tle_functions::FunctionCatalog;
use tle_json::Value;
use tle_parser::ParseResult;
use tle_scopes::{ScopeArena, ScopeId};

/// Run every per-expression check over one parse result. Returned issues are
/// sorted by span start and are relative to the quoted string, like the parse
/// issues themselves.
pub fn check(result: &ParseResult, scopes: &ScopeArena, catalog: &FunctionCatalog) -> Vec<Issue> {
    let mut collection = IssueCollection::new();
    let Some(root) = result.expression else {
        return Vec::new();
    };
    if !result.is_expression() {
        return Vec::new();
    }

    let mut undefined = UndefinedReferenceVisitor::new(scopes, result.scope);
    walk(&result.arena, root, &mut undefined);
    collection.extend_from_slice(&undefined.into_issues());

    let mut unrecognized = UnrecognizedFunctionVisitor::new(scopes, result.scope, catalog);
    walk(&result.arena, root, &mut unrecognized);
    collection.extend_from_slice(&unrecognized.into_issues());

    let mut arity = ArgumentCountVisitor::new(scopes, result.scope, catalog);
    walk(&result.arena, root, &mut arity);
    collection.extend_from_slice(&arity.into_issues());

    let mut properties = VariablePropertyVisitor::new(scopes, result.scope);
    walk(&result.arena, root, &mut properties);
    collection.extend_from_slice(&properties.into_issues());

    collection.sort();
    collection.into_issues()
}

/// The literal string argument of a one-argument `parameters()`/`variables()`
/// call, as (token, unquoted name).
pub(crate) fn reference_argument<'a>(
    arena: &'a ExprArena,
    call: &FunctionCall,
) -> Option<(&'a Token, &'a str)> {
    let token = arena.sole_string_argument(call)?;
    Some((token, tle_core::unquote(&token.text)))
}

/// Flags `parameters('x')` / `variables('x')` calls whose name does not
/// resolve in the call's own scope.
pub struct UndefinedReferenceVisitor<'a> {
    scopes: &'a ScopeArena,
    scope: ScopeId,
    issues: Vec<Issue>,
}

impl<'a> UndefinedReferenceVisitor<'a> {
    pub fn new(scopes: &'a ScopeArena, scope: ScopeId) -> Self {
        Self {
            scopes,
            scope,
            issues: Vec::new(),
        }
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

impl ExprVisitor for UndefinedReferenceVisitor<'_> {
    fn visit_function_call(&mut self, arena: &ExprArena, id: ExprId) {
        let Expr::FunctionCall(call) = arena.get(id) else {
            return;
        };
        let Some((token, name)) = reference_argument(arena, call) else {
            return;
        };
        if call.is_builtin_call("parameters") {
            if self.scopes.parameter_definition(self.scope, name).is_none() {
                self.issues.push(Issue::new(
                    token.span,
                    &messages::UNDEFINED_PARAMETER_REFERENCE,
                    &[name],
                ));
            }
        } else if call.is_builtin_call("variables")
            && self.scopes.variable_definition(self.scope, name).is_none()
        {
            self.issues.push(Issue::new(
                token.span,
                &messages::UNDEFINED_VARIABLE_REFERENCE,
                &[name],
            ));
        }
    }
}

/// Flags calls to functions that exist neither in the built-in catalog nor
/// among the user-defined namespaces visible from the call's scope.
pub struct UnrecognizedFunctionVisitor<'a> {
    scopes: &'a ScopeArena,
    scope: ScopeId,
    catalog: &'a FunctionCatalog,
    issues: Vec<Issue>,
}

impl<'a> UnrecognizedFunctionVisitor<'a> {
    pub fn new(scopes: &'a ScopeArena, scope: ScopeId, catalog: &'a FunctionCatalog) -> Self {
        Self {
            scopes,
            scope,
            catalog,
            issues: Vec::new(),
        }
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

impl ExprVisitor for UnrecognizedFunctionVisitor<'_> {
    fn visit_function_call(&mut self, arena: &ExprArena, id: ExprId) {
        let Expr::FunctionCall(call) = arena.get(id) else {
            return;
        };
        let Some(name) = &call.name else {
            return;
        };
        match &call.namespace {
            None => {
                if !self.catalog.contains(&name.text) {
                    self.issues.push(Issue::new(
                        name.span,
                        &messages::UNRECOGNIZED_FUNCTION_NAME,
                        &[&name.text],
                    ));
                }
            }
            Some(namespace) => {
                match self.scopes.namespace_definition(self.scope, &namespace.text) {
                    None => {
                        self.issues.push(Issue::new(
                            namespace.span,
                            &messages::UNRECOGNIZED_NAMESPACE,
                            &[&namespace.text],
                        ));
                    }
                    Some(definition) => {
                        if definition.members.get(&name.text).is_none() {
                            self.issues.push(Issue::new(
                                name.span,
                                &messages::UNRECOGNIZED_NAMESPACED_FUNCTION,
                                &[&name.text, &namespace.text],
                            ));
                        }
                    }
                }
            }
        }
    }
}

/// Checks each call's argument count against the resolved signature. Parse
/// holes count as supplied arguments, so `concat(,)` supplies two. Calls to
/// unrecognized functions are skipped; the unrecognized check covers them.
pub struct ArgumentCountVisitor<'a> {
    scopes: &'a ScopeArena,
    scope: ScopeId,
    catalog: &'a FunctionCatalog,
    issues: Vec<Issue>,
}

impl<'a> ArgumentCountVisitor<'a> {
    pub fn new(scopes: &'a ScopeArena, scope: ScopeId, catalog: &'a FunctionCatalog) -> Self {
        Self {
            scopes,
            scope,
            catalog,
            issues: Vec::new(),
        }
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    fn check_builtin(&mut self, arena: &ExprArena, id: ExprId, call: &FunctionCall, name: &Token) {
        let Some(metadata) = self.catalog.lookup(&name.text) else {
            return;
        };
        let count = call.args.len();
        if metadata.accepts_argument_count(count) {
            return;
        }
        let span = arena.span(id);
        let min = metadata.min_args.to_string();
        match metadata.max_args {
            Some(max) if max == metadata.min_args => {
                self.issues.push(Issue::new(
                    span,
                    &messages::FUNCTION_TAKES_EXACTLY,
                    &[&name.text, &min],
                ));
            }
            Some(max) => {
                self.issues.push(Issue::new(
                    span,
                    &messages::FUNCTION_TAKES_BETWEEN,
                    &[&name.text, &min, &max.to_string()],
                ));
            }
            None => {
                self.issues.push(Issue::new(
                    span,
                    &messages::FUNCTION_TAKES_AT_LEAST,
                    &[&name.text, &min],
                ));
            }
        }
    }

    fn check_user_function(
        &mut self,
        arena: &ExprArena,
        id: ExprId,
        call: &FunctionCall,
        namespace: &Token,
        name: &Token,
    ) {
        let Some(definition) =
            self.scopes
                .user_function_definition(self.scope, &namespace.text, &name.text)
        else {
            return;
        };
        // User functions take exactly their declared parameter count.
        if call.args.len() != definition.arity() {
            self.issues.push(Issue::new(
                arena.span(id),
                &messages::FUNCTION_TAKES_EXACTLY,
                &[&call.full_name(), &definition.arity().to_string()],
            ));
        }
    }
}

impl ExprVisitor for ArgumentCountVisitor<'_> {
    fn visit_function_call(&mut self, arena: &ExprArena, id: ExprId) {
        let Expr::FunctionCall(call) = arena.get(id) else {
            return;
        };
        let Some(name) = call.name.clone() else {
            return;
        };
        match call.namespace.clone() {
            None => self.check_builtin(arena, id, call, &name),
            Some(namespace) => self.check_user_function(arena, id, call, &namespace, &name),
        }
    }
}

/// Checks the first property segment chained directly off a `variables()`
/// call against the variable's declared value.
///
/// An undefined variable suppresses the whole chain: the undefined-variable
/// error already covers it. Deeper chain segments are never checked; they
/// cannot be statically typed without evaluating the template.
pub struct VariablePropertyVisitor<'a> {
    scopes: &'a ScopeArena,
    scope: ScopeId,
    issues: Vec<Issue>,
}

impl<'a> VariablePropertyVisitor<'a> {
    pub fn new(scopes: &'a ScopeArena, scope: ScopeId) -> Self {
        Self {
            scopes,
            scope,
            issues: Vec::new(),
        }
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

impl ExprVisitor for VariablePropertyVisitor<'_> {
    fn visit_property_access(&mut self, arena: &ExprArena, id: ExprId) {
        let Expr::PropertyAccess { source, name, .. } = arena.get(id) else {
            return;
        };
        let Some(name) = name else {
            return;
        };
        // Only the first segment of a chain: the source must be the
        // variables() call itself.
        let Expr::FunctionCall(call) = arena.get(*source) else {
            return;
        };
        if !call.is_builtin_call("variables") {
            return;
        }
        let Some((_, variable_name)) = reference_argument(arena, call) else {
            return;
        };
        let Some(definition) = self.scopes.variable_definition(self.scope, variable_name) else {
            return;
        };
        let defined = match &definition.value {
            Some(Value::Object(object)) => object.has_property_insensitive(&name.text),
            _ => false,
        };
        if !defined {
            self.issues.push(Issue::new(
                name.span,
                &messages::PROPERTY_NOT_DEFINED,
                &[&name.text, variable_name],
            ));
        }
    }
}
