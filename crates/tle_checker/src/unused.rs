//! Unused-definition accounting.
//!
//! Usage is recorded while walking every parsed expression in the document;
//! the scan then reports any definition no recorded reference can resolve to.
//! Definitions inside an outer-scoped nested template are unreachable by
//! construction (lookups there resolve against the parent), so they are
//! always reported.

use rustc_hash::FxHashSet;
use tle_ast::{walk, Expr, ExprArena, ExprId, ExprVisitor};
use tle_diagnostics::{messages, Issue, IssueCollection};
use tle_parser::ParseResult;
use tle_scopes::{DefinitionKind, ScopeArena, ScopeContext, ScopeId};

fn fold(name: &str) -> String {
    tle_core::unquote(name).to_lowercase()
}

/// Accumulates which definitions the document's expressions actually target.
/// Keys are (resolution scope, kind, folded name), so a reference marks the
/// definition the lookup rules would find, wherever it was written.
#[derive(Debug, Default)]
pub struct UsageAccounting {
    used: FxHashSet<(ScopeId, DefinitionKind, String)>,
}

impl UsageAccounting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every reference inside one parsed expression.
    pub fn record(&mut self, result: &ParseResult, scopes: &ScopeArena) {
        let Some(root) = result.expression else {
            return;
        };
        if !result.is_expression() {
            return;
        }
        let mut recorder = UsageRecorder {
            usage: self,
            resolution: scopes.resolution_scope(result.scope),
        };
        walk(&result.arena, root, &mut recorder);
    }

    fn mark(&mut self, scope: ScopeId, kind: DefinitionKind, name: String) {
        self.used.insert((scope, kind, name));
    }

    fn contains(&self, scope: ScopeId, kind: DefinitionKind, name: &str) -> bool {
        self.used.contains(&(scope, kind, fold(name)))
    }
}

struct UsageRecorder<'a> {
    usage: &'a mut UsageAccounting,
    resolution: ScopeId,
}

impl ExprVisitor for UsageRecorder<'_> {
    fn visit_function_call(&mut self, arena: &ExprArena, id: ExprId) {
        let Expr::FunctionCall(call) = arena.get(id) else {
            return;
        };
        if call.is_builtin_call("parameters") {
            if let Some(token) = arena.sole_string_argument(call) {
                self.usage
                    .mark(self.resolution, DefinitionKind::Parameter, fold(&token.text));
            }
        } else if call.is_builtin_call("variables") {
            if let Some(token) = arena.sole_string_argument(call) {
                self.usage
                    .mark(self.resolution, DefinitionKind::Variable, fold(&token.text));
            }
        } else if let (Some(namespace), Some(name)) = (&call.namespace, &call.name) {
            self.usage
                .mark(self.resolution, DefinitionKind::Namespace, fold(&namespace.text));
            self.usage.mark(
                self.resolution,
                DefinitionKind::UserFunction,
                format!("{}.{}", fold(&namespace.text), fold(&name.text)),
            );
        }
    }
}

/// Report every definition no recorded reference targets. Spans are document
/// coordinates (the definition names live in the JSON tree, not inside an
/// expression string). Warnings come out sorted by span start.
pub fn unused_definition_issues(scopes: &ScopeArena, usage: &UsageAccounting) -> Vec<Issue> {
    let mut collection = IssueCollection::new();

    // Display names for user-function scopes, for the per-function parameter
    // message.
    let mut function_names: Vec<(ScopeId, String)> = Vec::new();
    for (_, scope) in scopes.iter() {
        let Some(namespaces) = &scope.namespaces else {
            continue;
        };
        for namespace in namespaces.values() {
            for member in namespace.members.values() {
                function_names.push((member.scope, member.full_name()));
            }
        }
    }
    let function_name_of = |scope: ScopeId| {
        function_names
            .iter()
            .find(|(id, _)| *id == scope)
            .map(|(_, name)| name.as_str())
    };

    for (id, scope) in scopes.iter() {
        // A definition is reachable only when lookups from its own scope
        // resolve against that scope. Outer-scoped nested templates forward,
        // so everything they declare is unreachable.
        let reachable = scopes.resolution_scope(id) == id;

        if let Some(parameters) = &scope.parameters {
            for definition in parameters.values() {
                if reachable && usage.contains(id, DefinitionKind::Parameter, &definition.name) {
                    continue;
                }
                let issue = if scope.context == ScopeContext::UserFunction {
                    let owner = function_name_of(id).unwrap_or("");
                    Issue::new(
                        definition.name_span,
                        &messages::UNUSED_USER_FUNCTION_PARAMETER,
                        &[&definition.name, owner],
                    )
                } else {
                    Issue::new(
                        definition.name_span,
                        &messages::UNUSED_PARAMETER,
                        &[&definition.name],
                    )
                };
                collection.add(issue);
            }
        }

        if let Some(variables) = &scope.variables {
            for definition in variables.values() {
                if reachable && usage.contains(id, DefinitionKind::Variable, &definition.name) {
                    continue;
                }
                collection.add(Issue::new(
                    definition.name_span,
                    &messages::UNUSED_VARIABLE,
                    &[&definition.name],
                ));
            }
        }

        if let Some(namespaces) = &scope.namespaces {
            for namespace in namespaces.values() {
                for member in namespace.members.values() {
                    let key = format!("{}.{}", fold(&namespace.name), fold(&member.name));
                    if reachable && usage.contains(id, DefinitionKind::UserFunction, &key) {
                        continue;
                    }
                    collection.add(Issue::new(
                        member.name_span,
                        &messages::UNUSED_USER_FUNCTION,
                        &[&member.full_name()],
                    ));
                }
            }
        }
    }

    collection.sort();
    collection.into_issues()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tle_scopes::{build, ScopeBundle};

    fn bundle_from(template: &str) -> ScopeBundle {
        let parsed = tle_json::parse(template);
        build(parsed.value.as_ref())
    }

    const TEMPLATE: &str = r#"{
        "parameters": {
            "used": { "type": "string" },
            "orphan": { "type": "string" }
        },
        "variables": { "v1": 1 },
        "functions": [{
            "namespace": "contoso",
            "members": {
                "pick": { "parameters": [ { "name": "a" }, { "name": "b" } ] }
            }
        }]
    }"#;

    #[test]
    fn test_everything_unused_without_references() {
        let bundle = bundle_from(TEMPLATE);
        let usage = UsageAccounting::new();
        let issues = unused_definition_issues(&bundle.arena, &usage);
        let msgs: Vec<_> = issues.iter().map(|i| i.message.as_str()).collect();
        assert!(msgs.contains(&"The parameter 'used' is never used."));
        assert!(msgs.contains(&"The parameter 'orphan' is never used."));
        assert!(msgs.contains(&"The variable 'v1' is never used."));
        assert!(msgs.contains(&"The user-defined function 'contoso.pick' is never used."));
        assert!(msgs.contains(&"The parameter 'a' of function 'contoso.pick' is never used."));
        for issue in &issues {
            assert_eq!(issue.severity, tle_diagnostics::Severity::Warning);
        }
    }

    #[test]
    fn test_references_mark_definitions_used() {
        let bundle = bundle_from(TEMPLATE);
        let mut usage = UsageAccounting::new();
        let result = tle_parser::parse(
            "\"[contoso.pick(parameters('USED'), variables('v1'))]\"",
            ScopeId::ROOT,
        );
        usage.record(&result, &bundle.arena);
        let issues = unused_definition_issues(&bundle.arena, &usage);
        let msgs: Vec<_> = issues.iter().map(|i| i.message.as_str()).collect();
        assert!(!msgs.contains(&"The parameter 'used' is never used."));
        assert!(!msgs.contains(&"The variable 'v1' is never used."));
        assert!(!msgs.contains(&"The user-defined function 'contoso.pick' is never used."));
        // Still unused: the orphan parameter and the function's own params.
        assert!(msgs.contains(&"The parameter 'orphan' is never used."));
        assert!(msgs.contains(&"The parameter 'a' of function 'contoso.pick' is never used."));
    }

    #[test]
    fn test_function_parameter_usage_is_scoped_to_the_function() {
        let bundle = bundle_from(TEMPLATE);
        let function = bundle
            .arena
            .user_function_definition(ScopeId::ROOT, "contoso", "pick")
            .unwrap();
        let mut usage = UsageAccounting::new();
        // A reference inside the function body targets the function's own
        // parameter, not the top-level one.
        let result = tle_parser::parse("\"[concat(parameters('a'))]\"", function.scope);
        usage.record(&result, &bundle.arena);
        let issues = unused_definition_issues(&bundle.arena, &usage);
        let msgs: Vec<_> = issues.iter().map(|i| i.message.as_str()).collect();
        assert!(!msgs.contains(&"The parameter 'a' of function 'contoso.pick' is never used."));
        assert!(msgs.contains(&"The parameter 'b' of function 'contoso.pick' is never used."));
        assert!(msgs.contains(&"The parameter 'used' is never used."));
    }

    #[test]
    fn test_outer_nested_definitions_are_always_unused() {
        let bundle = bundle_from(
            r#"{
                "resources": [{
                    "type": "Microsoft.Resources/deployments",
                    "properties": {
                        "template": {
                            "variables": { "inert": 1 },
                            "resources": []
                        }
                    }
                }]
            }"#,
        );
        let mut usage = UsageAccounting::new();
        // Even a reference written inside the nested template resolves
        // against the parent and can never reach the inert definition.
        let outer = bundle
            .arena
            .iter()
            .find(|(_, s)| s.context == ScopeContext::NestedDeploymentOuter)
            .map(|(id, _)| id)
            .unwrap();
        let result = tle_parser::parse("\"[variables('inert')]\"", outer);
        usage.record(&result, &bundle.arena);
        let issues = unused_definition_issues(&bundle.arena, &usage);
        let msgs: Vec<_> = issues.iter().map(|i| i.message.as_str()).collect();
        assert!(msgs.contains(&"The variable 'inert' is never used."));
    }
}
