//! Collecting every syntactic reference to one definition.

use crate::visitors::reference_argument;
use tle_ast::{walk, Expr, ExprArena, ExprId, ExprVisitor, Token};
use tle_core::Span;
use tle_parser::ParseResult;
use tle_scopes::{DefinitionKind, ReferenceTarget, ScopeArena};

/// Collect the span of every reference to `target` inside one parsed
/// expression. Spans are relative to the quoted string; string-argument
/// references (`parameters('x')`) are reported without their quotes, so the
/// span covers exactly the name. Each node is visited once, so no duplicates
/// are produced.
pub fn collect_references(
    result: &ParseResult,
    scopes: &ScopeArena,
    target: &ReferenceTarget,
) -> Vec<Span> {
    let Some(root) = result.expression else {
        return Vec::new();
    };
    if !result.is_expression() {
        return Vec::new();
    }
    let mut collector = ReferenceCollector {
        scopes,
        result,
        target,
        spans: Vec::new(),
    };
    walk(&result.arena, root, &mut collector);
    collector.spans
}

/// The span of a quoted string token's content, without the quotes.
pub fn unquoted_token_span(token: &Token) -> Span {
    let bytes = token.text.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if first == last && (first == b'\'' || first == b'"') {
            return Span::new(token.span.start + 1, token.span.length - 2);
        }
    }
    token.span
}

struct ReferenceCollector<'a> {
    scopes: &'a ScopeArena,
    result: &'a ParseResult,
    target: &'a ReferenceTarget,
    spans: Vec<Span>,
}

impl ExprVisitor for ReferenceCollector<'_> {
    fn visit_function_call(&mut self, arena: &ExprArena, id: ExprId) {
        let Expr::FunctionCall(call) = arena.get(id) else {
            return;
        };
        let resolution = self.scopes.resolution_scope(self.result.scope);
        match self.target.kind {
            DefinitionKind::Parameter | DefinitionKind::UserFunctionParameter => {
                if call.is_builtin_call("parameters") {
                    if let Some((token, name)) = reference_argument(arena, call) {
                        if self.target.matches(self.target.kind, resolution, name) {
                            self.spans.push(unquoted_token_span(token));
                        }
                    }
                }
            }
            DefinitionKind::Variable => {
                if call.is_builtin_call("variables") {
                    if let Some((token, name)) = reference_argument(arena, call) {
                        if self.target.matches(DefinitionKind::Variable, resolution, name) {
                            self.spans.push(unquoted_token_span(token));
                        }
                    }
                }
            }
            DefinitionKind::Namespace => {
                if let Some(namespace) = &call.namespace {
                    if self
                        .target
                        .matches(DefinitionKind::Namespace, resolution, &namespace.text)
                    {
                        self.spans.push(namespace.span);
                    }
                }
            }
            DefinitionKind::UserFunction => {
                if let (Some(namespace), Some(name)) = (&call.namespace, &call.name) {
                    let namespace_matches = self
                        .target
                        .namespace
                        .as_deref()
                        .is_some_and(|ns| ns.eq_ignore_ascii_case(&namespace.text));
                    if namespace_matches
                        && self
                            .target
                            .matches(DefinitionKind::UserFunction, resolution, &name.text)
                    {
                        self.spans.push(name.span);
                    }
                }
            }
            DefinitionKind::BuiltinFunction => {
                if call.namespace.is_none() {
                    if let Some(name) = &call.name {
                        if name.text.eq_ignore_ascii_case(&self.target.name) {
                            self.spans.push(name.span);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tle_scopes::ScopeId;

    fn target(kind: DefinitionKind, name: &str) -> ReferenceTarget {
        ReferenceTarget {
            kind,
            scope: ScopeId::ROOT,
            namespace: None,
            name: name.to_string(),
            name_span: Span::empty(0),
        }
    }

    #[test]
    fn test_parameter_references_are_unquoted_spans() {
        let result = tle_parser::parse(
            "\"[concat(parameters('p1'), parameters('P1'))]\"",
            ScopeId::ROOT,
        );
        let scopes = tle_scopes::build(None).arena;
        let spans = collect_references(&result, &scopes, &target(DefinitionKind::Parameter, "p1"));
        assert_eq!(spans.len(), 2);
        // 'p1' sits at offset 20 with quotes; the reported span drops them.
        assert_eq!(spans[0], Span::new(21, 2));
    }

    #[test]
    fn test_other_names_do_not_match() {
        let result = tle_parser::parse("\"[parameters('other')]\"", ScopeId::ROOT);
        let scopes = tle_scopes::build(None).arena;
        let spans = collect_references(&result, &scopes, &target(DefinitionKind::Parameter, "p1"));
        assert!(spans.is_empty());
    }

    #[test]
    fn test_variable_call_does_not_match_parameter_target() {
        let result = tle_parser::parse("\"[variables('p1')]\"", ScopeId::ROOT);
        let scopes = tle_scopes::build(None).arena;
        let spans = collect_references(&result, &scopes, &target(DefinitionKind::Parameter, "p1"));
        assert!(spans.is_empty());
    }

    #[test]
    fn test_builtin_function_references() {
        let result = tle_parser::parse("\"[concat('a', concat('b'))]\"", ScopeId::ROOT);
        let scopes = tle_scopes::build(None).arena;
        let spans = collect_references(
            &result,
            &scopes,
            &target(DefinitionKind::BuiltinFunction, "CONCAT"),
        );
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_user_function_references() {
        let result = tle_parser::parse("\"[contoso.pick(contoso.other())]\"", ScopeId::ROOT);
        let scopes = tle_scopes::build(None).arena;
        let mut t = target(DefinitionKind::UserFunction, "pick");
        t.namespace = Some("contoso".to_string());
        let spans = collect_references(&result, &scopes, &t);
        assert_eq!(spans.len(), 1);
    }
}
