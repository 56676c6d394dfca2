//! The expression parser implementation.

use tle_ast::{Expr, ExprArena, ExprId, FunctionCall, Token, TokenKind};
use tle_core::text::Span;
use tle_diagnostics::{messages, Issue, IssueMessage};
use tle_scanner::Tokenizer;
use tle_scopes::ScopeId;

/// The outcome of parsing one quoted string.
///
/// Covers the degenerate non-expression case: a plain quoted string parses to
/// a single string literal covering the whole text, with no brackets and no
/// issues. Structurally comparable; parsing the same input twice yields equal
/// results.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub arena: ExprArena,
    pub left_square_bracket: Option<Token>,
    pub expression: Option<ExprId>,
    pub right_square_bracket: Option<Token>,
    pub issues: Vec<Issue>,
    /// The lexical scope in effect at this string's position, needed later to
    /// resolve `parameters()` and `variables()` references.
    pub scope: ScopeId,
}

impl ParseResult {
    /// Whether the string was expression-shaped (began with a single `[`).
    pub fn is_expression(&self) -> bool {
        self.left_square_bracket.is_some()
    }

    /// The span of the parsed expression, if one was built. Relative to the
    /// quoted string, like every other span in the result.
    pub fn expression_span(&self) -> Option<Span> {
        self.expression.map(|id| self.arena.span(id))
    }
}

/// Parse one quoted string.
///
/// `quoted_text` must be non-empty and start with a quote character; spans in
/// the result are relative to it (offset 0 is the opening quote). Violating
/// that contract panics: it is a caller bug, never a property of user text.
/// Every malformed *user* input returns a best-effort `ParseResult`.
pub fn parse(quoted_text: &str, scope: ScopeId) -> ParseResult {
    assert!(
        !quoted_text.is_empty(),
        "parse requires a non-empty quoted string"
    );
    let quote = quoted_text.as_bytes()[0];
    assert!(
        quote == b'"' || quote == b'\'',
        "parse requires surrounding quote characters"
    );

    let closed = quoted_text.len() >= 2 && *quoted_text.as_bytes().last().unwrap() == quote;
    let inner = if closed {
        &quoted_text[1..quoted_text.len() - 1]
    } else {
        &quoted_text[1..]
    };

    // `[[` escapes a literal left bracket, so only a single leading `[`
    // opens an expression.
    if !inner.starts_with('[') || inner.starts_with("[[") {
        let mut arena = ExprArena::new();
        let token = Token::new(
            TokenKind::QuotedString,
            Span::new(0, quoted_text.len() as u32),
            quoted_text,
        );
        let expression = arena.alloc(Expr::StringLiteral { token });
        return ParseResult {
            arena,
            left_square_bracket: None,
            expression: Some(expression),
            right_square_bracket: None,
            issues: Vec::new(),
            scope,
        };
    }

    let mut parser = Parser {
        tokenizer: Tokenizer::with_base(inner, 1),
        current: None,
        last_end: 1,
        arena: ExprArena::new(),
        issues: Vec::new(),
    };
    parser.advance();
    parser.parse(scope)
}

struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    current: Option<Token>,
    /// End position of the last consumed token; anchors end-of-input issues.
    last_end: u32,
    arena: ExprArena,
    issues: Vec<Issue>,
}

impl<'a> Parser<'a> {
    /// Move to the next non-whitespace token.
    fn advance(&mut self) {
        self.current = loop {
            match self.tokenizer.read() {
                Some(token) if token.kind == TokenKind::Whitespace => continue,
                other => break other,
            }
        };
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.current.as_ref().map(|t| t.kind)
    }

    /// Consume the current token unconditionally.
    fn take(&mut self) -> Token {
        let token = self.current.take().expect("take requires a current token");
        self.last_end = token.span.after_end();
        self.advance();
        token
    }

    fn take_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.current_kind() == Some(kind) {
            Some(self.take())
        } else {
            None
        }
    }

    fn issue_at(&mut self, span: Span, message: &IssueMessage) {
        self.issues.push(Issue::new(span, message, &[]));
    }

    /// The anchor for a missing-token issue: the current token's span, or an
    /// empty span at the end of consumed input.
    fn missing_anchor(&self) -> Span {
        self.current
            .as_ref()
            .map(|t| t.span)
            .unwrap_or_else(|| Span::empty(self.last_end))
    }

    fn parse(mut self, scope: ScopeId) -> ParseResult {
        // The first token is the `[` that made this an expression.
        debug_assert_eq!(self.current_kind(), Some(TokenKind::LeftSquareBracket));
        let left_square_bracket = Some(self.take());

        let expression = self.parse_expression(&messages::EXPECTED_FUNCTION_OR_PROPERTY_EXPRESSION);

        // Everything after the expression: the first `]` closes it; any
        // other non-whitespace content is flagged but does not stop us.
        let mut right_square_bracket: Option<Token> = None;
        while self.current.is_some() {
            if right_square_bracket.is_none()
                && self.current_kind() == Some(TokenKind::RightSquareBracket)
            {
                right_square_bracket = Some(self.take());
            } else {
                let token = self.take();
                let message = if right_square_bracket.is_none() {
                    &messages::EXPECTED_END_OF_STRING
                } else {
                    &messages::NOTHING_AFTER_CLOSING_BRACKET
                };
                self.issue_at(token.span, message);
            }
        }
        if right_square_bracket.is_none() {
            let span = Span::empty(self.last_end);
            self.issue_at(span, &messages::EXPECTED_RIGHT_SQUARE_BRACKET);
        }

        ParseResult {
            arena: self.arena,
            left_square_bracket,
            expression,
            right_square_bracket,
            issues: self.issues,
            scope,
        }
    }

    /// Parse one expression. `missing` is the issue used when no expression
    /// is present: argument positions and top level word it differently.
    fn parse_expression(&mut self, missing: &IssueMessage) -> Option<ExprId> {
        match self.current_kind() {
            Some(TokenKind::QuotedString) => {
                let token = self.take();
                Some(self.arena.alloc(Expr::StringLiteral { token }))
            }
            Some(TokenKind::Number) => {
                let token = self.take();
                Some(self.arena.alloc(Expr::NumberLiteral { token }))
            }
            Some(TokenKind::Literal) => {
                let call = self.parse_function_call();
                Some(self.parse_access_chain(call))
            }
            Some(TokenKind::RightSquareBracket) | None => {
                // Leave the bracket for the caller; just flag the hole.
                let span = self.missing_anchor();
                self.issue_at(span, missing);
                None
            }
            Some(_) => {
                let token = self.take();
                self.issue_at(token.span, missing);
                None
            }
        }
    }

    /// Parse a (possibly namespaced) function call. The current token is the
    /// leading literal. Missing pieces still produce a call node, with one
    /// issue per missing required token.
    fn parse_function_call(&mut self) -> ExprId {
        let first = self.take();

        let (namespace, period, name) = if self.current_kind() == Some(TokenKind::Period) {
            let period = self.take();
            let name = self.take_if(TokenKind::Literal);
            if name.is_none() {
                let span = self.missing_anchor();
                self.issue_at(span, &messages::EXPECTED_FUNCTION_NAME);
            }
            (Some(first), Some(period), name)
        } else {
            (None, None, Some(first))
        };

        let left_paren = self.take_if(TokenKind::LeftParenthesis);
        let mut commas = Vec::new();
        let mut args: Vec<Option<ExprId>> = Vec::new();
        let mut right_paren = None;

        if left_paren.is_none() {
            let span = name
                .as_ref()
                .or(namespace.as_ref())
                .map(|t| t.span)
                .unwrap_or_else(|| self.missing_anchor());
            self.issue_at(span, &messages::MISSING_FUNCTION_ARGUMENT_LIST);
        } else {
            // Argument list: comma separated, with explicit holes for missing
            // arguments so positions stay stable.
            let mut expect_arg = true;
            loop {
                match self.current_kind() {
                    None => {
                        let span = Span::empty(self.last_end);
                        self.issue_at(span, &messages::EXPECTED_RIGHT_PARENTHESIS);
                        break;
                    }
                    Some(TokenKind::RightParenthesis) => {
                        if expect_arg && !commas.is_empty() {
                            // Trailing comma: a hole in the last position.
                            let span = self.missing_anchor();
                            self.issue_at(span, &messages::EXPECTED_ARGUMENT);
                            args.push(None);
                        }
                        right_paren = Some(self.take());
                        break;
                    }
                    Some(TokenKind::Comma) => {
                        if expect_arg {
                            let span = self.missing_anchor();
                            self.issue_at(span, &messages::EXPECTED_ARGUMENT);
                            args.push(None);
                        }
                        commas.push(self.take());
                        expect_arg = true;
                    }
                    Some(TokenKind::RightSquareBracket) => {
                        // The expression's closing bracket arrived before the
                        // argument list closed; leave it for the caller.
                        let span = self.missing_anchor();
                        self.issue_at(span, &messages::EXPECTED_RIGHT_PARENTHESIS);
                        break;
                    }
                    Some(_) => {
                        if !expect_arg {
                            let span = self.missing_anchor();
                            self.issue_at(span, &messages::EXPECTED_COMMA);
                        }
                        args.push(self.parse_expression(&messages::EXPECTED_ARGUMENT));
                        expect_arg = false;
                    }
                }
            }
        }

        let call = self.arena.alloc(Expr::FunctionCall(FunctionCall {
            namespace,
            period,
            name,
            left_paren,
            commas,
            args: args.clone(),
            right_paren,
        }));
        for arg in args.into_iter().flatten() {
            self.arena.set_parent(arg, call);
        }
        call
    }

    /// Chain property accesses (`.name`) and array accesses (`[index]`) off
    /// an already-parsed source expression, indefinitely.
    fn parse_access_chain(&mut self, mut node: ExprId) -> ExprId {
        loop {
            match self.current_kind() {
                Some(TokenKind::Period) => {
                    let period = self.take();
                    let name = self.take_if(TokenKind::Literal);
                    if name.is_none() {
                        let span = self.missing_anchor();
                        self.issue_at(span, &messages::EXPECTED_LITERAL_VALUE);
                    }
                    let access = self.arena.alloc(Expr::PropertyAccess {
                        source: node,
                        period,
                        name,
                    });
                    self.arena.set_parent(node, access);
                    node = access;
                }
                Some(TokenKind::LeftSquareBracket) => {
                    let left_bracket = self.take();
                    let index = if self.current_kind() == Some(TokenKind::RightSquareBracket) {
                        let span = self.missing_anchor();
                        self.issue_at(span, &messages::EXPECTED_FUNCTION_OR_PROPERTY_EXPRESSION);
                        None
                    } else {
                        self.parse_expression(&messages::EXPECTED_FUNCTION_OR_PROPERTY_EXPRESSION)
                    };
                    let right_bracket = self.take_if(TokenKind::RightSquareBracket);
                    if right_bracket.is_none() {
                        let span = self.missing_anchor();
                        self.issue_at(span, &messages::EXPECTED_RIGHT_SQUARE_BRACKET);
                    }
                    let access = self.arena.alloc(Expr::ArrayAccess {
                        source: node,
                        left_bracket,
                        index,
                        right_bracket,
                    });
                    self.arena.set_parent(node, access);
                    if let Some(index) = index {
                        self.arena.set_parent(index, access);
                    }
                    node = access;
                }
                _ => return node,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> ScopeId {
        ScopeId::ROOT
    }

    fn messages_of(result: &ParseResult) -> Vec<&str> {
        result.issues.iter().map(|i| i.message.as_str()).collect()
    }

    fn call<'a>(result: &'a ParseResult, id: ExprId) -> &'a FunctionCall {
        match result.arena.get(id) {
            Expr::FunctionCall(c) => c,
            other => panic!("expected a function call, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_string_is_not_an_expression() {
        let result = parse("\"just text\"", scope());
        assert!(!result.is_expression());
        assert!(result.issues.is_empty());
        let expr = result.expression.unwrap();
        match result.arena.get(expr) {
            Expr::StringLiteral { token } => {
                assert_eq!(token.span, Span::new(0, 11));
                assert_eq!(token.text, "\"just text\"");
            }
            other => panic!("expected a string literal, got {:?}", other),
        }
    }

    #[test]
    fn test_double_bracket_escape_is_not_an_expression() {
        let result = parse("\"[[concat('a')]\"", scope());
        assert!(!result.is_expression());
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_simple_function_call() {
        let result = parse("\"[concat('a','b')]\"", scope());
        assert!(result.issues.is_empty(), "issues: {:?}", result.issues);
        assert!(result.left_square_bracket.is_some());
        assert!(result.right_square_bracket.is_some());
        let c = call(&result, result.expression.unwrap());
        assert_eq!(c.full_name(), "concat");
        assert_eq!(c.args.len(), 2);
        assert_eq!(c.commas.len(), 1);
        for arg in &c.args {
            let arg = arg.unwrap();
            assert!(matches!(result.arena.get(arg), Expr::StringLiteral { .. }));
        }
    }

    #[test]
    fn test_lone_open_bracket() {
        let result = parse("\"[\"", scope());
        assert!(result.left_square_bracket.is_some());
        assert!(result.expression.is_none());
        assert!(result.right_square_bracket.is_none());
        let msgs = messages_of(&result);
        assert_eq!(msgs.len(), 2);
        assert!(msgs.contains(&"Expected a right square bracket (']')."));
        assert!(msgs.contains(&"Expected a function or property expression."));
    }

    #[test]
    fn test_missing_argument_list() {
        let result = parse("\"[concat]\"", scope());
        let c = call(&result, result.expression.unwrap());
        assert_eq!(c.full_name(), "concat");
        assert!(c.left_paren.is_none());
        assert!(result.right_square_bracket.is_some());
        assert_eq!(messages_of(&result), vec!["Missing function argument list."]);
    }

    #[test]
    fn test_missing_right_paren() {
        let result = parse("\"[concat('a'\"", scope());
        let msgs = messages_of(&result);
        assert!(msgs.contains(&"Expected a right parenthesis (')')."));
        assert!(msgs.contains(&"Expected a right square bracket (']')."));
        let c = call(&result, result.expression.unwrap());
        assert!(c.right_paren.is_none());
        assert_eq!(c.args.len(), 1);
    }

    #[test]
    fn test_argument_holes() {
        let result = parse("\"[concat('a',,'b')]\"", scope());
        let c = call(&result, result.expression.unwrap());
        assert_eq!(c.args.len(), 3);
        assert!(c.args[0].is_some());
        assert!(c.args[1].is_none());
        assert!(c.args[2].is_some());
        assert_eq!(
            messages_of(&result),
            vec!["Expected a constant string, function, or property expression."]
        );
        // The issue sits on the second comma.
        assert_eq!(result.issues[0].span, Span::new(13, 1));
    }

    #[test]
    fn test_leading_and_trailing_comma_holes() {
        let result = parse("\"[concat(,'a',)]\"", scope());
        let c = call(&result, result.expression.unwrap());
        assert_eq!(c.args.len(), 3);
        assert!(c.args[0].is_none());
        assert!(c.args[1].is_some());
        assert!(c.args[2].is_none());
        assert_eq!(result.issues.len(), 2);
    }

    #[test]
    fn test_namespaced_call() {
        let result = parse("\"[contoso.pick('x')]\"", scope());
        assert!(result.issues.is_empty());
        let c = call(&result, result.expression.unwrap());
        assert_eq!(c.full_name(), "contoso.pick");
        assert!(c.namespace.is_some());
        assert!(c.period.is_some());
    }

    #[test]
    fn test_property_and_array_access_chain() {
        let result = parse("\"[resourceGroup().location.id[0].name]\"", scope());
        assert!(result.issues.is_empty(), "issues: {:?}", result.issues);
        let top = result.expression.unwrap();
        // Outermost node is the final `.name` property access.
        match result.arena.get(top) {
            Expr::PropertyAccess { name, .. } => {
                assert_eq!(name.as_ref().unwrap().text, "name");
            }
            other => panic!("expected property access, got {:?}", other),
        }
        // The chain bottoms out at the resourceGroup() call.
        let mut node = top;
        loop {
            match result.arena.get(node) {
                Expr::PropertyAccess { source, .. } | Expr::ArrayAccess { source, .. } => {
                    node = *source;
                }
                Expr::FunctionCall(c) => {
                    assert_eq!(c.full_name(), "resourceGroup");
                    break;
                }
                other => panic!("unexpected chain node {:?}", other),
            }
        }
    }

    #[test]
    fn test_nested_calls() {
        let result = parse(
            "\"[concat(parameters('name'), '-', variables('suffix'))]\"",
            scope(),
        );
        assert!(result.issues.is_empty());
        let c = call(&result, result.expression.unwrap());
        assert_eq!(c.args.len(), 3);
        let first = call(&result, c.args[0].unwrap());
        assert_eq!(first.full_name(), "parameters");
        assert_eq!(
            result.arena.sole_string_argument(first).unwrap().text,
            "'name'"
        );
    }

    #[test]
    fn test_trailing_junk_before_and_after_bracket() {
        let result = parse("\"[concat('a') junk] more]\"", scope());
        assert!(result.right_square_bracket.is_some());
        let msgs = messages_of(&result);
        assert_eq!(
            msgs,
            vec![
                "Expected the end of the string.",
                "Nothing should exist after the closing ']' except for whitespace.",
                "Nothing should exist after the closing ']' except for whitespace.",
            ]
        );
    }

    #[test]
    fn test_issues_are_in_source_order() {
        let result = parse("\"[concat(,) junk\"", scope());
        let starts: Vec<_> = result.issues.iter().map(|i| i.span.start).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn test_parse_is_idempotent() {
        for text in [
            "\"[concat('a','b')]\"",
            "\"[\"",
            "\"[concat(,) junk\"",
            "\"plain\"",
            "\"[ns.fn(1)[0].x]\"",
        ] {
            assert_eq!(parse(text, scope()), parse(text, scope()));
        }
    }

    #[test]
    fn test_span_invariant_holds_for_all_nodes() {
        let result = parse("\"[concat(parameters('p'), 1)[0].name]\"", scope());
        // Every node's span must contain its children's spans.
        let top = result.expression.unwrap();
        let mut stack = vec![top];
        while let Some(id) = stack.pop() {
            let span = result.arena.span(id);
            for child in result.arena.children(id) {
                let child_span = result.arena.span(child);
                assert_eq!(span.union(&child_span), span);
                stack.push(child);
            }
        }
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn test_empty_input_is_a_contract_violation() {
        parse("", scope());
    }

    #[test]
    #[should_panic(expected = "surrounding quote")]
    fn test_unquoted_input_is_a_contract_violation() {
        parse("[concat()]", scope());
    }

    #[test]
    fn test_unterminated_quoted_text_still_parses() {
        // A missing closing double quote is user text, not a contract
        // violation.
        let result = parse("\"[concat('a')]", scope());
        assert!(result.is_expression());
        assert!(result.right_square_bracket.is_some());
    }
}
