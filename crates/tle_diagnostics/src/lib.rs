//! tle_diagnostics: Issue records and the diagnostic message catalog.
//!
//! User-text problems are never surfaced through `Err`: the parser and every
//! semantic visitor return best-effort results plus a list of `Issue` values.
//! Issues are plain data with structural equality, safe to cache, diff, and
//! re-sort.

use std::fmt;
use tle_core::text::Span;

/// How severe an issue is when surfaced in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Information,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Information => write!(f, "info"),
        }
    }
}

/// A diagnostic message template with a code and severity.
///
/// Message text may contain `{0}`, `{1}`, etc. placeholders, resolved by
/// [`format_message`]. The exact realized strings are part of the crate's
/// compatibility surface and are covered by tests.
#[derive(Debug, Clone)]
pub struct IssueMessage {
    /// Stable diagnostic code (e.g. 1005, 2001).
    pub code: u32,
    pub severity: Severity,
    /// The message template string.
    pub template: &'static str,
}

/// A realized diagnostic anchored to a span of the document.
///
/// Equality is structural (span + message + code + severity), which the test
/// suites rely on heavily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub span: Span,
    pub message: String,
    pub code: u32,
    pub severity: Severity,
}

impl Issue {
    pub fn new(span: Span, message: &IssueMessage, args: &[&str]) -> Self {
        Self {
            span,
            message: format_message(message.template, args),
            code: message.code,
            severity: message.severity,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Return a copy of this issue shifted by a signed byte offset, used to
    /// lift string-relative parse issues into document coordinates.
    pub fn translate(&self, offset: i64) -> Issue {
        Issue {
            span: self.span.translate(offset),
            ..self.clone()
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} TLE{}: {}",
            self.span, self.severity, self.code, self.message
        )
    }
}

/// Format a message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// A collection of issues accumulated during parsing or checking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueCollection {
    issues: Vec<Issue>,
}

impl IssueCollection {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn add(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, other: IssueCollection) {
        self.issues.extend(other.issues);
    }

    pub fn extend_from_slice(&mut self, issues: &[Issue]) {
        self.issues.extend_from_slice(issues);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(Issue::is_error)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Sort issues by ascending start position. The sort is stable, so issues
    /// sharing a span keep their emission order.
    pub fn sort(&mut self) {
        self.issues.sort_by_key(|issue| issue.span.start);
    }
}

// ============================================================================
// Diagnostic messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! issue {
        ($code:expr, Error, $msg:expr) => {
            IssueMessage { code: $code, severity: Severity::Error, template: $msg }
        };
        ($code:expr, Warning, $msg:expr) => {
            IssueMessage { code: $code, severity: Severity::Warning, template: $msg }
        };
    }

    // ========================================================================
    // Expression syntax (1000-1099)
    // ========================================================================
    pub const EXPECTED_RIGHT_SQUARE_BRACKET: IssueMessage =
        issue!(1001, Error, "Expected a right square bracket (']').");
    pub const EXPECTED_RIGHT_PARENTHESIS: IssueMessage =
        issue!(1002, Error, "Expected a right parenthesis (')').");
    pub const MISSING_FUNCTION_ARGUMENT_LIST: IssueMessage =
        issue!(1003, Error, "Missing function argument list.");
    pub const EXPECTED_FUNCTION_OR_PROPERTY_EXPRESSION: IssueMessage =
        issue!(1004, Error, "Expected a function or property expression.");
    pub const EXPECTED_ARGUMENT: IssueMessage =
        issue!(1005, Error, "Expected a constant string, function, or property expression.");
    pub const EXPECTED_COMMA: IssueMessage = issue!(1006, Error, "Expected a comma (',').");
    pub const EXPECTED_FUNCTION_NAME: IssueMessage =
        issue!(1007, Error, "Expected a function name.");
    pub const EXPECTED_LITERAL_VALUE: IssueMessage =
        issue!(1008, Error, "Expected a literal value.");
    pub const EXPECTED_END_OF_STRING: IssueMessage =
        issue!(1009, Error, "Expected the end of the string.");
    pub const NOTHING_AFTER_CLOSING_BRACKET: IssueMessage = issue!(
        1010,
        Error,
        "Nothing should exist after the closing ']' except for whitespace."
    );

    // ========================================================================
    // JSON document (1100-1199)
    // ========================================================================
    pub const JSON_UNEXPECTED_CHARACTER: IssueMessage =
        issue!(1100, Error, "Unexpected character '{0}'.");
    pub const JSON_UNEXPECTED_END: IssueMessage =
        issue!(1101, Error, "Unexpected end of document.");
    pub const JSON_EXPECTED_VALUE: IssueMessage = issue!(1102, Error, "Expected a JSON value.");
    pub const JSON_EXPECTED_PROPERTY_NAME: IssueMessage =
        issue!(1103, Error, "Expected a property name.");
    pub const JSON_EXPECTED_COLON: IssueMessage = issue!(1104, Error, "Expected a colon (':').");
    pub const JSON_UNTERMINATED_STRING: IssueMessage =
        issue!(1105, Error, "Unterminated string literal.");
    pub const JSON_UNTERMINATED_COMMENT: IssueMessage =
        issue!(1106, Error, "Unterminated block comment.");

    // ========================================================================
    // Semantic checks (2000-2099)
    // ========================================================================
    pub const UNDEFINED_PARAMETER_REFERENCE: IssueMessage =
        issue!(2000, Error, "Undefined parameter reference: '{0}'");
    pub const UNDEFINED_VARIABLE_REFERENCE: IssueMessage =
        issue!(2001, Error, "Undefined variable reference: '{0}'");
    pub const UNRECOGNIZED_FUNCTION_NAME: IssueMessage =
        issue!(2002, Error, "Unrecognized function name '{0}'.");
    pub const UNRECOGNIZED_NAMESPACE: IssueMessage =
        issue!(2003, Error, "Unrecognized user-defined function namespace '{0}'.");
    pub const UNRECOGNIZED_NAMESPACED_FUNCTION: IssueMessage = issue!(
        2004,
        Error,
        "Unrecognized function name '{0}' in user-defined namespace '{1}'."
    );
    pub const FUNCTION_TAKES_EXACTLY: IssueMessage =
        issue!(2005, Error, "The function '{0}' takes {1} argument(s).");
    pub const FUNCTION_TAKES_AT_LEAST: IssueMessage =
        issue!(2006, Error, "The function '{0}' takes at least {1} argument(s).");
    pub const FUNCTION_TAKES_BETWEEN: IssueMessage = issue!(
        2007,
        Error,
        "The function '{0}' takes between {1} and {2} argument(s)."
    );
    pub const PROPERTY_NOT_DEFINED: IssueMessage = issue!(
        2008,
        Error,
        "Property \"{0}\" is not a defined property of \"variables('{1}')\"."
    );

    // ========================================================================
    // Unused definitions (2100-2199)
    // ========================================================================
    pub const UNUSED_PARAMETER: IssueMessage =
        issue!(2100, Warning, "The parameter '{0}' is never used.");
    pub const UNUSED_VARIABLE: IssueMessage =
        issue!(2101, Warning, "The variable '{0}' is never used.");
    pub const UNUSED_USER_FUNCTION: IssueMessage =
        issue!(2102, Warning, "The user-defined function '{0}' is never used.");
    pub const UNUSED_USER_FUNCTION_PARAMETER: IssueMessage = issue!(
        2103,
        Warning,
        "The parameter '{0}' of function '{1}' is never used."
    );
}
