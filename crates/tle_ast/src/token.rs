//! Tokens produced by the expression tokenizer.

use tle_core::text::Span;

/// The kind of an expression token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LeftSquareBracket,
    RightSquareBracket,
    LeftParenthesis,
    RightParenthesis,
    Comma,
    Period,
    /// A quoted string literal, including its quote characters. May be
    /// unterminated.
    QuotedString,
    Number,
    /// A run of ASCII letters/digits not starting with a digit: a potential
    /// function, namespace, or property name.
    Literal,
    Whitespace,
    /// A single character the tokenizer does not recognize. The tokenizer
    /// never fails; judging this as an error is the parser's job.
    Unrecognized,
}

/// A token: kind, span, and source text. Tokens are value objects, freely
/// shared and compared by value. Concatenating the text of every token a
/// string tokenizes to reproduces the string exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }
}
