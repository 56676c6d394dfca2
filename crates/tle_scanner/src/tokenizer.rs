//! The TLE tokenizer.
//!
//! The tokenizer never fails: malformed input always yields some token
//! stream, deferring error judgment to the parser. Unterminated string
//! literals run to end of input; characters outside the grammar come back as
//! one-character `Unrecognized` tokens.

use tle_ast::{Token, TokenKind};
use tle_core::text::Span;

/// A lazy, restartable token reader over the contents of a quoted TLE
/// string. Each `read` call advances the cursor and returns the next token,
/// or `None` at end of input. Spans are offset by `base`, the document
/// position of the first character, so tokens locate themselves in the
/// document directly.
pub struct Tokenizer<'a> {
    text: &'a str,
    pos: usize,
    base: u32,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_base(text, 0)
    }

    pub fn with_base(text: &'a str, base: u32) -> Self {
        Self { text, pos: 0, base }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        let span = Span::new(
            self.base + start as u32,
            (self.pos - start) as u32,
        );
        Token::new(kind, span, &self.text[start..self.pos])
    }

    /// Read the next token, or `None` at end of input.
    pub fn read(&mut self) -> Option<Token> {
        let start = self.pos;
        let b = self.peek_byte()?;
        let kind = match b {
            b'[' => self.punctuation(TokenKind::LeftSquareBracket),
            b']' => self.punctuation(TokenKind::RightSquareBracket),
            b'(' => self.punctuation(TokenKind::LeftParenthesis),
            b')' => self.punctuation(TokenKind::RightParenthesis),
            b',' => self.punctuation(TokenKind::Comma),
            b'.' => self.punctuation(TokenKind::Period),
            b'\'' | b'"' => self.quoted_string(b),
            b' ' | b'\t' | b'\r' | b'\n' => self.whitespace(),
            b'-' if self.next_is_digit() => self.number(),
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' => self.literal(),
            _ => {
                // One whole character, which may be multi-byte.
                let ch = self.text[self.pos..].chars().next()?;
                self.pos += ch.len_utf8();
                TokenKind::Unrecognized
            }
        };
        Some(self.token(kind, start))
    }

    fn punctuation(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn next_is_digit(&self) -> bool {
        self.text
            .as_bytes()
            .get(self.pos + 1)
            .is_some_and(u8::is_ascii_digit)
    }

    /// A quoted run. A doubled quote character inside the literal is an
    /// escaped quote and does not terminate it. An unterminated literal runs
    /// to end of input and is still a QuotedString token, never an error.
    fn quoted_string(&mut self, quote: u8) -> TokenKind {
        self.pos += 1;
        while let Some(b) = self.peek_byte() {
            self.pos += 1;
            if b == quote {
                if self.peek_byte() == Some(quote) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }
        TokenKind::QuotedString
    }

    fn whitespace(&mut self) -> TokenKind {
        while matches!(self.peek_byte(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
        TokenKind::Whitespace
    }

    /// A number: optional leading `-`, digits, at most one embedded `.`
    /// followed by more digits.
    fn number(&mut self) -> TokenKind {
        if self.peek_byte() == Some(b'-') {
            self.pos += 1;
        }
        while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek_byte() == Some(b'.')
            && self
                .text
                .as_bytes()
                .get(self.pos + 1)
                .is_some_and(u8::is_ascii_digit)
        {
            self.pos += 1;
            while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        TokenKind::Number
    }

    /// A run of ASCII letters and digits not starting with a digit.
    fn literal(&mut self) -> TokenKind {
        while self.peek_byte().is_some_and(|b| b.is_ascii_alphanumeric()) {
            self.pos += 1;
        }
        TokenKind::Literal
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.read()
    }
}
