//! A tolerant reader for JSON documents with comments.
//!
//! The deployment-template format permits `//` and `/* */` comments, so the
//! reader skips them as trivia. Malformed input never aborts the read: the
//! reader records an issue, recovers at the next plausible boundary, and
//! keeps going, so that a partially edited document still yields a navigable
//! tree.

use crate::value::{ArrayValue, ObjectValue, Property, StringValue, Value};
use memchr::{memchr, memchr2};
use tle_core::text::Span;
use tle_diagnostics::{messages, Issue};

/// The outcome of reading a document: a best-effort value tree plus issues.
#[derive(Debug, Clone)]
pub struct DocumentParse {
    pub value: Option<Value>,
    pub issues: Vec<Issue>,
}

/// Read a JSON document into a spanned value tree.
pub fn parse(text: &str) -> DocumentParse {
    let mut reader = Reader {
        text: text.as_bytes(),
        pos: 0,
        issues: Vec::new(),
    };
    reader.skip_trivia();
    let value = reader.read_value();
    reader.skip_trivia();
    if !reader.at_end() {
        let span = Span::new(reader.pos as u32, 1);
        let ch = (text.as_bytes()[reader.pos] as char).to_string();
        reader
            .issues
            .push(Issue::new(span, &messages::JSON_UNEXPECTED_CHARACTER, &[&ch]));
    }
    DocumentParse {
        value,
        issues: reader.issues,
    }
}

struct Reader<'a> {
    text: &'a [u8],
    pos: usize,
    issues: Vec<Issue>,
}

impl<'a> Reader<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    fn issue(&mut self, span: Span, message: &tle_diagnostics::IssueMessage, args: &[&str]) {
        self.issues.push(Issue::new(span, message, args));
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) {
        loop {
            while let Some(b) = self.peek() {
                if b == b' ' || b == b'\t' || b == b'\r' || b == b'\n' {
                    self.pos += 1;
                } else {
                    break;
                }
            }
            match (self.peek(), self.text.get(self.pos + 1).copied()) {
                (Some(b'/'), Some(b'/')) => {
                    let rest = &self.text[self.pos..];
                    match memchr(b'\n', rest) {
                        Some(offset) => self.pos += offset + 1,
                        None => self.pos = self.text.len(),
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        let rest = &self.text[self.pos..];
                        match memchr(b'*', rest) {
                            Some(offset) if self.text.get(self.pos + offset + 1) == Some(&b'/') => {
                                self.pos += offset + 2;
                                break;
                            }
                            Some(offset) => self.pos += offset + 1,
                            None => {
                                self.pos = self.text.len();
                                let span = Span::from_bounds(start as u32, self.pos as u32);
                                self.issue(span, &messages::JSON_UNTERMINATED_COMMENT, &[]);
                                break;
                            }
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn read_value(&mut self) -> Option<Value> {
        match self.peek() {
            None => {
                let span = Span::empty(self.pos as u32);
                self.issue(span, &messages::JSON_UNEXPECTED_END, &[]);
                None
            }
            Some(b'{') => Some(Value::Object(self.read_object())),
            Some(b'[') => Some(Value::Array(self.read_array())),
            Some(b'"') => Some(Value::String(self.read_string())),
            Some(b) if b == b'-' || b.is_ascii_digit() => Some(self.read_number()),
            Some(_) => self.read_keyword(),
        }
    }

    fn read_keyword(&mut self) -> Option<Value> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphabetic() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let span = Span::from_bounds(start as u32, self.pos as u32);
        match &self.text[start..self.pos] {
            b"true" => Some(Value::Boolean(span, true)),
            b"false" => Some(Value::Boolean(span, false)),
            b"null" => Some(Value::Null(span)),
            _ => {
                if self.pos == start {
                    // Not even a letter; skip one character so we always advance.
                    self.pos += 1;
                }
                let span = Span::from_bounds(start as u32, self.pos as u32);
                self.issue(span, &messages::JSON_EXPECTED_VALUE, &[]);
                None
            }
        }
    }

    fn read_number(&mut self) -> Value {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let span = Span::from_bounds(start as u32, self.pos as u32);
        let text = String::from_utf8_lossy(&self.text[start..self.pos]).into_owned();
        Value::Number(span, text)
    }

    fn read_string(&mut self) -> StringValue {
        let start = self.pos;
        debug_assert_eq!(self.peek(), Some(b'"'));
        self.pos += 1;
        let mut value = String::new();
        let mut closed = false;
        loop {
            let rest = &self.text[self.pos..];
            match memchr2(b'"', b'\\', rest) {
                None => {
                    value.push_str(&String::from_utf8_lossy(rest));
                    self.pos = self.text.len();
                    break;
                }
                Some(offset) => {
                    value.push_str(&String::from_utf8_lossy(&rest[..offset]));
                    self.pos += offset;
                    if self.text[self.pos] == b'"' {
                        self.pos += 1;
                        closed = true;
                        break;
                    }
                    // Escape sequence.
                    self.pos += 1;
                    match self.peek() {
                        None => break,
                        Some(b'u') => {
                            self.pos += 1;
                            value.push(self.read_unicode_escape());
                        }
                        Some(b) => {
                            self.pos += 1;
                            value.push(match b {
                                b'"' => '"',
                                b'\\' => '\\',
                                b'/' => '/',
                                b'b' => '\u{0008}',
                                b'f' => '\u{000C}',
                                b'n' => '\n',
                                b'r' => '\r',
                                b't' => '\t',
                                other => other as char,
                            });
                        }
                    }
                }
            }
        }
        let span = Span::from_bounds(start as u32, self.pos as u32);
        if !closed {
            self.issue(span, &messages::JSON_UNTERMINATED_STRING, &[]);
        }
        StringValue { span, value, closed }
    }

    fn read_unicode_escape(&mut self) -> char {
        let first = self.read_hex4();
        // Combine surrogate pairs when both halves are present.
        if (0xD800..0xDC00).contains(&first)
            && self.peek() == Some(b'\\')
            && self.text.get(self.pos + 1) == Some(&b'u')
        {
            let save = self.pos;
            self.pos += 2;
            let second = self.read_hex4();
            if (0xDC00..0xE000).contains(&second) {
                let combined =
                    0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
                return char::from_u32(combined).unwrap_or('\u{FFFD}');
            }
            self.pos = save;
        }
        char::from_u32(first).unwrap_or('\u{FFFD}')
    }

    fn read_hex4(&mut self) -> u32 {
        let mut result = 0u32;
        for _ in 0..4 {
            match self.peek().and_then(|b| (b as char).to_digit(16)) {
                Some(digit) => {
                    result = result * 16 + digit;
                    self.pos += 1;
                }
                None => break,
            }
        }
        result
    }

    fn read_object(&mut self) -> ObjectValue {
        let start = self.pos;
        debug_assert_eq!(self.peek(), Some(b'{'));
        self.pos += 1;
        let mut properties = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => {
                    let span = Span::empty(self.pos as u32);
                    self.issue(span, &messages::JSON_UNEXPECTED_END, &[]);
                    break;
                }
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                Some(b',') => {
                    // Tolerate stray and trailing commas.
                    self.pos += 1;
                }
                Some(b'"') => {
                    properties.push(self.read_property());
                }
                Some(b) => {
                    let span = Span::new(self.pos as u32, 1);
                    let ch = (b as char).to_string();
                    self.issue(span, &messages::JSON_EXPECTED_PROPERTY_NAME, &[&ch]);
                    self.pos += 1;
                }
            }
        }
        ObjectValue {
            span: Span::from_bounds(start as u32, self.pos as u32),
            properties,
        }
    }

    fn read_property(&mut self) -> Property {
        let name = self.read_string();
        let start = name.span.start;
        self.skip_trivia();
        let value = if self.peek() == Some(b':') {
            self.pos += 1;
            self.skip_trivia();
            self.read_value()
        } else {
            let span = Span::empty(self.pos as u32);
            self.issue(span, &messages::JSON_EXPECTED_COLON, &[]);
            None
        };
        let end = value
            .as_ref()
            .map(|v| v.span().after_end())
            .unwrap_or_else(|| name.span.after_end());
        Property {
            span: Span::from_bounds(start, end),
            name,
            value,
        }
    }

    fn read_array(&mut self) -> ArrayValue {
        let start = self.pos;
        debug_assert_eq!(self.peek(), Some(b'['));
        self.pos += 1;
        let mut elements = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => {
                    let span = Span::empty(self.pos as u32);
                    self.issue(span, &messages::JSON_UNEXPECTED_END, &[]);
                    break;
                }
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(b',') => {
                    self.pos += 1;
                }
                Some(_) => {
                    if let Some(value) = self.read_value() {
                        elements.push(value);
                    }
                }
            }
        }
        ArrayValue {
            span: Span::from_bounds(start as u32, self.pos as u32),
            elements,
        }
    }
}
