//! The JSON value tree, with a span on every node.

use tle_core::text::Span;

/// A JSON string value. The span includes the surrounding double quotes;
/// `value` is the unescaped content.
#[derive(Debug, Clone, PartialEq)]
pub struct StringValue {
    pub span: Span,
    pub value: String,
    /// Whether the closing quote was present in the source.
    pub closed: bool,
}

impl StringValue {
    /// The span of the string content, without the surrounding quotes.
    pub fn unquoted_span(&self) -> Span {
        let trailing = if self.closed { 2 } else { 1 };
        Span::new(
            self.span.start + 1,
            self.span.length.saturating_sub(trailing),
        )
    }
}

/// A JSON object property: a name, and a value when one could be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub span: Span,
    pub name: StringValue,
    pub value: Option<Value>,
}

/// A JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    pub span: Span,
    pub properties: Vec<Property>,
}

impl ObjectValue {
    /// Find a property by exact (case-sensitive) name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name.value == name)
    }

    /// Find a property's value by exact (case-sensitive) name.
    pub fn property_value(&self, name: &str) -> Option<&Value> {
        self.property(name).and_then(|p| p.value.as_ref())
    }

    /// Whether a property exists, compared case-insensitively. The property
    /// access check uses this because the host runtime resolves object member
    /// names without regard to case.
    pub fn has_property_insensitive(&self, name: &str) -> bool {
        self.properties
            .iter()
            .any(|p| p.name.value.eq_ignore_ascii_case(name))
    }
}

/// A JSON array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub span: Span,
    pub elements: Vec<Value>,
}

/// A JSON value with its exact source span.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null(Span),
    Boolean(Span, bool),
    Number(Span, String),
    String(StringValue),
    Array(ArrayValue),
    Object(ObjectValue),
}

impl Value {
    pub fn span(&self) -> Span {
        match self {
            Value::Null(span) => *span,
            Value::Boolean(span, _) => *span,
            Value::Number(span, _) => *span,
            Value::String(s) => s.span,
            Value::Array(a) => a.span,
            Value::Object(o) => o.span,
        }
    }

    pub fn as_string(&self) -> Option<&StringValue> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Walk this value and its descendants, calling `f` on each value.
    pub fn walk(&self, f: &mut impl FnMut(&Value)) {
        f(self);
        match self {
            Value::Array(a) => {
                for element in &a.elements {
                    element.walk(f);
                }
            }
            Value::Object(o) => {
                for property in &o.properties {
                    if let Some(value) = &property.value {
                        value.walk(f);
                    }
                }
            }
            _ => {}
        }
    }
}
