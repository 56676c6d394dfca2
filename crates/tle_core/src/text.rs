//! The text span type used for source location tracking.
//!
//! Every token, AST node, JSON value, and diagnostic locates itself in the
//! document through a `Span`, so editor round-tripping stays byte-accurate.

use std::fmt;
use std::ops::Range;

/// A position in document text, measured as a byte offset from the start.
pub type TextPos = u32;

/// A half-open `[start, start + length)` interval over document offsets.
///
/// Spans are immutable value objects: they are created once and never
/// mutated. Operations that "change" a span return a new one.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Span {
    /// The byte offset where this span starts.
    pub start: TextPos,
    /// The length of this span in bytes.
    pub length: TextPos,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub fn new(start: TextPos, length: TextPos) -> Self {
        Self { start, length }
    }

    /// Create a span from start and end positions.
    #[inline]
    pub fn from_bounds(start: TextPos, end: TextPos) -> Self {
        debug_assert!(end >= start);
        Self {
            start,
            length: end - start,
        }
    }

    /// Create an empty span at a position.
    #[inline]
    pub fn empty(pos: TextPos) -> Self {
        Self {
            start: pos,
            length: 0,
        }
    }

    /// The first position after the end of this span.
    #[inline]
    pub fn after_end(&self) -> TextPos {
        self.start + self.length
    }

    /// Whether this span is empty (zero-length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether this span contains the given position.
    #[inline]
    pub fn contains(&self, pos: TextPos) -> bool {
        pos >= self.start && pos < self.after_end()
    }

    /// Whether this span contains the given position, counting the position
    /// immediately after the last byte as inside. Cursor queries use this so
    /// that a caret sitting at the end of a name still hits it.
    #[inline]
    pub fn contains_inclusive(&self, pos: TextPos) -> bool {
        pos >= self.start && pos <= self.after_end()
    }

    /// Return the smallest span containing both this span and the other.
    pub fn union(&self, other: &Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.after_end().max(other.after_end());
        Span::from_bounds(start, end)
    }

    /// Return this span shifted by a signed byte offset.
    pub fn translate(&self, offset: i64) -> Span {
        let start = (self.start as i64 + offset) as TextPos;
        Span::new(start, self.length)
    }

    /// Convert to a byte range for slicing source text.
    #[inline]
    pub fn to_range(&self) -> Range<usize> {
        self.start as usize..self.after_end() as usize
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.after_end())
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.after_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_bounds() {
        let span = Span::new(5, 10);
        assert_eq!(span.start, 5);
        assert_eq!(span.length, 10);
        assert_eq!(span.after_end(), 15);
        assert!(span.contains(5));
        assert!(span.contains(14));
        assert!(!span.contains(15));
        assert!(span.contains_inclusive(15));
        assert!(!span.contains_inclusive(16));
    }

    #[test]
    fn test_span_union() {
        let a = Span::new(2, 3);
        let b = Span::new(10, 4);
        let u = a.union(&b);
        assert_eq!(u, Span::from_bounds(2, 14));
        // union is commutative
        assert_eq!(b.union(&a), u);
        // union with a contained span is a no-op
        assert_eq!(u.union(&a), u);
    }

    #[test]
    fn test_span_translate() {
        let span = Span::new(3, 4);
        assert_eq!(span.translate(7), Span::new(10, 4));
        assert_eq!(span.translate(-3), Span::new(0, 4));
    }

    #[test]
    fn test_empty_span() {
        let span = Span::empty(9);
        assert!(span.is_empty());
        assert!(!span.contains(9));
        assert!(span.contains_inclusive(9));
    }
}
