//! The expression tree.
//!
//! Nodes live in an arena and address each other by index. The parent
//! relation is a plain index field set once after construction, so the tree
//! can be walked upward without reference cycles and freed by dropping the
//! arena.

use crate::token::{Token, TokenKind};
use tle_core::text::Span;

/// An index into an [`ExprArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A function call, possibly namespaced (`ns.fn(...)`), possibly with pieces
/// missing. The parser builds a call node from whatever tokens are present;
/// absent required tokens are `None` and carry one issue each.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub namespace: Option<Token>,
    pub period: Option<Token>,
    pub name: Option<Token>,
    pub left_paren: Option<Token>,
    pub commas: Vec<Token>,
    /// One slot per argument position. `None` marks a parse hole, e.g. the
    /// missing argument between two adjacent commas.
    pub args: Vec<Option<ExprId>>,
    pub right_paren: Option<Token>,
}

impl FunctionCall {
    /// The display name of this call: `ns.fn` for namespaced calls, `fn`
    /// otherwise. Empty pieces are rendered as empty strings.
    pub fn full_name(&self) -> String {
        let name = self.name.as_ref().map(|t| t.text.as_str()).unwrap_or("");
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns.text, name),
            None => name.to_string(),
        }
    }

    /// Whether this is an un-namespaced call of the given built-in name,
    /// compared case-insensitively.
    pub fn is_builtin_call(&self, builtin: &str) -> bool {
        self.namespace.is_none()
            && self
                .name
                .as_ref()
                .is_some_and(|t| t.text.eq_ignore_ascii_case(builtin))
    }
}

/// An expression node. A closed set of variants; every visitor matches
/// exhaustively so new variants are a compile-time-checked change.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A quoted string literal leaf.
    StringLiteral { token: Token },
    /// A number literal leaf.
    NumberLiteral { token: Token },
    FunctionCall(FunctionCall),
    /// `source.name`. The name may be missing in malformed input.
    PropertyAccess {
        source: ExprId,
        period: Token,
        name: Option<Token>,
    },
    /// `source[index]`. Index and closing bracket may be missing.
    ArrayAccess {
        source: ExprId,
        left_bracket: Token,
        index: Option<ExprId>,
        right_bracket: Option<Token>,
    },
}

/// The node arena. Parents are stored beside the nodes and set by the parser
/// after each node's children exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExprArena {
    nodes: Vec<Expr>,
    parents: Vec<Option<ExprId>>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr);
        self.parents.push(None);
        id
    }

    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    pub fn set_parent(&mut self, child: ExprId, parent: ExprId) {
        self.parents[child.index()] = Some(parent);
    }

    pub fn parent(&self, id: ExprId) -> Option<ExprId> {
        self.parents[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The child nodes of a node, in source order.
    pub fn children(&self, id: ExprId) -> Vec<ExprId> {
        match self.get(id) {
            Expr::StringLiteral { .. } | Expr::NumberLiteral { .. } => Vec::new(),
            Expr::FunctionCall(call) => call.args.iter().copied().flatten().collect(),
            Expr::PropertyAccess { source, .. } => vec![*source],
            Expr::ArrayAccess { source, index, .. } => {
                let mut children = vec![*source];
                children.extend(*index);
                children
            }
        }
    }

    /// The span of a node: the union of the spans of every present token and
    /// child. Absent optional tokens are simply skipped.
    pub fn span(&self, id: ExprId) -> Span {
        let mut span: Option<Span> = None;
        let mut include = |s: Span| {
            span = Some(match span {
                Some(acc) => acc.union(&s),
                None => s,
            });
        };
        match self.get(id) {
            Expr::StringLiteral { token } | Expr::NumberLiteral { token } => {
                include(token.span);
            }
            Expr::FunctionCall(call) => {
                for token in [
                    &call.namespace,
                    &call.period,
                    &call.name,
                    &call.left_paren,
                    &call.right_paren,
                ]
                .into_iter()
                .flatten()
                {
                    include(token.span);
                }
                for comma in &call.commas {
                    include(comma.span);
                }
                for arg in call.args.iter().copied().flatten() {
                    include(self.span(arg));
                }
            }
            Expr::PropertyAccess {
                source,
                period,
                name,
            } => {
                include(self.span(*source));
                include(period.span);
                if let Some(name) = name {
                    include(name.span);
                }
            }
            Expr::ArrayAccess {
                source,
                left_bracket,
                index,
                right_bracket,
            } => {
                include(self.span(*source));
                include(left_bracket.span);
                if let Some(index) = index {
                    include(self.span(*index));
                }
                if let Some(right_bracket) = right_bracket {
                    include(right_bracket.span);
                }
            }
        }
        span.unwrap_or_else(|| Span::empty(0))
    }

    /// Descend from `root` to the most specific node whose span contains the
    /// position. Ties between overlapping candidates break toward the node
    /// with the smaller span. End positions count as inside, so a caret
    /// sitting just after a name still hits it.
    pub fn most_specific_at(&self, root: ExprId, pos: u32) -> Option<ExprId> {
        if !self.span(root).contains_inclusive(pos) {
            return None;
        }
        let mut best = root;
        loop {
            let next = self
                .children(best)
                .into_iter()
                .filter(|&child| self.span(child).contains_inclusive(pos))
                .min_by_key(|&child| self.span(child).length);
            match next {
                Some(child) => best = child,
                None => return Some(best),
            }
        }
    }

    /// The string-literal argument of a one-argument call, if that is the
    /// call's shape. `parameters('x')` and `variables('x')` references are
    /// recognized through this.
    pub fn sole_string_argument(&self, call: &FunctionCall) -> Option<&Token> {
        if call.args.len() != 1 {
            return None;
        }
        match self.get(call.args[0]?) {
            Expr::StringLiteral { token } if token.kind == TokenKind::QuotedString => Some(token),
            _ => None,
        }
    }
}
