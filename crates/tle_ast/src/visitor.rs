//! Read-only traversal of the expression tree.
//!
//! Every semantic check is a visitor over an immutable arena; checks compose
//! freely because nothing mutates the tree. Each node is visited exactly
//! once, in pre-order.

use crate::node::{Expr, ExprArena, ExprId};

/// A read-only visitor over expression nodes. Default methods do nothing, so
/// implementations override only the variants they care about.
pub trait ExprVisitor {
    fn visit_string_literal(&mut self, _arena: &ExprArena, _id: ExprId) {}
    fn visit_number_literal(&mut self, _arena: &ExprArena, _id: ExprId) {}
    fn visit_function_call(&mut self, _arena: &ExprArena, _id: ExprId) {}
    fn visit_property_access(&mut self, _arena: &ExprArena, _id: ExprId) {}
    fn visit_array_access(&mut self, _arena: &ExprArena, _id: ExprId) {}
}

/// Walk the tree rooted at `id` in pre-order, visiting each node once.
pub fn walk(arena: &ExprArena, id: ExprId, visitor: &mut dyn ExprVisitor) {
    match arena.get(id) {
        Expr::StringLiteral { .. } => visitor.visit_string_literal(arena, id),
        Expr::NumberLiteral { .. } => visitor.visit_number_literal(arena, id),
        Expr::FunctionCall(_) => visitor.visit_function_call(arena, id),
        Expr::PropertyAccess { .. } => visitor.visit_property_access(arena, id),
        Expr::ArrayAccess { .. } => visitor.visit_array_access(arena, id),
    }
    for child in arena.children(id) {
        walk(arena, child, visitor);
    }
}
