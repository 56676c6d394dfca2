//! tle_ast: The expression AST for template language expressions.
//!
//! Defines the token types produced by the tokenizer, the arena-allocated
//! expression tree built by the parser, and the visitor used by every
//! semantic check.

mod node;
mod token;
mod visitor;

pub use node::{Expr, ExprArena, ExprId, FunctionCall};
pub use token::{Token, TokenKind};
pub use visitor::{walk, ExprVisitor};
