//! Statement AST nodes

use super::{Decl, Expr};
use crate::common::Span;

/// Statement node
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement kinds
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// Expression statement: expr;
    Expr(Expr),

    /// Declaration in statement position
    Decl(Decl),

    /// Compound statement (block): { ... }
    Block(Vec<Stmt>),

    /// If statement: if (cond) then [else else]
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// While loop: while (cond) body
    While { cond: Expr, body: Box<Stmt> },

    /// For loop: for (init; cond; incr) body
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        incr: Option<Expr>,
        body: Box<Stmt>,
    },

    /// Return statement: return [expr];
    Return(Option<Expr>),

    /// Break statement
    Break,

    /// Continue statement
    Continue,

    /// printf statement: printf("fmt", args...);
    Print { format: String, args: Vec<Expr> },

    /// Bare array-length statement: arr.size;
    Size { name: String },

    /// Bare this statement: this;
    This,

    /// Superclass constructor call: super(args);
    Super { args: Vec<Expr> },
}
