//! Expression AST nodes

use super::Type;
use crate::common::Span;

/// Expression node
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Literal constant values, already converted by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// Expression kinds
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Literal constant: 42, 3.14, true, "text"
    Const(Literal),

    /// The null literal
    Null,

    /// Variable reference: x
    Var(String),

    /// Array element read: a[i]
    ArrayLookup { name: String, index: Box<Expr> },

    /// Array length: a.size
    ArraySize(String),

    /// Simple assignment: x = expr
    VarAssign { name: String, expr: Box<Expr> },

    /// Array element write: a[i] = expr
    ArrayAssign {
        name: String,
        index: Box<Expr>,
        expr: Box<Expr>,
    },

    /// Compound assignment: x += expr, x -= expr, ...
    CompoundAssign {
        name: String,
        op: BinaryOp,
        expr: Box<Expr>,
    },

    /// Binary operation: a + b, x < y
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation: -x, !flag
    Unary { op: UnaryOp, expr: Box<Expr> },

    /// Pre-increment: ++x
    PrefixInc(Box<Expr>),

    /// Pre-decrement: --x
    PrefixDec(Box<Expr>),

    /// Post-increment: x++
    PostfixInc(Box<Expr>),

    /// Post-decrement: x--
    PostfixDec(Box<Expr>),

    /// Short-circuit conjunction: a && b
    And { left: Box<Expr>, right: Box<Expr> },

    /// Short-circuit disjunction: a || b
    Or { left: Box<Expr>, right: Box<Expr> },

    /// Type cast: (float) x
    Cast { target: Type, expr: Box<Expr> },

    /// Call of a free function or, with a receiver, a method: f(a) / obj.m(a)
    Call {
        name: String,
        receiver: Option<String>,
        args: Vec<Expr>,
    },

    /// Parenthesized expression: (expr)
    Grouping(Box<Expr>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        };
        write!(f, "{s}")
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
        };
        write!(f, "{s}")
    }
}
