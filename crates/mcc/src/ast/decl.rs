//! Declaration AST nodes

use super::{Expr, Stmt, Type};
use crate::common::Span;

/// Declaration node
#[derive(Debug, Clone)]
pub struct Decl {
    pub kind: DeclKind,
    pub span: Span,
}

impl Decl {
    pub fn new(kind: DeclKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Declaration kinds
#[derive(Debug, Clone)]
pub enum DeclKind {
    /// Variable declaration: int x = 5;
    Var(VarDecl),

    /// Array declaration: int a[10];
    Array(ArrayDecl),

    /// Function, method, or constructor definition
    Func(FuncDecl),

    /// Class declaration: class B : A { ... };
    Class(ClassDecl),

    /// Object declaration: Point p = new Point(1, 2);
    Object(ObjectDecl),
}

/// Variable declaration
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub ty: Type,
    pub name: String,
    pub init: Option<Expr>,
    pub span: Span,
}

impl VarDecl {
    pub fn new(ty: Type, name: String, span: Span) -> Self {
        Self {
            ty,
            name,
            init: None,
            span,
        }
    }

    pub fn with_init(mut self, init: Expr) -> Self {
        self.init = Some(init);
        self
    }
}

/// Fixed-size array declaration
#[derive(Debug, Clone)]
pub struct ArrayDecl {
    pub elem_ty: Type,
    pub name: String,
    pub size: Expr,
    pub span: Span,
}

/// Function definition
///
/// A `return_type` of `None` marks a constructor: the parser only produces
/// that shape inside a class body, for a function named after its class.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub return_type: Option<Type>,
    pub name: String,
    pub params: Vec<VarDecl>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl FuncDecl {
    pub fn is_constructor(&self) -> bool {
        self.return_type.is_none()
    }
}

/// Class declaration with optional superclass
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub super_name: Option<String>,
    pub members: Vec<Decl>,
    pub span: Span,
}

/// Instance declaration: `Point p;` or `Point p = new Point(args);`
///
/// `ctor_args` is `None` for the bare form; `Some(vec![])` for `new C()`.
#[derive(Debug, Clone)]
pub struct ObjectDecl {
    pub class_name: String,
    pub instance_name: String,
    pub ctor_args: Option<Vec<Expr>>,
    pub span: Span,
}
