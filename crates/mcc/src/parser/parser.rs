//! Recursive descent parser for MiniC++
//!
//! Operator precedence, loosest to tightest: assignment, `||`, `&&`,
//! equality, relational, additive, multiplicative, unary/cast/prefix
//! inc-dec, postfix inc-dec, primary.

use crate::ast::*;
use crate::common::{CompileError, CompileResult, Span};
use crate::lexer::{Lexer, Token, TokenKind};

/// Recursive descent parser for MiniC++
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    next: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given source
    pub fn new(source: &'a str) -> CompileResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        let next = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            next,
        })
    }

    /// Parse a complete program
    pub fn parse(&mut self) -> CompileResult<Program> {
        let mut stmts = Vec::new();
        while !self.at_end() {
            let decl = self.parse_declaration()?;
            let span = decl.span;
            stmts.push(Stmt::new(StmtKind::Decl(decl), span));
        }
        Ok(Program::new(stmts))
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> CompileResult<Token> {
        let upcoming = std::mem::replace(&mut self.next, self.lexer.next_token()?);
        Ok(std::mem::replace(&mut self.current, upcoming))
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn check_next(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.next.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> CompileResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> CompileResult<Token> {
        if self.check(&kind) {
            self.advance()
        } else {
            Err(CompileError::parser(
                format!("expected {}, found {}", kind, self.current.kind),
                self.current.span,
            ))
        }
    }

    fn expect_ident(&mut self) -> CompileResult<(String, Span)> {
        let token = self.advance()?;
        if let TokenKind::Ident(name) = token.kind {
            Ok((name, token.span))
        } else {
            Err(CompileError::parser(
                format!("expected identifier, found {}", token.kind),
                token.span,
            ))
        }
    }

    /// True if the current token starts a primitive type
    fn at_type(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Void
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Bool
                | TokenKind::String
        )
    }

    fn parse_type(&mut self) -> CompileResult<Type> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Void => Ok(Type::Void),
            TokenKind::Int => Ok(Type::Int),
            TokenKind::Float => Ok(Type::Float),
            TokenKind::Bool => Ok(Type::Bool),
            TokenKind::String => Ok(Type::Str),
            other => Err(CompileError::parser(
                format!("expected type, found {other}"),
                token.span,
            )),
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_declaration(&mut self) -> CompileResult<Decl> {
        if self.check(&TokenKind::Class) {
            return self.parse_class_decl();
        }
        if self.at_type() {
            return self.parse_typed_decl();
        }
        // `Point p;` / `Point p = new Point(...);`
        if matches!(self.current.kind, TokenKind::Ident(_))
            && matches!(self.next.kind, TokenKind::Ident(_))
        {
            return self.parse_object_decl();
        }
        Err(CompileError::parser(
            format!("expected declaration, found {}", self.current.kind),
            self.current.span,
        ))
    }

    /// Parse a declaration that starts with a type: variable, array, or
    /// function, depending on what follows the name.
    fn parse_typed_decl(&mut self) -> CompileResult<Decl> {
        let start = self.current.span;
        let ty = self.parse_type()?;
        let (name, name_span) = self.expect_ident()?;

        if self.check(&TokenKind::LParen) {
            return self.parse_func_decl(Some(ty), name, start);
        }

        if self.match_token(&TokenKind::LBracket)? {
            let size = self.parse_assignment()?;
            self.expect(TokenKind::RBracket)?;
            let end = self.expect(TokenKind::Semi)?.span;
            return Ok(Decl::new(
                DeclKind::Array(ArrayDecl {
                    elem_ty: ty,
                    name,
                    size,
                    span: start.merge(end),
                }),
                start.merge(end),
            ));
        }

        let mut var = VarDecl::new(ty, name, start.merge(name_span));
        if self.match_token(&TokenKind::Assign)? {
            var = var.with_init(self.parse_assignment()?);
        }
        let end = self.expect(TokenKind::Semi)?.span;
        var.span = start.merge(end);
        let span = var.span;
        Ok(Decl::new(DeclKind::Var(var), span))
    }

    /// Parse the parameter list and body of a function definition. A
    /// `return_type` of `None` is the constructor form inside a class body.
    fn parse_func_decl(
        &mut self,
        return_type: Option<Type>,
        name: String,
        start: Span,
    ) -> CompileResult<Decl> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let p_start = self.current.span;
                let ty = self.parse_type()?;
                let (p_name, p_span) = self.expect_ident()?;
                params.push(VarDecl::new(ty, p_name, p_start.merge(p_span)));
                if !self.match_token(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            body.push(self.parse_stmt()?);
        }
        let end = self.expect(TokenKind::RBrace)?.span;
        let span = start.merge(end);

        Ok(Decl::new(
            DeclKind::Func(FuncDecl {
                return_type,
                name,
                params,
                body,
                span,
            }),
            span,
        ))
    }

    fn parse_class_decl(&mut self) -> CompileResult<Decl> {
        let start = self.expect(TokenKind::Class)?.span;
        let (name, _) = self.expect_ident()?;

        let super_name = if self.match_token(&TokenKind::Colon)? {
            // Accept and ignore an access specifier: `class B : public A`
            if self.check(&TokenKind::Public) || self.check(&TokenKind::Private) {
                self.advance()?;
            }
            Some(self.expect_ident()?.0)
        } else {
            None
        };

        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            // Access specifier labels carry no meaning here
            if (self.check(&TokenKind::Public) || self.check(&TokenKind::Private))
                && self.check_next(&TokenKind::Colon)
            {
                self.advance()?;
                self.advance()?;
                continue;
            }
            members.push(self.parse_class_member(&name)?);
        }
        self.expect(TokenKind::RBrace)?;
        let end = self.expect(TokenKind::Semi)?.span;
        let span = start.merge(end);

        Ok(Decl::new(
            DeclKind::Class(ClassDecl {
                name,
                super_name,
                members,
                span,
            }),
            span,
        ))
    }

    fn parse_class_member(&mut self, class_name: &str) -> CompileResult<Decl> {
        if self.at_type() {
            return self.parse_typed_decl();
        }
        // Constructor: `ClassName(params) { ... }`
        if let TokenKind::Ident(name) = &self.current.kind {
            if name == class_name && self.check_next(&TokenKind::LParen) {
                let start = self.current.span;
                let (name, _) = self.expect_ident()?;
                return self.parse_func_decl(None, name, start);
            }
        }
        Err(CompileError::parser(
            format!("expected class member, found {}", self.current.kind),
            self.current.span,
        ))
    }

    fn parse_object_decl(&mut self) -> CompileResult<Decl> {
        let start = self.current.span;
        let (class_name, _) = self.expect_ident()?;
        let (instance_name, _) = self.expect_ident()?;

        let ctor_args = if self.match_token(&TokenKind::Assign)? {
            self.expect(TokenKind::New)?;
            let (ctor_class, ctor_span) = self.expect_ident()?;
            if ctor_class != class_name {
                return Err(CompileError::parser(
                    format!("expected 'new {class_name}', found 'new {ctor_class}'"),
                    ctor_span,
                ));
            }
            self.expect(TokenKind::LParen)?;
            let args = self.parse_args()?;
            self.expect(TokenKind::RParen)?;
            Some(args)
        } else {
            None
        };

        let end = self.expect(TokenKind::Semi)?.span;
        let span = start.merge(end);
        Ok(Decl::new(
            DeclKind::Object(ObjectDecl {
                class_name,
                instance_name,
                ctor_args,
                span,
            }),
            span,
        ))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_stmt(&mut self) -> CompileResult<Stmt> {
        match &self.current.kind {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                let start = self.advance()?.span;
                let end = self.expect(TokenKind::Semi)?.span;
                Ok(Stmt::new(StmtKind::Break, start.merge(end)))
            }
            TokenKind::Continue => {
                let start = self.advance()?.span;
                let end = self.expect(TokenKind::Semi)?.span;
                Ok(Stmt::new(StmtKind::Continue, start.merge(end)))
            }
            TokenKind::Printf => self.parse_printf(),
            TokenKind::Super => self.parse_super(),
            TokenKind::This => {
                let start = self.advance()?.span;
                let end = self.expect(TokenKind::Semi)?.span;
                Ok(Stmt::new(StmtKind::This, start.merge(end)))
            }
            _ if self.at_type() => {
                let decl = self.parse_typed_decl()?;
                let span = decl.span;
                Ok(Stmt::new(StmtKind::Decl(decl), span))
            }
            TokenKind::Ident(_) if matches!(self.next.kind, TokenKind::Ident(_)) => {
                let decl = self.parse_object_decl()?;
                let span = decl.span;
                Ok(Stmt::new(StmtKind::Decl(decl), span))
            }
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_block(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::LBrace)?.span;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            stmts.push(self.parse_stmt()?);
        }
        let end = self.expect(TokenKind::RBrace)?.span;
        Ok(Stmt::new(StmtKind::Block(stmts), start.merge(end)))
    }

    fn parse_if(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::If)?.span;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_assignment()?;
        self.expect(TokenKind::RParen)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let mut span = start.merge(then_branch.span);
        let else_branch = if self.match_token(&TokenKind::Else)? {
            let stmt = self.parse_stmt()?;
            span = span.merge(stmt.span);
            Some(Box::new(stmt))
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn parse_while(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::While)?.span;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_assignment()?;
        self.expect(TokenKind::RParen)?;
        let body = Box::new(self.parse_stmt()?);
        let span = start.merge(body.span);
        Ok(Stmt::new(StmtKind::While { cond, body }, span))
    }

    fn parse_for(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::For)?.span;
        self.expect(TokenKind::LParen)?;

        let init = if self.check(&TokenKind::Semi) {
            None
        } else if self.at_type() {
            // Declaration form without the trailing semicolon
            let d_start = self.current.span;
            let ty = self.parse_type()?;
            let (name, name_span) = self.expect_ident()?;
            let mut var = VarDecl::new(ty, name, d_start.merge(name_span));
            if self.match_token(&TokenKind::Assign)? {
                var = var.with_init(self.parse_assignment()?);
            }
            let span = var.span;
            Some(Box::new(Stmt::new(
                StmtKind::Decl(Decl::new(DeclKind::Var(var), span)),
                span,
            )))
        } else {
            let expr = self.parse_assignment()?;
            let span = expr.span;
            Some(Box::new(Stmt::new(StmtKind::Expr(expr), span)))
        };
        self.expect(TokenKind::Semi)?;

        let cond = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_assignment()?)
        };
        self.expect(TokenKind::Semi)?;

        let incr = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_assignment()?)
        };
        self.expect(TokenKind::RParen)?;

        let body = Box::new(self.parse_stmt()?);
        let span = start.merge(body.span);
        Ok(Stmt::new(
            StmtKind::For {
                init,
                cond,
                incr,
                body,
            },
            span,
        ))
    }

    fn parse_return(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Return)?.span;
        let expr = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_assignment()?)
        };
        let end = self.expect(TokenKind::Semi)?.span;
        Ok(Stmt::new(StmtKind::Return(expr), start.merge(end)))
    }

    fn parse_printf(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Printf)?.span;
        self.expect(TokenKind::LParen)?;
        let token = self.advance()?;
        let format = if let TokenKind::StringLit(s) = token.kind {
            s
        } else {
            return Err(CompileError::parser(
                format!("expected format string, found {}", token.kind),
                token.span,
            ));
        };
        let args = if self.match_token(&TokenKind::Comma)? {
            self.parse_args()?
        } else {
            Vec::new()
        };
        self.expect(TokenKind::RParen)?;
        let end = self.expect(TokenKind::Semi)?.span;
        Ok(Stmt::new(
            StmtKind::Print { format, args },
            start.merge(end),
        ))
    }

    fn parse_super(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Super)?.span;
        self.expect(TokenKind::LParen)?;
        let args = self.parse_args()?;
        self.expect(TokenKind::RParen)?;
        let end = self.expect(TokenKind::Semi)?.span;
        Ok(Stmt::new(StmtKind::Super { args }, start.merge(end)))
    }

    fn parse_expr_stmt(&mut self) -> CompileResult<Stmt> {
        let expr = self.parse_assignment()?;
        let end = self.expect(TokenKind::Semi)?.span;
        let span = expr.span.merge(end);
        // `arr.size;` in statement position is its own node
        if let ExprKind::ArraySize(name) = expr.kind {
            return Ok(Stmt::new(StmtKind::Size { name }, span));
        }
        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_args(&mut self) -> CompileResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_assignment()?);
            if !self.match_token(&TokenKind::Comma)? {
                break;
            }
        }
        Ok(args)
    }

    /// Assignment is right-associative and only valid when the left side
    /// turned out to be a variable or array element.
    fn parse_assignment(&mut self) -> CompileResult<Expr> {
        let expr = self.parse_or()?;

        let compound_op = match self.current.kind {
            TokenKind::Assign => None,
            TokenKind::PlusAssign => Some(BinaryOp::Add),
            TokenKind::MinusAssign => Some(BinaryOp::Sub),
            TokenKind::StarAssign => Some(BinaryOp::Mul),
            TokenKind::SlashAssign => Some(BinaryOp::Div),
            _ => return Ok(expr),
        };
        let op_span = self.advance()?.span;
        let value = self.parse_assignment()?;
        let span = expr.span.merge(value.span);

        match (expr.kind, compound_op) {
            (ExprKind::Var(name), None) => Ok(Expr::new(
                ExprKind::VarAssign {
                    name,
                    expr: Box::new(value),
                },
                span,
            )),
            (ExprKind::Var(name), Some(op)) => Ok(Expr::new(
                ExprKind::CompoundAssign {
                    name,
                    op,
                    expr: Box::new(value),
                },
                span,
            )),
            (ExprKind::ArrayLookup { name, index }, None) => Ok(Expr::new(
                ExprKind::ArrayAssign {
                    name,
                    index,
                    expr: Box::new(value),
                },
                span,
            )),
            _ => Err(CompileError::parser("invalid assignment target", op_span)),
        }
    }

    fn parse_or(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_and()?;
        while self.match_token(&TokenKind::OrOr)? {
            let right = self.parse_and()?;
            let span = expr.span.merge(right.span);
            expr = Expr::new(
                ExprKind::Or {
                    left: Box::new(expr),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_equality()?;
        while self.match_token(&TokenKind::AndAnd)? {
            let right = self.parse_equality()?;
            let span = expr.span.merge(right.span);
            expr = Expr::new(
                ExprKind::And {
                    left: Box::new(expr),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_relational()?;
        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_relational()?;
            let span = expr.span.merge(right.span);
            expr = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(expr),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_relational(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive()?;
            let span = expr.span.merge(right.span);
            expr = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(expr),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            let span = expr.span.merge(right.span);
            expr = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(expr),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            let span = expr.span.merge(right.span);
            expr = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(expr),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> CompileResult<Expr> {
        // Cast: `(` type `)` unary, distinguishable from grouping because
        // type names are keywords.
        if self.check(&TokenKind::LParen)
            && matches!(
                self.next.kind,
                TokenKind::Void
                    | TokenKind::Int
                    | TokenKind::Float
                    | TokenKind::Bool
                    | TokenKind::String
            )
        {
            let start = self.advance()?.span;
            let target = self.parse_type()?;
            self.expect(TokenKind::RParen)?;
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Cast {
                    target,
                    expr: Box::new(operand),
                },
                span,
            ));
        }

        let op = match self.current.kind {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Not => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance()?.span;
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    expr: Box::new(operand),
                },
                span,
            ));
        }

        if self.check(&TokenKind::PlusPlus) {
            let start = self.advance()?.span;
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(ExprKind::PrefixInc(Box::new(operand)), span));
        }
        if self.check(&TokenKind::MinusMinus) {
            let start = self.advance()?.span;
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(ExprKind::PrefixDec(Box::new(operand)), span));
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> CompileResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check(&TokenKind::PlusPlus) {
                let end = self.advance()?.span;
                let span = expr.span.merge(end);
                expr = Expr::new(ExprKind::PostfixInc(Box::new(expr)), span);
            } else if self.check(&TokenKind::MinusMinus) {
                let end = self.advance()?.span;
                let span = expr.span.merge(end);
                expr = Expr::new(ExprKind::PostfixDec(Box::new(expr)), span);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> CompileResult<Expr> {
        let token = self.current.clone();
        match token.kind {
            TokenKind::IntLit(v) => {
                self.advance()?;
                Ok(Expr::new(ExprKind::Const(Literal::Int(v)), token.span))
            }
            TokenKind::FloatLit(v) => {
                self.advance()?;
                Ok(Expr::new(ExprKind::Const(Literal::Float(v)), token.span))
            }
            TokenKind::BoolLit(v) => {
                self.advance()?;
                Ok(Expr::new(ExprKind::Const(Literal::Bool(v)), token.span))
            }
            TokenKind::StringLit(s) => {
                self.advance()?;
                Ok(Expr::new(ExprKind::Const(Literal::Str(s)), token.span))
            }
            TokenKind::Null => {
                self.advance()?;
                Ok(Expr::new(ExprKind::Null, token.span))
            }
            TokenKind::LParen => {
                let start = self.advance()?.span;
                let inner = self.parse_assignment()?;
                let end = self.expect(TokenKind::RParen)?.span;
                Ok(Expr::new(
                    ExprKind::Grouping(Box::new(inner)),
                    start.merge(end),
                ))
            }
            TokenKind::Ident(name) => {
                self.advance()?;
                self.parse_ident_expr(name, token.span)
            }
            other => Err(CompileError::parser(
                format!("expected expression, found {other}"),
                token.span,
            )),
        }
    }

    /// Everything an identifier can open: call, method call, array lookup,
    /// `.size`, or a plain variable reference.
    fn parse_ident_expr(&mut self, name: String, start: Span) -> CompileResult<Expr> {
        if self.match_token(&TokenKind::LParen)? {
            let args = self.parse_args()?;
            let end = self.expect(TokenKind::RParen)?.span;
            return Ok(Expr::new(
                ExprKind::Call {
                    name,
                    receiver: None,
                    args,
                },
                start.merge(end),
            ));
        }

        if self.match_token(&TokenKind::LBracket)? {
            let index = self.parse_assignment()?;
            let end = self.expect(TokenKind::RBracket)?.span;
            return Ok(Expr::new(
                ExprKind::ArrayLookup {
                    name,
                    index: Box::new(index),
                },
                start.merge(end),
            ));
        }

        if self.check(&TokenKind::Dot) {
            self.advance()?;
            if self.check(&TokenKind::Size) {
                let end = self.advance()?.span;
                return Ok(Expr::new(ExprKind::ArraySize(name), start.merge(end)));
            }
            let (method, _) = self.expect_ident()?;
            self.expect(TokenKind::LParen)?;
            let args = self.parse_args()?;
            let end = self.expect(TokenKind::RParen)?.span;
            return Ok(Expr::new(
                ExprKind::Call {
                    name: method,
                    receiver: Some(name),
                    args,
                },
                start.merge(end),
            ));
        }

        Ok(Expr::new(ExprKind::Var(name), start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().parse().unwrap()
    }

    fn parse_err(source: &str) -> CompileError {
        Parser::new(source).unwrap().parse().unwrap_err()
    }

    #[test]
    fn test_var_decl_with_init() {
        let program = parse("int main() { int x = 1 + 2 * 3; return 0; }");
        let StmtKind::Decl(decl) = &program.stmts[0].kind else {
            panic!("expected declaration");
        };
        let DeclKind::Func(func) = &decl.kind else {
            panic!("expected function");
        };
        assert_eq!(func.name, "main");
        assert_eq!(func.return_type, Some(Type::Int));
        assert_eq!(func.body.len(), 2);
    }

    #[test]
    fn test_precedence_mul_binds_tighter() {
        let program = parse("int main() { int x = 1 + 2 * 3; }");
        let StmtKind::Decl(decl) = &program.stmts[0].kind else {
            panic!()
        };
        let DeclKind::Func(func) = &decl.kind else { panic!() };
        let StmtKind::Decl(inner) = &func.body[0].kind else {
            panic!()
        };
        let DeclKind::Var(var) = &inner.kind else { panic!() };
        let ExprKind::Binary { op, right, .. } = &var.init.as_ref().unwrap().kind else {
            panic!("expected binary init")
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_class_with_superclass_and_ctor() {
        let program = parse(
            "class Animal { public: int age; Animal(int a) { age = a; } int getAge() { return age; } };\n\
             class Cat : public Animal { };",
        );
        let StmtKind::Decl(decl) = &program.stmts[0].kind else {
            panic!()
        };
        let DeclKind::Class(class) = &decl.kind else { panic!() };
        assert_eq!(class.name, "Animal");
        assert_eq!(class.members.len(), 3);
        let DeclKind::Func(ctor) = &class.members[1].kind else {
            panic!()
        };
        assert!(ctor.is_constructor());

        let StmtKind::Decl(decl) = &program.stmts[1].kind else {
            panic!()
        };
        let DeclKind::Class(class) = &decl.kind else { panic!() };
        assert_eq!(class.super_name.as_deref(), Some("Animal"));
    }

    #[test]
    fn test_object_decl_with_ctor_args() {
        let program = parse("class P { };\nint main() { P p = new P(); P q; }");
        let StmtKind::Decl(decl) = &program.stmts[1].kind else {
            panic!()
        };
        let DeclKind::Func(func) = &decl.kind else { panic!() };
        let StmtKind::Decl(obj) = &func.body[0].kind else { panic!() };
        let DeclKind::Object(obj) = &obj.kind else { panic!() };
        assert_eq!(obj.ctor_args.as_ref().unwrap().len(), 0);
        let StmtKind::Decl(obj) = &func.body[1].kind else { panic!() };
        let DeclKind::Object(obj) = &obj.kind else { panic!() };
        assert!(obj.ctor_args.is_none());
    }

    #[test]
    fn test_cast_vs_grouping() {
        let program = parse("int main() { float f = (float) 3; int g = (3); }");
        let StmtKind::Decl(decl) = &program.stmts[0].kind else {
            panic!()
        };
        let DeclKind::Func(func) = &decl.kind else { panic!() };
        let StmtKind::Decl(d) = &func.body[0].kind else { panic!() };
        let DeclKind::Var(v) = &d.kind else { panic!() };
        assert!(matches!(
            v.init.as_ref().unwrap().kind,
            ExprKind::Cast { target: Type::Float, .. }
        ));
        let StmtKind::Decl(d) = &func.body[1].kind else { panic!() };
        let DeclKind::Var(v) = &d.kind else { panic!() };
        assert!(matches!(v.init.as_ref().unwrap().kind, ExprKind::Grouping(_)));
    }

    #[test]
    fn test_for_loop_with_decl_init() {
        let program = parse("int main() { for (int i = 0; i < 3; i = i + 1) { } }");
        let StmtKind::Decl(decl) = &program.stmts[0].kind else {
            panic!()
        };
        let DeclKind::Func(func) = &decl.kind else { panic!() };
        let StmtKind::For { init, cond, incr, .. } = &func.body[0].kind else {
            panic!("expected for loop")
        };
        assert!(init.is_some());
        assert!(cond.is_some());
        assert!(incr.is_some());
    }

    #[test]
    fn test_method_call_and_array_size() {
        let program = parse("int main() { obj.go(1); int n = a.size; a.size; }");
        let StmtKind::Decl(decl) = &program.stmts[0].kind else {
            panic!()
        };
        let DeclKind::Func(func) = &decl.kind else { panic!() };
        let StmtKind::Expr(call) = &func.body[0].kind else { panic!() };
        assert!(matches!(
            &call.kind,
            ExprKind::Call { receiver: Some(r), .. } if r == "obj"
        ));
        assert!(matches!(&func.body[2].kind, StmtKind::Size { name } if name == "a"));
    }

    #[test]
    fn test_compound_assign_and_incdec() {
        let program = parse("int main() { x += 2; ++x; x--; }");
        let StmtKind::Decl(decl) = &program.stmts[0].kind else {
            panic!()
        };
        let DeclKind::Func(func) = &decl.kind else { panic!() };
        let StmtKind::Expr(e) = &func.body[0].kind else { panic!() };
        assert!(matches!(
            e.kind,
            ExprKind::CompoundAssign { op: BinaryOp::Add, .. }
        ));
        let StmtKind::Expr(e) = &func.body[1].kind else { panic!() };
        assert!(matches!(e.kind, ExprKind::PrefixInc(_)));
        let StmtKind::Expr(e) = &func.body[2].kind else { panic!() };
        assert!(matches!(e.kind, ExprKind::PostfixDec(_)));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_err("int main() { 1 = 2; }");
        assert!(matches!(err, CompileError::Parser { .. }));
    }

    #[test]
    fn test_printf_forms() {
        let program = parse(r#"int main() { printf("hi\n"); printf("%d %s\n", x, s); }"#);
        let StmtKind::Decl(decl) = &program.stmts[0].kind else {
            panic!()
        };
        let DeclKind::Func(func) = &decl.kind else { panic!() };
        let StmtKind::Print { format, args } = &func.body[0].kind else {
            panic!()
        };
        assert_eq!(format, "hi\n");
        assert!(args.is_empty());
        let StmtKind::Print { args, .. } = &func.body[1].kind else {
            panic!()
        };
        assert_eq!(args.len(), 2);
    }
}
