//! Semantic analyzer
//!
//! Single pre-execution pass over the AST. Diagnostics are accumulated
//! rather than thrown, so the whole program is checked in one run even
//! when it contains errors. The driver refuses to interpret while any
//! diagnostic is outstanding.

use crate::ast::{
    ArrayDecl, BinaryOp, ClassDecl, Decl, DeclKind, Expr, ExprKind, FuncDecl, Literal,
    ObjectDecl, Program, Stmt, StmtKind, Type, UnaryOp, VarDecl,
};
use crate::common::{Diag, Span};
use crate::interp::builtins;
use crate::sema::format;
use crate::sema::scope::{FuncSig, Scope, Symbol, SymbolKind};
use std::collections::HashMap;

/// Statically known facts about a declared class
#[derive(Debug, Clone)]
struct ClassInfo {
    super_name: Option<String>,
    constructor: Option<FuncSig>,
    methods: HashMap<String, FuncSig>,
}

/// Walks a [`Program`] and accumulates semantic diagnostics
pub struct SemanticAnalyzer {
    scope: Scope,
    diags: Vec<Diag>,
    classes: HashMap<String, ClassInfo>,
    functions: HashMap<String, FuncSig>,
    current_function: Option<(String, Type)>,
    current_class: Option<String>,
    loop_depth: usize,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            scope: Scope::new(),
            diags: Vec::new(),
            classes: HashMap::new(),
            functions: HashMap::new(),
            current_function: None,
            current_class: None,
            loop_depth: 0,
        }
    }

    /// Analyze a whole program and return every diagnostic found
    pub fn analyze(&mut self, program: &Program) -> Vec<Diag> {
        self.scope = Scope::new();
        self.diags.clear();
        self.classes.clear();
        self.functions.clear();
        self.current_function = None;
        self.current_class = None;
        self.loop_depth = 0;

        for (name, ty) in builtins::constants() {
            let _ = self.scope.define(Symbol {
                name: name.to_string(),
                kind: SymbolKind::Variable,
                ty,
            });
        }
        for (name, sig) in builtins::signatures() {
            let _ = self.scope.define(Symbol {
                name: name.to_string(),
                kind: SymbolKind::Builtin(sig.clone()),
                ty: sig.return_type,
            });
        }

        for stmt in &program.stmts {
            self.check_stmt(stmt);
        }
        self.check_entry_point(program);
        std::mem::take(&mut self.diags)
    }

    fn diag(&mut self, message: String, span: Span) {
        self.diags.push(Diag::new(message, span));
    }

    fn check_entry_point(&mut self, program: &Program) {
        let span = program
            .stmts
            .last()
            .map(|s| s.span)
            .unwrap_or_default();
        match self.functions.get("main").cloned() {
            None => self.diag("main function not declared".to_string(), span),
            Some(sig) => {
                if sig.return_type != Type::Int {
                    self.diag("main function must return int".to_string(), span);
                }
                if !sig.params.is_empty() {
                    self.diag("main function must not have parameters".to_string(), span);
                }
            }
        }
    }

    // ---- statements -------------------------------------------------

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.check_expr(expr);
            }
            StmtKind::Decl(decl) => self.check_decl(decl),
            StmtKind::Block(stmts) => {
                self.scope.push_child();
                for s in stmts {
                    self.check_stmt(s);
                }
                self.scope.pop_to_parent();
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if let Some(ty) = self.check_expr(cond) {
                    if ty != Type::Bool {
                        self.diag(
                            format!("The 'if' condition must be of type 'bool', found '{ty}'"),
                            cond.span,
                        );
                    }
                }
                self.check_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
            }
            StmtKind::While { cond, body } => {
                if let Some(ty) = self.check_expr(cond) {
                    if ty != Type::Bool {
                        self.diag(
                            format!("The 'while' condition must be of type 'bool', found '{ty}'"),
                            cond.span,
                        );
                    }
                }
                self.loop_depth += 1;
                self.check_stmt(body);
                self.loop_depth -= 1;
            }
            StmtKind::For {
                init,
                cond,
                incr,
                body,
            } => {
                self.scope.push_child();
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(cond) = cond {
                    if let Some(ty) = self.check_expr(cond) {
                        if ty != Type::Bool {
                            self.diag(
                                format!(
                                    "The 'for' condition must be of type 'bool', found '{ty}'"
                                ),
                                cond.span,
                            );
                        }
                    }
                }
                if let Some(incr) = incr {
                    self.check_expr(incr);
                }
                self.loop_depth += 1;
                self.check_stmt(body);
                self.loop_depth -= 1;
                self.scope.pop_to_parent();
            }
            StmtKind::Return(expr) => self.check_return(expr.as_ref(), stmt.span),
            StmtKind::Break => {
                if self.loop_depth == 0 {
                    self.diag("'break' used outside of a loop".to_string(), stmt.span);
                }
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.diag("'continue' used outside of a loop".to_string(), stmt.span);
                }
            }
            StmtKind::Print { format, args } => self.check_print(format, args, stmt.span),
            StmtKind::Size { name } => match self.scope.lookup(name) {
                None => self.diag(format!("Variable '{name}' is not declared"), stmt.span),
                Some(sym) => {
                    if !matches!(sym.kind, SymbolKind::Array) {
                        self.diag(format!("'{name}' is not an array"), stmt.span);
                    }
                }
            },
            StmtKind::This => {
                if self.current_class.is_none() {
                    self.diag("'this' used outside of a class".to_string(), stmt.span);
                }
            }
            StmtKind::Super { args } => self.check_super(args, stmt.span),
        }
    }

    fn check_return(&mut self, expr: Option<&Expr>, span: Span) {
        let Some((func_name, expected)) = self.current_function.clone() else {
            self.diag("'return' used outside a function".to_string(), span);
            if let Some(expr) = expr {
                self.check_expr(expr);
            }
            return;
        };
        let actual = match expr {
            Some(expr) => self.check_expr(expr),
            None => Some(Type::Void),
        };
        if let Some(actual) = actual {
            if actual != expected {
                self.diag(
                    format!(
                        "Function '{func_name}' should return '{expected}', but returns '{actual}'"
                    ),
                    span,
                );
            }
        }
    }

    fn check_print(&mut self, fmt: &str, args: &[Expr], span: Span) {
        let expected = format::arg_types(fmt);
        if expected.len() != args.len() {
            self.diag(
                format!("Expected {} arguments, found {}", expected.len(), args.len()),
                span,
            );
        }
        for (i, (want, arg)) in expected.iter().zip(args.iter()).enumerate() {
            if let Some(got) = self.check_expr(arg) {
                if got != *want {
                    self.diag(
                        format!(
                            "Argument {} must be of type '{}', found '{}'",
                            i + 1,
                            want,
                            got
                        ),
                        arg.span,
                    );
                }
            }
        }
        // Surplus arguments are still visited so their own errors surface
        for arg in args.iter().skip(expected.len()) {
            self.check_expr(arg);
        }
    }

    fn check_super(&mut self, args: &[Expr], span: Span) {
        let arg_types: Vec<Option<Type>> = args.iter().map(|a| self.check_expr(a)).collect();
        let Some(class_name) = self.current_class.clone() else {
            self.diag("'super' used outside of a class".to_string(), span);
            return;
        };
        let Some(super_name) = self
            .classes
            .get(&class_name)
            .and_then(|info| info.super_name.clone())
        else {
            self.diag(format!("Class '{class_name}' has no superclass"), span);
            return;
        };
        if !self.classes.contains_key(&super_name) {
            self.diag(format!("Superclass '{super_name}' is not declared"), span);
            return;
        }
        match self.find_constructor(&super_name) {
            Some((owner, sig)) => {
                if sig.params.len() != args.len() {
                    self.diag(
                        format!(
                            "The constructor of '{}' expects {} arguments, found {}",
                            owner,
                            sig.params.len(),
                            args.len()
                        ),
                        span,
                    );
                    return;
                }
                for ((pname, pty), arg_ty) in sig.params.iter().zip(arg_types.iter()) {
                    if let Some(arg_ty) = arg_ty {
                        if !self.compatible(pty, arg_ty) {
                            self.diag(
                                format!(
                                    "Argument of type '{arg_ty}' cannot be assigned to parameter '{pname}' of type '{pty}'"
                                ),
                                span,
                            );
                        }
                    }
                }
            }
            None => {
                self.diag(format!("No constructor found for class '{super_name}'"), span);
            }
        }
    }

    // ---- declarations -----------------------------------------------

    fn check_decl(&mut self, decl: &Decl) {
        match &decl.kind {
            DeclKind::Var(var) => self.check_var_decl(var),
            DeclKind::Array(array) => self.check_array_decl(array),
            DeclKind::Func(func) => self.check_func_decl(func),
            DeclKind::Class(class) => self.check_class_decl(class),
            DeclKind::Object(object) => self.check_object_decl(object),
        }
    }

    fn check_var_decl(&mut self, var: &VarDecl) {
        if self.scope.lookup_local(&var.name).is_some() {
            self.diag(format!("Variable {} already declared", var.name), var.span);
            return;
        }
        if let Some(init) = &var.init {
            if let Some(ty) = self.check_expr(init) {
                if !self.compatible(&var.ty, &ty) {
                    self.diag(
                        format!(
                            "not able to assign {} to variable {} of type {}",
                            ty, var.name, var.ty
                        ),
                        var.span,
                    );
                }
            }
        }
        let _ = self.scope.define(Symbol {
            name: var.name.clone(),
            kind: SymbolKind::Variable,
            ty: var.ty.clone(),
        });
    }

    fn check_array_decl(&mut self, array: &ArrayDecl) {
        if self.scope.lookup_local(&array.name).is_some() {
            self.diag(format!("Array {} already declared", array.name), array.span);
            return;
        }
        if let Some(ty) = self.check_expr(&array.size) {
            if ty != Type::Int {
                self.diag(
                    format!(
                        "size of array {} must be of type int, found {}",
                        array.name, ty
                    ),
                    array.size.span,
                );
            }
        }
        let _ = self.scope.define(Symbol {
            name: array.name.clone(),
            kind: SymbolKind::Array,
            ty: array.elem_ty.clone(),
        });
    }

    fn check_func_decl(&mut self, func: &FuncDecl) {
        if self.current_class.as_deref() == Some(func.name.as_str()) {
            self.check_constructor(func);
            return;
        }
        let sig = signature_of(func);
        if self.scope.lookup_local(&func.name).is_some() {
            self.diag(format!("Function {} already declared", func.name), func.span);
            return;
        }
        let _ = self.scope.define(Symbol {
            name: func.name.clone(),
            kind: SymbolKind::Function(sig.clone()),
            ty: sig.return_type.clone(),
        });
        if self.current_class.is_none() {
            self.functions.insert(func.name.clone(), sig.clone());
        }

        self.scope.push_child();
        for param in &func.params {
            if self.scope.lookup_local(&param.name).is_some() {
                self.diag(
                    format!(
                        "Parameter {} already declared in function {}",
                        param.name, func.name
                    ),
                    param.span,
                );
                continue;
            }
            let _ = self.scope.define(Symbol {
                name: param.name.clone(),
                kind: SymbolKind::Parameter,
                ty: param.ty.clone(),
            });
        }
        let saved = self.current_function.replace((func.name.clone(), sig.return_type));
        for stmt in &func.body {
            self.check_stmt(stmt);
        }
        self.current_function = saved;
        self.scope.pop_to_parent();
    }

    // Constructors have no declared return type; return statements
    // inside them are still flagged through the usual path.
    fn check_constructor(&mut self, func: &FuncDecl) {
        self.scope.push_child();
        for param in &func.params {
            if self.scope.lookup_local(&param.name).is_some() {
                self.diag(
                    format!(
                        "Parameter '{}' already declared in constructor '{}'",
                        param.name, func.name
                    ),
                    param.span,
                );
                continue;
            }
            let _ = self.scope.define(Symbol {
                name: param.name.clone(),
                kind: SymbolKind::Parameter,
                ty: param.ty.clone(),
            });
        }
        let saved = self.current_function.take();
        for stmt in &func.body {
            self.check_stmt(stmt);
        }
        self.current_function = saved;
        self.scope.pop_to_parent();
    }

    fn check_class_decl(&mut self, class: &ClassDecl) {
        if self.scope.lookup_local(&class.name).is_some() {
            self.diag(format!("Class '{}' already declared", class.name), class.span);
            return;
        }
        let _ = self.scope.define(Symbol {
            name: class.name.clone(),
            kind: SymbolKind::Class,
            ty: Type::Class(class.name.clone()),
        });

        if let Some(super_name) = &class.super_name {
            if super_name == &class.name {
                self.diag(
                    format!("Class '{}' cannot inherit from itself", class.name),
                    class.span,
                );
            } else {
                match self.classes.get(super_name) {
                    None => self.diag(
                        format!("Superclass '{super_name}' not declared"),
                        class.span,
                    ),
                    Some(info) => {
                        if info.super_name.as_deref() == Some(class.name.as_str()) {
                            self.diag(
                                format!(
                                    "Circular inheritance between '{}' and '{}'",
                                    class.name, super_name
                                ),
                                class.span,
                            );
                        }
                    }
                }
            }
        }

        // Register the class shape before member bodies are visited so
        // object declarations and method calls can resolve against it.
        let mut info = ClassInfo {
            super_name: class.super_name.clone(),
            constructor: None,
            methods: HashMap::new(),
        };
        for member in &class.members {
            if let DeclKind::Func(func) = &member.kind {
                let sig = signature_of(func);
                if func.name == class.name {
                    if info.constructor.is_some() {
                        self.diag(
                            format!(
                                "Constructor '{}' already declared in class '{}'",
                                func.name, class.name
                            ),
                            func.span,
                        );
                    } else {
                        info.constructor = Some(sig);
                    }
                } else {
                    info.methods.insert(func.name.clone(), sig);
                }
            }
        }
        self.classes.insert(class.name.clone(), info);

        self.scope.push_child();
        let saved = self.current_class.replace(class.name.clone());
        for member in &class.members {
            self.check_decl(member);
        }
        self.current_class = saved;
        self.scope.pop_to_parent();
    }

    fn check_object_decl(&mut self, object: &ObjectDecl) {
        if self.scope.lookup_local(&object.instance_name).is_some() {
            self.diag(
                format!("Object {} already declared", object.instance_name),
                object.span,
            );
            return;
        }
        if !self.classes.contains_key(&object.class_name) {
            self.diag(
                format!("Class {} not declared", object.class_name),
                object.span,
            );
            return;
        }
        if let Some(args) = &object.ctor_args {
            let arg_types: Vec<Option<Type>> =
                args.iter().map(|a| self.check_expr(a)).collect();
            match self.find_constructor(&object.class_name) {
                Some((_, sig)) => {
                    if sig.params.len() != args.len() {
                        self.diag(
                            format!(
                                "The constructor of the class {} expects {} arguments, found {}",
                                object.class_name,
                                sig.params.len(),
                                args.len()
                            ),
                            object.span,
                        );
                    } else {
                        for ((_, pty), arg_ty) in sig.params.iter().zip(arg_types.iter()) {
                            if let Some(arg_ty) = arg_ty {
                                if !self.compatible(pty, arg_ty) {
                                    self.diag(
                                        format!(
                                            "Argument of type {arg_ty} cannot be assigned to parameter of type {pty}"
                                        ),
                                        object.span,
                                    );
                                }
                            }
                        }
                    }
                }
                None => {
                    if !args.is_empty() {
                        self.diag(
                            format!("Constructor for class {} not found", object.class_name),
                            object.span,
                        );
                    }
                }
            }
        }
        let _ = self.scope.define(Symbol {
            name: object.instance_name.clone(),
            kind: SymbolKind::Object,
            ty: Type::Class(object.class_name.clone()),
        });
    }

    // ---- expressions ------------------------------------------------

    fn check_expr(&mut self, expr: &Expr) -> Option<Type> {
        match &expr.kind {
            ExprKind::Const(lit) => Some(match lit {
                Literal::Int(_) => Type::Int,
                Literal::Float(_) => Type::Float,
                Literal::Bool(_) => Type::Bool,
                Literal::Str(_) => Type::Str,
            }),
            ExprKind::Null => Some(Type::Null),
            ExprKind::Var(name) => self.check_var_expr(name, expr.span),
            ExprKind::ArrayLookup { name, index } => {
                let elem = self.check_array_name(name, expr.span);
                if let Some(ty) = self.check_expr(index) {
                    if ty != Type::Int {
                        self.diag(
                            format!("Array index must be of type 'int', found '{ty}'"),
                            index.span,
                        );
                    }
                }
                elem
            }
            ExprKind::ArraySize(name) => {
                self.check_array_name(name, expr.span)?;
                Some(Type::Int)
            }
            ExprKind::VarAssign { name, expr: value } => {
                let value_ty = self.check_expr(value);
                let var_ty = self.check_var_expr(name, expr.span)?;
                if let Some(value_ty) = value_ty {
                    if !self.compatible(&var_ty, &value_ty) {
                        self.diag(
                            format!(
                                "Cannot assign value of type '{value_ty}' to variable '{name}' of type '{var_ty}'"
                            ),
                            expr.span,
                        );
                    }
                }
                Some(var_ty)
            }
            ExprKind::ArrayAssign { name, index, expr: value } => {
                let elem = self.check_array_name(name, expr.span);
                if let Some(ty) = self.check_expr(index) {
                    if ty != Type::Int {
                        self.diag(
                            format!("Array index must be of type 'int', found '{ty}'"),
                            index.span,
                        );
                    }
                }
                let value_ty = self.check_expr(value);
                if let (Some(elem), Some(value_ty)) = (&elem, &value_ty) {
                    if !self.compatible(elem, value_ty) {
                        self.diag(
                            format!(
                                "Cannot assign value of type '{value_ty}' to array element of type '{elem}'"
                            ),
                            expr.span,
                        );
                    }
                }
                elem
            }
            ExprKind::CompoundAssign { name, op, expr: value } => {
                let value_ty = self.check_expr(value);
                let var_ty = self.check_var_expr(name, expr.span)?;
                let value_ty = value_ty?;
                let Some(result) = binary_result(*op, &var_ty, &value_ty) else {
                    self.diag(
                        format!(
                            "Operation '{op}=' not supported between '{var_ty}' and '{value_ty}'"
                        ),
                        expr.span,
                    );
                    return Some(var_ty);
                };
                if !self.compatible(&var_ty, &result) {
                    self.diag(
                        format!(
                            "Cannot assign value of type '{result}' to variable '{name}' of type '{var_ty}'"
                        ),
                        expr.span,
                    );
                }
                Some(var_ty)
            }
            ExprKind::Binary { op, left, right } => {
                let lt = self.check_expr(left);
                let rt = self.check_expr(right);
                let (lt, rt) = (lt?, rt?);
                match binary_result(*op, &lt, &rt) {
                    Some(ty) => Some(ty),
                    None => {
                        self.diag(
                            format!("Operation '{op}' not supported between '{lt}' and '{rt}'"),
                            expr.span,
                        );
                        None
                    }
                }
            }
            ExprKind::Unary { op, expr: inner } => {
                let ty = self.check_expr(inner)?;
                let ok = match op {
                    UnaryOp::Not => ty == Type::Bool,
                    UnaryOp::Plus | UnaryOp::Minus => ty.is_numeric(),
                };
                if ok {
                    Some(ty)
                } else {
                    self.diag(
                        format!("Unary operation '{op}' not supported for type '{ty}'"),
                        expr.span,
                    );
                    None
                }
            }
            ExprKind::PrefixInc(target) | ExprKind::PostfixInc(target) => {
                self.check_step_target(target, "++", expr.span)
            }
            ExprKind::PrefixDec(target) | ExprKind::PostfixDec(target) => {
                self.check_step_target(target, "--", expr.span)
            }
            ExprKind::And { left, right } => {
                self.check_logic_operand(left, "&&", "Left");
                self.check_logic_operand(right, "&&", "Right");
                Some(Type::Bool)
            }
            ExprKind::Or { left, right } => {
                self.check_logic_operand(left, "||", "Left");
                self.check_logic_operand(right, "||", "Right");
                Some(Type::Bool)
            }
            ExprKind::Cast { target, expr: inner } => {
                if let Some(ty) = self.check_expr(inner) {
                    let valid = ty == *target
                        || (ty.is_numeric() && target.is_numeric());
                    if !valid {
                        self.diag(
                            format!("Cannot cast from {ty} to {target}"),
                            expr.span,
                        );
                    }
                }
                // Downstream checks proceed with the requested type
                Some(target.clone())
            }
            ExprKind::Call {
                name,
                receiver,
                args,
            } => self.check_call(name, receiver.as_deref(), args, expr.span),
            ExprKind::Grouping(inner) => self.check_expr(inner),
        }
    }

    fn check_var_expr(&mut self, name: &str, span: Span) -> Option<Type> {
        match self.scope.lookup(name) {
            Some(sym) => match sym.kind {
                SymbolKind::Variable | SymbolKind::Parameter | SymbolKind::Object => {
                    Some(sym.ty.clone())
                }
                _ => {
                    self.diag(format!("'{name}' is not a variable"), span);
                    None
                }
            },
            None => {
                self.diag(format!("Variable '{name}' not declared"), span);
                None
            }
        }
    }

    fn check_array_name(&mut self, name: &str, span: Span) -> Option<Type> {
        match self.scope.lookup(name) {
            Some(sym) => {
                if matches!(sym.kind, SymbolKind::Array) {
                    Some(sym.ty.clone())
                } else {
                    self.diag(format!("'{name}' is not an array"), span);
                    None
                }
            }
            None => {
                self.diag(format!("Array '{name}' not declared"), span);
                None
            }
        }
    }

    fn check_step_target(&mut self, target: &Expr, op: &str, span: Span) -> Option<Type> {
        let ty = match &target.kind {
            ExprKind::Var(_) | ExprKind::ArrayLookup { .. } => self.check_expr(target)?,
            _ => {
                self.diag(
                    format!("Operator '{op}' must be applied to a variable or array element"),
                    span,
                );
                return None;
            }
        };
        if ty.is_numeric() {
            Some(ty)
        } else {
            self.diag(
                format!("Operator '{op}' cannot be applied to variables of type '{ty}'"),
                span,
            );
            None
        }
    }

    fn check_logic_operand(&mut self, operand: &Expr, op: &str, side: &str) {
        if let Some(ty) = self.check_expr(operand) {
            if ty != Type::Bool {
                self.diag(
                    format!("{side} expression of '{op}' must be of type 'bool', found '{ty}'"),
                    operand.span,
                );
            }
        }
    }

    fn check_call(
        &mut self,
        name: &str,
        receiver: Option<&str>,
        args: &[Expr],
        span: Span,
    ) -> Option<Type> {
        let arg_types: Vec<Option<Type>> = args.iter().map(|a| self.check_expr(a)).collect();

        let (sig, context) = if let Some(object_name) = receiver {
            let Some(sym) = self.scope.lookup(object_name) else {
                self.diag(format!("Object '{object_name}' is not declared"), span);
                return Some(Type::Null);
            };
            let Type::Class(class_name) = sym.ty.clone() else {
                let ty = sym.ty.clone();
                self.diag(format!("Object type '{ty}' is not a valid class"), span);
                return Some(Type::Null);
            };
            let Some(sig) = self.find_method(&class_name, name) else {
                self.diag(
                    format!("Method '{name}' not found in class '{class_name}'"),
                    span,
                );
                return Some(Type::Null);
            };
            (sig, format!("method '{name}'"))
        } else {
            let sig = match self.scope.lookup(name) {
                Some(Symbol {
                    kind: SymbolKind::Function(sig) | SymbolKind::Builtin(sig),
                    ..
                }) => sig.clone(),
                _ => {
                    // Inside a method, a bare call may target a method of
                    // the enclosing class or one of its ancestors.
                    let inherited = self
                        .current_class
                        .clone()
                        .and_then(|class| self.find_method(&class, name));
                    match inherited {
                        Some(sig) => sig,
                        None => {
                            self.diag(format!("Function '{name}' is not declared"), span);
                            return Some(Type::Null);
                        }
                    }
                }
            };
            (sig, format!("function '{name}'"))
        };

        if sig.params.len() != args.len() {
            let what = if receiver.is_some() {
                let class = receiver
                    .and_then(|r| self.scope.lookup(r))
                    .map(|s| s.ty.to_string())
                    .unwrap_or_default();
                format!("Method '{name}' in class '{class}'")
            } else {
                format!("Function '{name}'")
            };
            self.diag(
                format!(
                    "{} expects {} arguments, found {}",
                    what,
                    sig.params.len(),
                    args.len()
                ),
                span,
            );
            return Some(sig.return_type);
        }
        for ((pname, pty), arg_ty) in sig.params.iter().zip(arg_types.iter()) {
            if let Some(arg_ty) = arg_ty {
                if !self.compatible(pty, arg_ty) {
                    self.diag(
                        format!(
                            "Argument of type '{arg_ty}' cannot be assigned to parameter '{pname}' of type '{pty}' in {context}"
                        ),
                        span,
                    );
                }
            }
        }
        Some(sig.return_type)
    }

    // ---- shared helpers ---------------------------------------------

    /// Assignment compatibility: equal types, null into string or class
    /// targets, and int widening into float
    fn compatible(&self, target: &Type, value: &Type) -> bool {
        if target == value {
            return true;
        }
        if *value == Type::Null {
            return matches!(target, Type::Str | Type::Class(_));
        }
        *target == Type::Float && *value == Type::Int
    }

    /// Method lookup through the superclass chain. Visited classes are
    /// tracked so a cyclic hierarchy (already diagnosed) cannot loop.
    fn find_method(&self, class_name: &str, method: &str) -> Option<FuncSig> {
        let mut visited = Vec::new();
        let mut current = Some(class_name.to_string());
        while let Some(name) = current {
            if visited.contains(&name) {
                return None;
            }
            let info = self.classes.get(&name)?;
            if let Some(sig) = info.methods.get(method) {
                return Some(sig.clone());
            }
            visited.push(name);
            current = info.super_name.clone();
        }
        None
    }

    /// Constructor lookup: a class's own constructor, else the nearest
    /// ancestor's. Returns the owning class name with the signature.
    fn find_constructor(&self, class_name: &str) -> Option<(String, FuncSig)> {
        let mut visited = Vec::new();
        let mut current = Some(class_name.to_string());
        while let Some(name) = current {
            if visited.contains(&name) {
                return None;
            }
            let info = self.classes.get(&name)?;
            if let Some(sig) = &info.constructor {
                return Some((name, sig.clone()));
            }
            visited.push(name);
            current = info.super_name.clone();
        }
        None
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn signature_of(func: &FuncDecl) -> FuncSig {
    FuncSig {
        params: func
            .params
            .iter()
            .map(|p| (p.name.clone(), p.ty.clone()))
            .collect(),
        return_type: func.return_type.clone().unwrap_or(Type::Void),
    }
}

fn binary_result(op: BinaryOp, left: &Type, right: &Type) -> Option<Type> {
    if op.is_arithmetic() {
        return match (left, right) {
            (Type::Int, Type::Int) => Some(Type::Int),
            (l, r) if l.is_numeric() && r.is_numeric() => Some(Type::Float),
            _ => None,
        };
    }
    if op.is_relational() {
        return if left.is_numeric() && right.is_numeric() {
            Some(Type::Bool)
        } else {
            None
        };
    }
    // Equality: null compares against strings, classes, and null
    if *left == Type::Null || *right == Type::Null {
        let other = if *left == Type::Null { right } else { left };
        return if matches!(other, Type::Str | Type::Class(_) | Type::Null) {
            Some(Type::Bool)
        } else {
            None
        };
    }
    if left == right {
        Some(Type::Bool)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;

    fn analyze(source: &str) -> Vec<String> {
        let mut parser = Parser::new(source).expect("parser setup");
        let program = parser.parse().expect("parse");
        SemanticAnalyzer::new()
            .analyze(&program)
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    #[test]
    fn test_clean_program_has_no_diagnostics() {
        let diags = analyze(
            r#"
            int add(int a, int b) { return a + b; }
            int main() {
                int x = add(2, 3);
                printf("%d", x);
                return 0;
            }
            "#,
        );
        assert_eq!(diags, Vec::<String>::new());
    }

    #[test]
    fn test_missing_main() {
        let diags = analyze("int helper() { return 1; }");
        assert!(diags.iter().any(|d| d == "main function not declared"));
    }

    #[test]
    fn test_main_must_return_int() {
        let diags = analyze("void main() { return; }");
        assert!(diags.iter().any(|d| d == "main function must return int"));
    }

    #[test]
    fn test_main_must_not_have_parameters() {
        let diags = analyze("int main(int argc) { return 0; }");
        assert!(diags.iter().any(|d| d == "main function must not have parameters"));
    }

    #[test]
    fn test_undeclared_variable() {
        let diags = analyze("int main() { x = 1; return 0; }");
        assert!(diags.iter().any(|d| d == "Variable 'x' not declared"));
    }

    #[test]
    fn test_condition_must_be_bool() {
        let diags = analyze("int main() { if (1) { } return 0; }");
        assert_eq!(
            diags,
            vec!["The 'if' condition must be of type 'bool', found 'int'".to_string()]
        );
    }

    #[test]
    fn test_break_outside_loop() {
        let diags = analyze("int main() { break; return 0; }");
        assert_eq!(diags, vec!["'break' used outside of a loop".to_string()]);
    }

    #[test]
    fn test_printf_argument_mismatch() {
        let diags = analyze(r#"int main() { printf("%d", "text"); return 0; }"#);
        assert_eq!(
            diags,
            vec!["Argument 1 must be of type 'int', found 'string'".to_string()]
        );
    }

    #[test]
    fn test_printf_argument_count() {
        let diags = analyze(r#"int main() { printf("%d %d", 1); return 0; }"#);
        assert_eq!(diags, vec!["Expected 2 arguments, found 1".to_string()]);
    }

    #[test]
    fn test_duplicate_variable_in_same_scope() {
        let diags = analyze("int main() { int x; float x; return 0; }");
        assert_eq!(diags, vec!["Variable x already declared".to_string()]);
    }

    #[test]
    fn test_shadowing_in_inner_scope_is_allowed() {
        let diags = analyze(
            r#"
            int main() {
                int x = 1;
                { float x = 2.0; printf("%f", x); }
                printf("%d", x);
                return 0;
            }
            "#,
        );
        assert_eq!(diags, Vec::<String>::new());
    }

    #[test]
    fn test_int_widens_to_float() {
        let diags = analyze("int main() { float f = 3; return 0; }");
        assert_eq!(diags, Vec::<String>::new());
    }

    #[test]
    fn test_float_does_not_narrow_to_int() {
        let diags = analyze("int main() { int i = 3.5; return 0; }");
        assert_eq!(
            diags,
            vec!["not able to assign float to variable i of type int".to_string()]
        );
    }

    #[test]
    fn test_null_assigns_to_string_but_not_int() {
        let diags = analyze("int main() { string s = null; int i = null; return 0; }");
        assert_eq!(
            diags,
            vec!["not able to assign null to variable i of type int".to_string()]
        );
    }

    #[test]
    fn test_array_size_must_be_int() {
        let diags = analyze("int main() { int a[2.5]; return 0; }");
        assert_eq!(
            diags,
            vec!["size of array a must be of type int, found float".to_string()]
        );
    }

    #[test]
    fn test_method_resolved_through_superclass_chain() {
        let diags = analyze(
            r#"
            class Animal {
                int legs() { return 4; }
            };
            class Dog : public Animal {
            };
            int main() {
                Dog d;
                printf("%d", d.legs());
                return 0;
            }
            "#,
        );
        assert_eq!(diags, Vec::<String>::new());
    }

    #[test]
    fn test_bare_call_to_inherited_method_inside_subclass() {
        let diags = analyze(
            r#"
            class Counter {
                int next() { return 1; }
            };
            class Stepper : public Counter {
                int jump() { return next() + later(); }
                int later() { return 2; }
            };
            int main() {
                Stepper s;
                printf("%d", s.jump());
                return 0;
            }
            "#,
        );
        assert_eq!(diags, Vec::<String>::new());
    }

    #[test]
    fn test_unknown_method() {
        let diags = analyze(
            r#"
            class Point { };
            int main() {
                Point p;
                p.reset();
                return 0;
            }
            "#,
        );
        assert!(diags.iter().any(|d| d == "Method 'reset' not found in class 'Point'"));
    }

    #[test]
    fn test_constructor_arity() {
        let diags = analyze(
            r#"
            class Point {
                Point(int x, int y) { }
            };
            int main() {
                Point p = new Point(1);
                return 0;
            }
            "#,
        );
        assert!(diags
            .iter()
            .any(|d| d == "The constructor of the class Point expects 2 arguments, found 1"));
    }

    #[test]
    fn test_self_inheritance_rejected() {
        let diags = analyze("class A : public A { };\nint main() { return 0; }");
        assert!(diags.iter().any(|d| d == "Class 'A' cannot inherit from itself"));
    }

    #[test]
    fn test_undeclared_superclass() {
        let diags = analyze("class B : public A { };\nint main() { return 0; }");
        assert!(diags.iter().any(|d| d == "Superclass 'A' not declared"));
    }

    #[test]
    fn test_invalid_cast() {
        let diags = analyze(r#"int main() { int i = (int)"5"; return 0; }"#);
        assert_eq!(diags, vec!["Cannot cast from string to int".to_string()]);
    }

    #[test]
    fn test_builtins_are_known() {
        let diags = analyze(
            r#"
            int main() {
                float r = sqrt(2.0);
                printf("%f %f", r, PI);
                return 0;
            }
            "#,
        );
        assert_eq!(diags, Vec::<String>::new());
    }

    #[test]
    fn test_logical_operands_must_be_bool() {
        let diags = analyze("int main() { bool b = 1 && true; return 0; }");
        assert_eq!(
            diags,
            vec!["Left expression of '&&' must be of type 'bool', found 'int'".to_string()]
        );
    }

    #[test]
    fn test_return_type_checked() {
        let diags = analyze("int f() { return 1.5; }\nint main() { return 0; }");
        assert_eq!(
            diags,
            vec!["Function 'f' should return 'int', but returns 'float'".to_string()]
        );
    }

    #[test]
    fn test_increment_requires_numeric_lvalue() {
        let diags = analyze("int main() { bool b = true; b++; return 0; }");
        assert_eq!(
            diags,
            vec!["Operator '++' cannot be applied to variables of type 'bool'".to_string()]
        );
    }
}
