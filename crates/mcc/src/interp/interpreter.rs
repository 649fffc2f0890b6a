//! AST execution
//!
//! `return`, `break`, and `continue` are modeled as [`Flow`] values
//! threaded out of statement execution: loops absorb `Break` and
//! `Continue`, call boundaries absorb `Return`. Runtime errors travel
//! separately as [`CompileError::Runtime`] and abort the program.

use crate::ast::{
    ArrayDecl, BinaryOp, ClassDecl, Decl, DeclKind, Expr, ExprKind, Literal, ObjectDecl,
    Program, Stmt, StmtKind, Type, UnaryOp, VarDecl,
};
use crate::common::{CompileError, CompileResult, Span};
use crate::interp::builtins;
use crate::interp::class::{Class, Function, Instance};
use crate::interp::env::Env;
use crate::interp::value::Value;
use crate::sema::format::{self, FormatArg, Piece};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

/// Non-local control transfer out of a statement
pub enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Tree-walking evaluator over a program already accepted by the analyzer
pub struct Interpreter<'out> {
    env: Rc<RefCell<Env>>,
    out: &'out mut dyn Write,
}

impl<'out> Interpreter<'out> {
    pub fn new(out: &'out mut dyn Write) -> Self {
        let env = Env::new();
        builtins::install(&env);
        Self { env, out }
    }

    /// Execute top-level statements, then call `main` and return its value
    pub fn run(&mut self, program: &Program) -> CompileResult<Value> {
        for stmt in &program.stmts {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                Flow::Return(value) => return Ok(value),
                Flow::Break | Flow::Continue => {
                    return Err(CompileError::runtime(
                        "'break' or 'continue' outside of a loop",
                        stmt.span,
                    ));
                }
            }
        }
        let main = self.env.borrow().get("main");
        match main {
            Some(Value::Function(func)) => self.call_function(&func, Vec::new(), Span::default()),
            _ => Err(CompileError::runtime(
                "no valid 'main' function found",
                Span::default(),
            )),
        }
    }

    // ---- statements -------------------------------------------------

    fn exec_stmt(&mut self, stmt: &Stmt) -> CompileResult<Flow> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            StmtKind::Decl(decl) => {
                self.exec_decl(decl)?;
                Ok(Flow::Normal)
            }
            StmtKind::Block(stmts) => self.in_child_env(|this| this.exec_block(stmts)),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.exec_stmt(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec_stmt(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            StmtKind::While { cond, body } => {
                while self.eval(cond)?.is_truthy() {
                    match self.exec_stmt(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::For {
                init,
                cond,
                incr,
                body,
            } => self.in_child_env(|this| {
                if let Some(init) = init {
                    this.exec_stmt(init)?;
                }
                loop {
                    if let Some(cond) = cond {
                        if !this.eval(cond)?.is_truthy() {
                            break;
                        }
                    }
                    match this.exec_stmt(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        // The increment still runs after a continue
                        Flow::Normal | Flow::Continue => {}
                    }
                    if let Some(incr) = incr {
                        this.eval(incr)?;
                    }
                }
                Ok(Flow::Normal)
            }),
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Int(0),
                };
                Ok(Flow::Return(value))
            }
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
            StmtKind::Print { format, args } => {
                self.exec_print(format, args, stmt.span)?;
                Ok(Flow::Normal)
            }
            StmtKind::Size { name } => {
                // Value is discarded; the lookup still validates the name
                self.array_value(name, stmt.span)?;
                Ok(Flow::Normal)
            }
            StmtKind::This => {
                self.this_instance(stmt.span)?;
                Ok(Flow::Normal)
            }
            StmtKind::Super { args } => {
                self.exec_super(args, stmt.span)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> CompileResult<Flow> {
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_print(&mut self, fmt: &str, args: &[Expr], span: Span) -> CompileResult<()> {
        let values: Vec<Value> = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<CompileResult<_>>()?;
        let mut rendered = String::new();
        let mut next = 0;
        for piece in format::scan(fmt) {
            match piece {
                Piece::Lit(text) => rendered.push_str(&text),
                Piece::Spec(spec) => {
                    let Some(value) = values.get(next) else {
                        return Err(CompileError::runtime(
                            format!("printf expects more than {} arguments", values.len()),
                            span,
                        ));
                    };
                    next += 1;
                    let arg = format_arg(&spec, value, span)?;
                    rendered.push_str(&format::render_spec(&spec, &arg));
                }
            }
        }
        write!(self.out, "{rendered}").map_err(CompileError::Io)?;
        Ok(())
    }

    fn exec_super(&mut self, args: &[Expr], span: Span) -> CompileResult<()> {
        let superclass = match self.env.borrow().get("super") {
            Some(Value::Class(class)) => class,
            _ => {
                return Err(CompileError::runtime(
                    "'super' used outside of a subclass",
                    span,
                ));
            }
        };
        let instance = self.this_instance(span)?;
        let Some(ctor) = superclass.find_constructor() else {
            return Err(CompileError::runtime(
                format!("No constructor found for class '{}'", superclass.name),
                span,
            ));
        };
        let values: Vec<Value> = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<CompileResult<_>>()?;
        self.call_function(&ctor.bind(&instance), values, span)?;
        Ok(())
    }

    // ---- declarations -----------------------------------------------

    fn exec_decl(&mut self, decl: &Decl) -> CompileResult<()> {
        match &decl.kind {
            DeclKind::Var(var) => {
                let value = self.var_decl_value(var)?;
                self.env.borrow_mut().define(var.name.clone(), value);
            }
            DeclKind::Array(array) => {
                let value = self.array_decl_value(array)?;
                self.env.borrow_mut().define(array.name.clone(), value);
            }
            DeclKind::Func(func) => {
                let function = Function::new(Rc::new(func.clone()), Rc::clone(&self.env));
                self.env
                    .borrow_mut()
                    .define(func.name.clone(), Value::Function(function));
            }
            DeclKind::Class(class) => self.exec_class_decl(class)?,
            DeclKind::Object(object) => self.exec_object_decl(object)?,
        }
        Ok(())
    }

    fn var_decl_value(&mut self, var: &VarDecl) -> CompileResult<Value> {
        match &var.init {
            Some(init) => self.eval(init),
            None => Ok(zero_value(&var.ty)),
        }
    }

    fn array_decl_value(&mut self, array: &ArrayDecl) -> CompileResult<Value> {
        let size = match self.eval(&array.size)? {
            Value::Int(v) if v >= 0 => v as usize,
            Value::Int(v) => {
                return Err(CompileError::runtime(
                    format!("Array size must be non-negative, got {v}"),
                    array.size.span,
                ));
            }
            other => {
                return Err(CompileError::runtime(
                    format!("Array size must be an int, got {}", other.type_name()),
                    array.size.span,
                ));
            }
        };
        let elem = match array.elem_ty {
            Type::Int => Value::Int(0),
            Type::Float => Value::Float(0.0),
            ref other => {
                return Err(CompileError::runtime(
                    format!("Arrays of '{other}' are not supported"),
                    array.span,
                ));
            }
        };
        Ok(Value::Array(Rc::new(RefCell::new(vec![elem; size]))))
    }

    fn exec_class_decl(&mut self, class: &ClassDecl) -> CompileResult<()> {
        let superclass = match &class.super_name {
            Some(super_name) => match self.env.borrow().get(super_name) {
                Some(Value::Class(superclass)) => Some(superclass),
                _ => {
                    return Err(CompileError::runtime(
                        format!("Superclass '{super_name}' is not a class"),
                        class.span,
                    ));
                }
            },
            None => None,
        };

        // Methods close over a frame that binds `super` when there is
        // a superclass, so super calls resolve lexically.
        let method_env = match &superclass {
            Some(superclass) => {
                let env = Env::with_parent(&self.env);
                env.borrow_mut()
                    .define("super", Value::Class(Rc::clone(superclass)));
                env
            }
            None => Rc::clone(&self.env),
        };

        let mut methods = HashMap::new();
        let mut field_decls = Vec::new();
        for member in &class.members {
            match &member.kind {
                DeclKind::Func(func) => {
                    methods.insert(
                        func.name.clone(),
                        Function::new(Rc::new(func.clone()), Rc::clone(&method_env)),
                    );
                }
                DeclKind::Var(_) | DeclKind::Array(_) => field_decls.push(member.clone()),
                _ => {}
            }
        }

        let klass = Rc::new(Class {
            name: class.name.clone(),
            superclass,
            methods,
            field_decls,
        });
        self.env
            .borrow_mut()
            .define(class.name.clone(), Value::Class(klass));
        Ok(())
    }

    fn exec_object_decl(&mut self, object: &ObjectDecl) -> CompileResult<()> {
        let klass = match self.env.borrow().get(&object.class_name) {
            Some(Value::Class(klass)) => klass,
            _ => {
                return Err(CompileError::runtime(
                    format!("Class '{}' is not declared", object.class_name),
                    object.span,
                ));
            }
        };
        let args = match &object.ctor_args {
            Some(args) => args
                .iter()
                .map(|arg| self.eval(arg))
                .collect::<CompileResult<Vec<_>>>()?,
            None => Vec::new(),
        };
        let instance = self.construct(&klass, args, object.span)?;
        self.env
            .borrow_mut()
            .define(object.instance_name.clone(), instance);
        Ok(())
    }

    /// Build an instance: fields first, root class downward, then the
    /// constructor body
    fn construct(
        &mut self,
        klass: &Rc<Class>,
        args: Vec<Value>,
        span: Span,
    ) -> CompileResult<Value> {
        let instance = Instance::new(klass);

        let mut chain = Vec::new();
        let mut current = Some(Rc::clone(klass));
        while let Some(class) = current {
            current = class.superclass.clone();
            chain.push(class);
        }
        for class in chain.iter().rev() {
            for decl in &class.field_decls {
                match &decl.kind {
                    DeclKind::Var(var) => {
                        let value = self.var_decl_value(var)?;
                        instance.set(var.name.clone(), value);
                    }
                    DeclKind::Array(array) => {
                        let value = self.array_decl_value(array)?;
                        instance.set(array.name.clone(), value);
                    }
                    _ => {}
                }
            }
        }

        match klass.find_constructor() {
            Some(ctor) => {
                self.call_function(&ctor.bind(&instance), args, span)?;
            }
            None => {
                if !args.is_empty() {
                    return Err(CompileError::runtime(
                        format!("Constructor for class '{}' not found", klass.name),
                        span,
                    ));
                }
            }
        }
        Ok(Value::Instance(instance))
    }

    // ---- calls ------------------------------------------------------

    fn call_function(
        &mut self,
        func: &Function,
        args: Vec<Value>,
        span: Span,
    ) -> CompileResult<Value> {
        if args.len() != func.arity() {
            return Err(CompileError::runtime(
                format!(
                    "Function '{}' expects {} arguments, found {}",
                    func.name(),
                    func.arity(),
                    args.len()
                ),
                span,
            ));
        }
        let call_env = Env::with_parent(&func.env);
        for (param, arg) in func.decl.params.iter().zip(args) {
            call_env.borrow_mut().define(param.name.clone(), arg);
        }
        // The caller's frame is restored on every exit path, including
        // a runtime error unwinding through this call.
        let saved = std::mem::replace(&mut self.env, call_env);
        let flow = self.exec_block(&func.decl.body);
        self.env = saved;
        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Null),
            Flow::Break | Flow::Continue => Err(CompileError::runtime(
                "'break' or 'continue' outside of a loop",
                span,
            )),
        }
    }

    // ---- expressions ------------------------------------------------

    fn eval(&mut self, expr: &Expr) -> CompileResult<Value> {
        match &expr.kind {
            ExprKind::Const(lit) => Ok(match lit {
                Literal::Int(v) => Value::Int(*v),
                Literal::Float(v) => Value::Float(*v),
                Literal::Bool(v) => Value::Bool(*v),
                Literal::Str(v) => Value::Str(v.clone()),
            }),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Var(name) => self.lookup_value(name, expr.span),
            ExprKind::ArrayLookup { name, index } => {
                let array = self.array_value(name, expr.span)?;
                let index = self.index_value(index)?;
                let elems = array.borrow();
                elems.get(index).cloned().ok_or_else(|| {
                    CompileError::runtime("Array index out of bounds", expr.span)
                })
            }
            ExprKind::ArraySize(name) => {
                let array = self.array_value(name, expr.span)?;
                let len = array.borrow().len();
                Ok(Value::Int(len as i64))
            }
            ExprKind::VarAssign { name, expr: value } => {
                let value = self.eval(value)?;
                self.assign_value(name, value.clone(), expr.span)?;
                Ok(value)
            }
            ExprKind::ArrayAssign {
                name,
                index,
                expr: value,
            } => {
                let array = self.array_value(name, expr.span)?;
                let index = self.index_value(index)?;
                let value = self.eval(value)?;
                let mut elems = array.borrow_mut();
                let Some(slot) = elems.get_mut(index) else {
                    return Err(CompileError::runtime(
                        "Array index out of bounds",
                        expr.span,
                    ));
                };
                *slot = value.clone();
                Ok(value)
            }
            ExprKind::CompoundAssign {
                name,
                op,
                expr: value,
            } => {
                let current = self.lookup_value(name, expr.span)?;
                let rhs = self.eval(value)?;
                let result = binary_op(*op, current, rhs, expr.span)?;
                self.assign_value(name, result.clone(), expr.span)?;
                Ok(result)
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary_op(*op, left, right, expr.span)
            }
            ExprKind::Unary { op, expr: inner } => {
                let value = self.eval(inner)?;
                match op {
                    UnaryOp::Plus => match value {
                        Value::Int(_) | Value::Float(_) => Ok(value),
                        other => Err(numeric_operand_error("+", &other, expr.span)),
                    },
                    UnaryOp::Minus => match value {
                        Value::Int(v) => Ok(Value::Int(-v)),
                        Value::Float(v) => Ok(Value::Float(-v)),
                        other => Err(numeric_operand_error("-", &other, expr.span)),
                    },
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                }
            }
            ExprKind::PrefixInc(target) => self.step(target, 1, true, expr.span),
            ExprKind::PrefixDec(target) => self.step(target, -1, true, expr.span),
            ExprKind::PostfixInc(target) => self.step(target, 1, false, expr.span),
            ExprKind::PostfixDec(target) => self.step(target, -1, false, expr.span),
            ExprKind::And { left, right } => {
                if self.eval(left)?.is_truthy() {
                    let right = self.eval(right)?;
                    Ok(Value::Bool(right.is_truthy()))
                } else {
                    Ok(Value::Bool(false))
                }
            }
            ExprKind::Or { left, right } => {
                if self.eval(left)?.is_truthy() {
                    Ok(Value::Bool(true))
                } else {
                    let right = self.eval(right)?;
                    Ok(Value::Bool(right.is_truthy()))
                }
            }
            ExprKind::Cast {
                target,
                expr: inner,
            } => {
                let value = self.eval(inner)?;
                cast_value(target, value, expr.span)
            }
            ExprKind::Call {
                name,
                receiver,
                args,
            } => {
                let values: Vec<Value> = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<CompileResult<_>>()?;
                match receiver {
                    Some(object_name) => {
                        self.call_method(object_name, name, values, expr.span)
                    }
                    None => {
                        let callee = self.lookup_value(name, expr.span)?;
                        self.call_value(name, callee, values, expr.span)
                    }
                }
            }
            ExprKind::Grouping(inner) => self.eval(inner),
        }
    }

    fn call_method(
        &mut self,
        object_name: &str,
        method: &str,
        args: Vec<Value>,
        span: Span,
    ) -> CompileResult<Value> {
        let receiver = self.lookup_value(object_name, span)?;
        let Value::Instance(instance) = receiver else {
            return Err(CompileError::runtime(
                format!("'{object_name}' is not an instance"),
                span,
            ));
        };
        let Some(member) = instance.get(method) else {
            return Err(CompileError::runtime(
                format!(
                    "Method '{}' not found in class '{}'",
                    method, instance.class.name
                ),
                span,
            ));
        };
        self.call_value(method, member, args, span)
    }

    fn call_value(
        &mut self,
        name: &str,
        callee: Value,
        args: Vec<Value>,
        span: Span,
    ) -> CompileResult<Value> {
        match callee {
            Value::Function(func) => self.call_function(&func, args, span),
            Value::Native(native) => {
                if args.len() != native.arity {
                    return Err(CompileError::runtime(
                        format!(
                            "Function '{}' expects {} arguments, found {}",
                            native.name,
                            native.arity,
                            args.len()
                        ),
                        span,
                    ));
                }
                (native.func)(&args).map_err(|message| CompileError::runtime(message, span))
            }
            _ => Err(CompileError::runtime(
                format!("'{name}' is not callable"),
                span,
            )),
        }
    }

    // ---- lvalue plumbing --------------------------------------------

    /// Resolve a name: the environment chain first, then fields of the
    /// bound `this` inside methods
    fn lookup_value(&self, name: &str, span: Span) -> CompileResult<Value> {
        if let Some(value) = self.env.borrow().get(name) {
            return Ok(value);
        }
        if let Some(Value::Instance(instance)) = self.env.borrow().get("this") {
            if let Some(value) = instance.get(name) {
                return Ok(value);
            }
        }
        Err(CompileError::runtime(
            format!("Variable '{name}' is not defined"),
            span,
        ))
    }

    /// Assign through the same resolution order as [`Self::lookup_value`]
    fn assign_value(&mut self, name: &str, value: Value, span: Span) -> CompileResult<()> {
        if self.env.borrow_mut().assign(name, value.clone()) {
            return Ok(());
        }
        if let Some(Value::Instance(instance)) = self.env.borrow().get("this") {
            if instance.has_field(name) {
                instance.set(name, value);
                return Ok(());
            }
        }
        Err(CompileError::runtime(
            format!("Variable '{name}' is not defined"),
            span,
        ))
    }

    fn array_value(&self, name: &str, span: Span) -> CompileResult<Rc<RefCell<Vec<Value>>>> {
        match self.lookup_value(name, span)? {
            Value::Array(array) => Ok(array),
            _ => Err(CompileError::runtime(
                format!("Variable '{name}' is not an array"),
                span,
            )),
        }
    }

    fn index_value(&mut self, index: &Expr) -> CompileResult<usize> {
        match self.eval(index)? {
            Value::Int(v) if v >= 0 => Ok(v as usize),
            Value::Int(_) => Err(CompileError::runtime(
                "Array index out of bounds",
                index.span,
            )),
            other => Err(CompileError::runtime(
                format!("Array index must be an int, got {}", other.type_name()),
                index.span,
            )),
        }
    }

    /// Shared implementation of the four `++`/`--` forms. The stepped
    /// value is written back; prefix forms yield the new value and
    /// postfix forms the old one.
    fn step(
        &mut self,
        target: &Expr,
        delta: i64,
        prefix: bool,
        span: Span,
    ) -> CompileResult<Value> {
        let old = self.eval(target)?;
        let new = match &old {
            Value::Int(v) => Value::Int(v + delta),
            Value::Float(v) => Value::Float(v + delta as f64),
            other => {
                let op = if delta > 0 { "++" } else { "--" };
                return Err(numeric_operand_error(op, other, span));
            }
        };
        match &target.kind {
            ExprKind::Var(name) => self.assign_value(name, new.clone(), span)?,
            ExprKind::ArrayLookup { name, index } => {
                let array = self.array_value(name, span)?;
                let index = self.index_value(index)?;
                let mut elems = array.borrow_mut();
                let Some(slot) = elems.get_mut(index) else {
                    return Err(CompileError::runtime("Array index out of bounds", span));
                };
                *slot = new.clone();
            }
            _ => {
                let op = if delta > 0 { "++" } else { "--" };
                return Err(CompileError::runtime(
                    format!("Operator '{op}' must be applied to a variable or array element"),
                    span,
                ));
            }
        }
        Ok(if prefix { new } else { old })
    }

    fn this_instance(&self, span: Span) -> CompileResult<Rc<Instance>> {
        match self.env.borrow().get("this") {
            Some(Value::Instance(instance)) => Ok(instance),
            _ => Err(CompileError::runtime(
                "'this' used outside of a method",
                span,
            )),
        }
    }

    fn in_child_env<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> CompileResult<T> {
        let child = Env::with_parent(&self.env);
        let saved = std::mem::replace(&mut self.env, child);
        let result = f(self);
        self.env = saved;
        result
    }
}

// ---- operators ------------------------------------------------------

fn binary_op(op: BinaryOp, left: Value, right: Value, span: Span) -> CompileResult<Value> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (left, right) => arith(op, left, right, span, i64::checked_add, |a, b| a + b),
        },
        BinaryOp::Sub => arith(op, left, right, span, i64::checked_sub, |a, b| a - b),
        BinaryOp::Mul => arith(op, left, right, span, i64::checked_mul, |a, b| a * b),
        // Integer division floors toward negative infinity
        BinaryOp::Div => {
            if is_numeric_zero(&right) {
                return Err(CompileError::runtime("Division by zero", span));
            }
            arith(op, left, right, span, i64::checked_div_euclid, |a, b| a / b)
        }
        BinaryOp::Mod => {
            if is_numeric_zero(&right) {
                return Err(CompileError::runtime("Division by zero", span));
            }
            arith(op, left, right, span, i64::checked_rem_euclid, f64::rem_euclid)
        }
        BinaryOp::Eq => Ok(Value::Bool(left.equals(&right))),
        BinaryOp::Ne => Ok(Value::Bool(!left.equals(&right))),
        BinaryOp::Lt => compare(op, left, right, span, |o| o.is_lt()),
        BinaryOp::Le => compare(op, left, right, span, |o| o.is_le()),
        BinaryOp::Gt => compare(op, left, right, span, |o| o.is_gt()),
        BinaryOp::Ge => compare(op, left, right, span, |o| o.is_ge()),
    }
}

fn arith(
    op: BinaryOp,
    left: Value,
    right: Value,
    span: Span,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> CompileResult<Value> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b).map(Value::Int).ok_or_else(|| {
            CompileError::runtime(format!("Integer overflow in '{op}'"), span)
        }),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (a, b) = (as_f64(&left), as_f64(&right));
            Ok(Value::Float(float_op(a, b)))
        }
        _ => {
            let other = if matches!(left, Value::Int(_) | Value::Float(_)) {
                &right
            } else {
                &left
            };
            Err(numeric_operand_error(&op.to_string(), other, span))
        }
    }
}

fn compare(
    op: BinaryOp,
    left: Value,
    right: Value,
    span: Span,
    check: fn(std::cmp::Ordering) -> bool,
) -> CompileResult<Value> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Bool(check(a.cmp(b)))),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (a, b) = (as_f64(&left), as_f64(&right));
            Ok(Value::Bool(a.partial_cmp(&b).is_some_and(check)))
        }
        _ => {
            let other = if matches!(left, Value::Int(_) | Value::Float(_)) {
                &right
            } else {
                &left
            };
            Err(numeric_operand_error(&op.to_string(), other, span))
        }
    }
}

fn is_numeric_zero(value: &Value) -> bool {
    matches!(value, Value::Int(0)) || matches!(value, Value::Float(v) if *v == 0.0)
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(v) => *v as f64,
        Value::Float(v) => *v,
        _ => 0.0,
    }
}

fn numeric_operand_error(op: &str, value: &Value, span: Span) -> CompileError {
    CompileError::runtime(
        format!(
            "'{op}' operator can only be used with numeric operands, got {}",
            value.type_name()
        ),
        span,
    )
}

fn cast_value(target: &Type, value: Value, span: Span) -> CompileResult<Value> {
    let cast = match target {
        Type::Int => match &value {
            Value::Int(v) => Some(Value::Int(*v)),
            Value::Float(v) => Some(Value::Int(*v as i64)),
            Value::Bool(v) => Some(Value::Int(i64::from(*v))),
            Value::Str(s) => s.trim().parse::<i64>().ok().map(Value::Int),
            _ => None,
        },
        Type::Float => match &value {
            Value::Int(v) => Some(Value::Float(*v as f64)),
            Value::Float(v) => Some(Value::Float(*v)),
            Value::Bool(v) => Some(Value::Float(f64::from(u8::from(*v)))),
            Value::Str(s) => s.trim().parse::<f64>().ok().map(Value::Float),
            _ => None,
        },
        Type::Bool => Some(Value::Bool(match &value {
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Bool(v) => *v,
            Value::Str(s) => !s.is_empty(),
            Value::Null => false,
            _ => true,
        })),
        Type::Str => Some(Value::Str(value.to_string())),
        _ => None,
    };
    cast.ok_or_else(|| {
        CompileError::runtime(format!("Cannot cast {value} to {target}"), span)
    })
}

fn zero_value(ty: &Type) -> Value {
    match ty {
        Type::Int => Value::Int(0),
        Type::Float => Value::Float(0.0),
        Type::Bool => Value::Bool(false),
        Type::Str => Value::Str(String::new()),
        _ => Value::Null,
    }
}

fn format_arg(spec: &format::Spec, value: &Value, span: Span) -> CompileResult<FormatArg> {
    let arg = match (format::spec_type(spec.conv), value) {
        (Type::Int, Value::Int(v)) => FormatArg::Int(*v),
        (Type::Float, Value::Float(v)) => FormatArg::Float(*v),
        (Type::Float, Value::Int(v)) => FormatArg::Float(*v as f64),
        (Type::Str, value) => FormatArg::Str(value.to_string()),
        (expected, value) => {
            return Err(CompileError::runtime(
                format!(
                    "printf argument must be of type '{}', got {}",
                    expected,
                    value.type_name()
                ),
                span,
            ));
        }
    };
    Ok(arg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> (Value, String) {
        let mut parser = Parser::new(source).expect("parser setup");
        let program = parser.parse().expect("parse");
        let mut out = Vec::new();
        let value = Interpreter::new(&mut out).run(&program).expect("run");
        (value, String::from_utf8(out).expect("utf8 output"))
    }

    fn run_err(source: &str) -> CompileError {
        let mut parser = Parser::new(source).expect("parser setup");
        let program = parser.parse().expect("parse");
        let mut out = Vec::new();
        Interpreter::new(&mut out)
            .run(&program)
            .expect_err("expected a runtime error")
    }

    #[test]
    fn test_main_return_value() {
        let (value, _) = run("int main() { return 42; }");
        assert!(matches!(value, Value::Int(42)));
    }

    #[test]
    fn test_bare_return_yields_zero() {
        let (value, _) = run("int main() { return; }");
        assert!(matches!(value, Value::Int(0)));
    }

    #[test]
    fn test_falling_off_yields_null() {
        let (value, _) = run("int main() { int x = 1; }");
        assert!(matches!(value, Value::Null));
    }

    #[test]
    fn test_integer_division_floors() {
        let (_, out) = run(r#"int main() { printf("%d %d", 7 / 2, -7 / 2); return 0; }"#);
        assert_eq!(out, "3 -4");
    }

    #[test]
    fn test_mixed_division_is_float() {
        let (_, out) = run(r#"int main() { printf("%f", 7.0 / 2); return 0; }"#);
        assert_eq!(out, "3.500000");
    }

    #[test]
    fn test_division_by_zero() {
        let err = run_err("int main() { int x = 1 / 0; return x; }");
        assert!(matches!(err, CompileError::Runtime { message, .. }
            if message == "Division by zero"));
    }

    #[test]
    fn test_string_concatenation() {
        let (_, out) = run(r#"int main() { printf("%s", "foo" + "bar"); return 0; }"#);
        assert_eq!(out, "foobar");
    }

    #[test]
    fn test_while_with_break() {
        let (_, out) = run(
            r#"
            int main() {
                int i = 0;
                while (true) {
                    if (i == 3) { break; }
                    printf("%d", i);
                    i = i + 1;
                }
                return 0;
            }
            "#,
        );
        assert_eq!(out, "012");
    }

    #[test]
    fn test_for_with_continue_still_increments() {
        let (_, out) = run(
            r#"
            int main() {
                for (int i = 0; i < 5; i = i + 1) {
                    if (i == 2) { continue; }
                    printf("%d", i);
                }
                return 0;
            }
            "#,
        );
        assert_eq!(out, "0134");
    }

    #[test]
    fn test_break_only_exits_inner_loop() {
        let (_, out) = run(
            r#"
            int main() {
                for (int i = 0; i < 2; i = i + 1) {
                    for (int j = 0; j < 5; j = j + 1) {
                        if (j == 1) { break; }
                        printf("%d%d ", i, j);
                    }
                }
                return 0;
            }
            "#,
        );
        assert_eq!(out, "00 10 ");
    }

    #[test]
    fn test_block_scoping_shadows_and_restores() {
        let (_, out) = run(
            r#"
            int main() {
                int x = 1;
                { int x = 2; printf("%d", x); }
                printf("%d", x);
                return 0;
            }
            "#,
        );
        assert_eq!(out, "21");
    }

    #[test]
    fn test_recursion() {
        let (_, out) = run(
            r#"
            int fib(int n) {
                if (n < 2) { return n; }
                return fib(n - 1) + fib(n - 2);
            }
            int main() { printf("%d", fib(10)); return 0; }
            "#,
        );
        assert_eq!(out, "55");
    }

    #[test]
    fn test_prefix_and_postfix_step() {
        let (_, out) = run(
            r#"
            int main() {
                int x = 5;
                printf("%d", ++x);
                printf("%d", x++);
                printf("%d", x);
                return 0;
            }
            "#,
        );
        assert_eq!(out, "667");
    }

    #[test]
    fn test_arrays_are_zero_filled() {
        let (_, out) = run(
            r#"
            int main() {
                int a[3];
                a[1] = 7;
                printf("%d%d%d %d", a[0], a[1], a[2], a.size);
                return 0;
            }
            "#,
        );
        assert_eq!(out, "070 3");
    }

    #[test]
    fn test_array_out_of_bounds() {
        let err = run_err("int main() { int a[2]; return a[2]; }");
        assert!(matches!(err, CompileError::Runtime { message, .. }
            if message == "Array index out of bounds"));
    }

    #[test]
    fn test_short_circuit_skips_right_side() {
        let (_, out) = run(
            r#"
            bool touch() { printf("x"); return true; }
            int main() {
                bool a = false && touch();
                bool b = true || touch();
                printf("%s %s", (string)a, (string)b);
                return 0;
            }
            "#,
        );
        assert_eq!(out, "false true");
    }

    #[test]
    fn test_casts() {
        let (_, out) = run(
            r#"
            int main() {
                printf("%d ", (int)3.9);
                printf("%f ", (float)2);
                printf("%d ", (int)"17");
                printf("%s", (string)4.5);
                return 0;
            }
            "#,
        );
        assert_eq!(out, "3 2.000000 17 4.5");
    }

    #[test]
    fn test_invalid_string_cast_fails() {
        let err = run_err(r#"int main() { int x = (int)"nope"; return x; }"#);
        assert!(matches!(err, CompileError::Runtime { message, .. }
            if message == "Cannot cast nope to int"));
    }

    #[test]
    fn test_closure_captures_defining_frame() {
        let (_, out) = run(
            r#"
            int counter = 0;
            int bump() { counter = counter + 1; return counter; }
            int main() {
                bump();
                bump();
                printf("%d", bump());
                return 0;
            }
            "#,
        );
        assert_eq!(out, "3");
    }

    #[test]
    fn test_class_with_constructor_and_method() {
        let (_, out) = run(
            r#"
            class Point {
                int x;
                int y;
                Point(int px, int py) {
                    x = px;
                    y = py;
                }
                int sum() { return x + y; }
            };
            int main() {
                Point p = new Point(3, 4);
                printf("%d", p.sum());
                return 0;
            }
            "#,
        );
        assert_eq!(out, "7");
    }

    #[test]
    fn test_fields_default_before_constructor() {
        let (_, out) = run(
            r#"
            class Box {
                int value;
                int get() { return value; }
            };
            int main() {
                Box b;
                printf("%d", b.get());
                return 0;
            }
            "#,
        );
        assert_eq!(out, "0");
    }

    #[test]
    fn test_inherited_method_and_override() {
        let (_, out) = run(
            r#"
            class Animal {
                string noise() { return "..."; }
                string speak() { return noise(); }
            };
            class Dog : public Animal {
                string noise() { return "woof"; }
            };
            int main() {
                Dog d;
                printf("%s", d.speak());
                return 0;
            }
            "#,
        );
        assert_eq!(out, "woof");
    }

    #[test]
    fn test_super_constructor_runs() {
        let (_, out) = run(
            r#"
            class Base {
                int a;
                Base(int x) { a = x; }
            };
            class Derived : public Base {
                int b;
                Derived(int x, int y) {
                    super(x);
                    b = y;
                }
                int total() { return a + b; }
            };
            int main() {
                Derived d = new Derived(2, 3);
                printf("%d", d.total());
                return 0;
            }
            "#,
        );
        assert_eq!(out, "5");
    }

    #[test]
    fn test_constructor_arity_checked_at_runtime() {
        let err = run_err(
            r#"
            class P { P(int x) { } };
            int main() { P p = new P(); return 0; }
            "#,
        );
        assert!(matches!(err, CompileError::Runtime { .. }));
    }

    #[test]
    fn test_builtins() {
        let (_, out) = run(
            r#"
            int main() {
                printf("%d %f", abs(-4), sqrt(pow(3.0, 2.0)));
                return 0;
            }
            "#,
        );
        assert_eq!(out, "4 3.000000");
    }

    #[test]
    fn test_printf_literal_escapes() {
        let (_, out) = run(r#"int main() { printf("a\tb\n"); return 0; }"#);
        assert_eq!(out, "a\tb\n");
    }

    #[test]
    fn test_modulo_follows_floored_division() {
        let (_, out) = run(r#"int main() { printf("%d %d", 7 % 3, -7 % 3); return 0; }"#);
        assert_eq!(out, "1 2");
    }
}
