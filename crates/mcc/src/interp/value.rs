//! Runtime values

use crate::interp::class::{Class, Function, Instance};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A native function exposed to programs
pub struct NativeFn {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value, String>,
}

/// Any value a program can produce or store
#[derive(Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
    Array(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Function>),
    Native(Rc<NativeFn>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

impl Value {
    /// Everything is truthy except `false` and `null`
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }

    /// Equality used by `==` and `!=`. Numeric values compare across
    /// int and float; other kinds compare only within their own kind.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            // Keep a decimal point on whole floats
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
            Value::Null => write!(f, "null"),
            Value::Array(elems) => {
                write!(f, "[")?;
                for (i, elem) in elems.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, "]")
            }
            Value::Function(func) => write!(f, "<fn {}>", func.name()),
            Value::Native(native) => write!(f, "<fn {}>", native.name),
            Value::Class(class) => write!(f, "{}", class.name),
            Value::Instance(instance) => write!(f, "{} instance", instance.class.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(Value::Int(0).is_truthy());
        assert!(Value::Str(String::new()).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_numeric_equality_crosses_kinds() {
        assert!(Value::Int(3).equals(&Value::Float(3.0)));
        assert!(!Value::Int(3).equals(&Value::Str("3".to_string())));
    }

    #[test]
    fn test_whole_floats_keep_decimal_point() {
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
    }
}
