//! Static types of the MiniC++ language

use std::fmt;

/// Every type an expression or declaration can have
///
/// `Null` is the type of the `null` literal only; no declaration carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Void,
    Int,
    Float,
    Bool,
    Str,
    /// A declared class, by name
    Class(String),
    Null,
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Type::Class(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::Str => write!(f, "string"),
            Type::Class(name) => write!(f, "{name}"),
            Type::Null => write!(f, "null"),
        }
    }
}
