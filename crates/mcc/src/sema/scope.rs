//! Symbol table and scope management

use crate::ast::Type;
use std::collections::HashMap;

/// A symbol in the symbol table
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
}

/// Kind of symbol
#[derive(Debug, Clone)]
pub enum SymbolKind {
    Variable,
    Parameter,
    /// Array of the element type stored in `ty`
    Array,
    /// A declared instance; `ty` is the class type
    Object,
    Function(FuncSig),
    Builtin(FuncSig),
    Class,
}

/// Signature of a declared function, method, or builtin
#[derive(Debug, Clone)]
pub struct FuncSig {
    pub params: Vec<(String, Type)>,
    pub return_type: Type,
}

/// A scope containing symbols
#[derive(Debug)]
pub struct Scope {
    symbols: HashMap<String, Symbol>,
    parent: Option<Box<Scope>>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            parent: None,
        }
    }

    pub fn define(&mut self, symbol: Symbol) -> Result<(), String> {
        if self.symbols.contains_key(&symbol.name) {
            return Err(format!(
                "Identifier '{}' has already been declared in this scope",
                symbol.name
            ));
        }
        self.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        if let Some(sym) = self.symbols.get(name) {
            Some(sym)
        } else if let Some(parent) = &self.parent {
            parent.lookup(name)
        } else {
            None
        }
    }

    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Take the parent scope, replacing self with the parent
    pub fn pop_to_parent(&mut self) -> bool {
        if let Some(parent) = self.parent.take() {
            *self = *parent;
            true
        } else {
            false
        }
    }

    /// Push a new child scope
    pub fn push_child(&mut self) {
        let old_scope = std::mem::replace(self, Scope::new());
        self.parent = Some(Box::new(old_scope));
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, ty: Type) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::Variable,
            ty,
        }
    }

    #[test]
    fn test_define_and_lookup() {
        let mut scope = Scope::new();
        scope.define(var("x", Type::Int)).unwrap();
        assert!(matches!(scope.lookup("x"), Some(s) if s.ty == Type::Int));
        assert!(scope.lookup("y").is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut scope = Scope::new();
        scope.define(var("x", Type::Int)).unwrap();
        assert!(scope.define(var("x", Type::Float)).is_err());
    }

    #[test]
    fn test_shadowing_in_child_scope() {
        let mut scope = Scope::new();
        scope.define(var("x", Type::Int)).unwrap();
        scope.push_child();
        scope.define(var("x", Type::Float)).unwrap();
        assert!(matches!(scope.lookup("x"), Some(s) if s.ty == Type::Float));
        assert!(scope.lookup_local("x").is_some());
        assert!(scope.pop_to_parent());
        assert!(matches!(scope.lookup("x"), Some(s) if s.ty == Type::Int));
    }

    #[test]
    fn test_outer_visible_from_inner() {
        let mut scope = Scope::new();
        scope.define(var("x", Type::Int)).unwrap();
        scope.push_child();
        assert!(scope.lookup("x").is_some());
        assert!(scope.lookup_local("x").is_none());
    }
}
