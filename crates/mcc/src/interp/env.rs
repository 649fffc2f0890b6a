//! Environment frames
//!
//! A chain of mutable frames, one per lexical scope. Function values
//! capture the frame they were defined in, so frames are shared and
//! reference-counted.

use crate::interp::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
pub struct Env {
    values: HashMap<String, Value>,
    parent: Option<Rc<RefCell<Env>>>,
}

impl Env {
    pub fn new() -> Rc<RefCell<Env>> {
        Rc::new(RefCell::new(Env::default()))
    }

    pub fn with_parent(parent: &Rc<RefCell<Env>>) -> Rc<RefCell<Env>> {
        Rc::new(RefCell::new(Env {
            values: HashMap::new(),
            parent: Some(Rc::clone(parent)),
        }))
    }

    /// Bind a name in this frame, shadowing any outer binding
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Look a name up through the frame chain
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().get(name)
        } else {
            None
        }
    }

    /// Assign to an existing binding, innermost frame first.
    /// Returns false when the name is unbound everywhere.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            true
        } else if let Some(parent) = &self.parent {
            parent.borrow_mut().assign(name, value)
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let env = Env::new();
        env.borrow_mut().define("x", Value::Int(1));
        assert!(matches!(env.borrow().get("x"), Some(Value::Int(1))));
        assert!(env.borrow().get("y").is_none());
    }

    #[test]
    fn test_lookup_walks_parent_chain() {
        let global = Env::new();
        global.borrow_mut().define("x", Value::Int(1));
        let local = Env::with_parent(&global);
        assert!(matches!(local.borrow().get("x"), Some(Value::Int(1))));
    }

    #[test]
    fn test_assign_writes_outer_binding() {
        let global = Env::new();
        global.borrow_mut().define("x", Value::Int(1));
        let local = Env::with_parent(&global);
        assert!(local.borrow_mut().assign("x", Value::Int(2)));
        assert!(matches!(global.borrow().get("x"), Some(Value::Int(2))));
    }

    #[test]
    fn test_assign_to_unbound_name_fails() {
        let env = Env::new();
        assert!(!env.borrow_mut().assign("x", Value::Int(1)));
    }

    #[test]
    fn test_shadowing() {
        let global = Env::new();
        global.borrow_mut().define("x", Value::Int(1));
        let local = Env::with_parent(&global);
        local.borrow_mut().define("x", Value::Int(2));
        assert!(matches!(local.borrow().get("x"), Some(Value::Int(2))));
        assert!(matches!(global.borrow().get("x"), Some(Value::Int(1))));
    }
}
