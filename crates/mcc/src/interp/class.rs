//! Runtime representation of functions, classes, and instances

use crate::ast::{Decl, FuncDecl};
use crate::interp::env::Env;
use crate::interp::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A function value: a declaration closed over its defining frame
pub struct Function {
    pub decl: Rc<FuncDecl>,
    pub env: Rc<RefCell<Env>>,
}

impl Function {
    pub fn new(decl: Rc<FuncDecl>, env: Rc<RefCell<Env>>) -> Rc<Function> {
        Rc::new(Function { decl, env })
    }

    pub fn name(&self) -> &str {
        &self.decl.name
    }

    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }

    /// Produce a copy whose closure frame binds `this` to the instance
    pub fn bind(&self, instance: &Rc<Instance>) -> Rc<Function> {
        let env = Env::with_parent(&self.env);
        env.borrow_mut()
            .define("this", Value::Instance(Rc::clone(instance)));
        Rc::new(Function {
            decl: Rc::clone(&self.decl),
            env,
        })
    }
}

/// A class value
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: HashMap<String, Rc<Function>>,
    /// Variable and array members, executed per instance at construction
    pub field_decls: Vec<Decl>,
}

impl Class {
    /// Resolve a method by name, searching the superclass chain
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            Some(Rc::clone(method))
        } else if let Some(superclass) = &self.superclass {
            superclass.find_method(name)
        } else {
            None
        }
    }

    /// A constructor is the method named after its class; a class
    /// without one inherits the nearest ancestor's.
    pub fn find_constructor(&self) -> Option<Rc<Function>> {
        if let Some(ctor) = self.methods.get(&self.name) {
            Some(Rc::clone(ctor))
        } else if let Some(superclass) = &self.superclass {
            superclass.find_constructor()
        } else {
            None
        }
    }
}

/// An object: a class reference plus per-instance field storage
pub struct Instance {
    pub class: Rc<Class>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: &Rc<Class>) -> Rc<Instance> {
        Rc::new(Instance {
            class: Rc::clone(class),
            fields: RefCell::new(HashMap::new()),
        })
    }

    /// Fields shadow methods of the same name
    pub fn get(self: &Rc<Self>, name: &str) -> Option<Value> {
        if let Some(value) = self.fields.borrow().get(name) {
            return Some(value.clone());
        }
        self.class
            .find_method(name)
            .map(|method| Value::Function(method.bind(self)))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.borrow().contains_key(name)
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.fields.borrow_mut().insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Type;
    use crate::common::Span;

    fn method(name: &str, env: &Rc<RefCell<Env>>) -> Rc<Function> {
        Function::new(
            Rc::new(FuncDecl {
                return_type: Some(Type::Int),
                name: name.to_string(),
                params: Vec::new(),
                body: Vec::new(),
                span: Span::default(),
            }),
            Rc::clone(env),
        )
    }

    fn class(name: &str, superclass: Option<Rc<Class>>, method_names: &[&str]) -> Rc<Class> {
        let env = Env::new();
        Rc::new(Class {
            name: name.to_string(),
            superclass,
            methods: method_names
                .iter()
                .map(|m| (m.to_string(), method(m, &env)))
                .collect(),
            field_decls: Vec::new(),
        })
    }

    #[test]
    fn test_method_lookup_prefers_subclass() {
        let base = class("Base", None, &["speak", "walk"]);
        let derived = class("Derived", Some(Rc::clone(&base)), &["speak"]);
        let found = derived.find_method("speak").unwrap();
        assert!(Rc::ptr_eq(&found, &derived.methods["speak"]));
        assert!(derived.find_method("walk").is_some());
        assert!(derived.find_method("fly").is_none());
    }

    #[test]
    fn test_constructor_inherited_from_ancestor() {
        let base = class("Base", None, &["Base"]);
        let derived = class("Derived", Some(Rc::clone(&base)), &[]);
        let ctor = derived.find_constructor().unwrap();
        assert_eq!(ctor.name(), "Base");
    }

    #[test]
    fn test_instance_fields_shadow_methods() {
        let klass = class("Thing", None, &["x"]);
        let instance = Instance::new(&klass);
        assert!(matches!(instance.get("x"), Some(Value::Function(_))));
        instance.set("x", Value::Int(7));
        assert!(matches!(instance.get("x"), Some(Value::Int(7))));
    }

    #[test]
    fn test_bound_method_sees_this() {
        let klass = class("Thing", None, &["m"]);
        let instance = Instance::new(&klass);
        let Some(Value::Function(bound)) = instance.get("m") else {
            panic!("expected a bound method");
        };
        assert!(matches!(
            bound.env.borrow().get("this"),
            Some(Value::Instance(_))
        ));
    }
}
