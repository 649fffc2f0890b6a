//! Built-in constants and native functions
//!
//! Declared here once and injected into both the analyzer's global
//! scope and the interpreter's global environment, so the two always
//! agree on what exists.

use crate::ast::Type;
use crate::interp::env::Env;
use crate::interp::value::{NativeFn, Value};
use crate::sema::FuncSig;
use std::cell::RefCell;
use std::rc::Rc;

/// Constant bindings and their static types
pub fn constants() -> Vec<(&'static str, Type)> {
    vec![("PI", Type::Float), ("E", Type::Float)]
}

/// Native function signatures for the analyzer
pub fn signatures() -> Vec<(&'static str, FuncSig)> {
    vec![
        ("abs", sig(&[("x", Type::Int)], Type::Int)),
        ("fabs", sig(&[("x", Type::Float)], Type::Float)),
        ("sqrt", sig(&[("x", Type::Float)], Type::Float)),
        (
            "pow",
            sig(&[("base", Type::Float), ("exp", Type::Float)], Type::Float),
        ),
    ]
}

/// Bind every constant and native into a runtime environment
pub fn install(env: &Rc<RefCell<Env>>) {
    let mut env = env.borrow_mut();
    env.define("PI", Value::Float(std::f64::consts::PI));
    env.define("E", Value::Float(std::f64::consts::E));
    for native in natives() {
        env.define(native.name, Value::Native(Rc::new(native)));
    }
}

fn sig(params: &[(&str, Type)], return_type: Type) -> FuncSig {
    FuncSig {
        params: params
            .iter()
            .map(|(name, ty)| (name.to_string(), ty.clone()))
            .collect(),
        return_type,
    }
}

fn natives() -> Vec<NativeFn> {
    vec![
        NativeFn {
            name: "abs",
            arity: 1,
            func: |args| match &args[0] {
                Value::Int(v) => Ok(Value::Int(v.abs())),
                other => Err(format!("abs expects an int, got {}", other.type_name())),
            },
        },
        NativeFn {
            name: "fabs",
            arity: 1,
            func: |args| Ok(Value::Float(as_float("fabs", &args[0])?.abs())),
        },
        NativeFn {
            name: "sqrt",
            arity: 1,
            func: |args| {
                let x = as_float("sqrt", &args[0])?;
                if x < 0.0 {
                    return Err("sqrt of a negative number".to_string());
                }
                Ok(Value::Float(x.sqrt()))
            },
        },
        NativeFn {
            name: "pow",
            arity: 2,
            func: |args| {
                let base = as_float("pow", &args[0])?;
                let exp = as_float("pow", &args[1])?;
                Ok(Value::Float(base.powf(exp)))
            },
        },
    ]
}

// Int arguments widen to float, matching static compatibility
fn as_float(name: &str, value: &Value) -> Result<f64, String> {
    match value {
        Value::Int(v) => Ok(*v as f64),
        Value::Float(v) => Ok(*v),
        other => Err(format!("{name} expects a float, got {}", other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, String> {
        let native = natives()
            .into_iter()
            .find(|n| n.name == name)
            .expect("known native");
        (native.func)(args)
    }

    #[test]
    fn test_abs() {
        assert!(matches!(call("abs", &[Value::Int(-5)]), Ok(Value::Int(5))));
        assert!(call("abs", &[Value::Str("x".to_string())]).is_err());
    }

    #[test]
    fn test_sqrt_widens_int() {
        let Ok(Value::Float(v)) = call("sqrt", &[Value::Int(9)]) else {
            panic!("expected a float");
        };
        assert_eq!(v, 3.0);
    }

    #[test]
    fn test_sqrt_rejects_negative() {
        assert!(call("sqrt", &[Value::Float(-1.0)]).is_err());
    }

    #[test]
    fn test_pow() {
        let Ok(Value::Float(v)) = call("pow", &[Value::Float(2.0), Value::Float(10.0)]) else {
            panic!("expected a float");
        };
        assert_eq!(v, 1024.0);
    }

    #[test]
    fn test_signatures_match_natives() {
        let sigs = signatures();
        for native in natives() {
            let (_, sig) = sigs.iter().find(|(n, _)| *n == native.name).expect("signature");
            assert_eq!(sig.params.len(), native.arity);
        }
    }
}
