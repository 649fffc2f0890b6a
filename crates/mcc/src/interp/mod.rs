//! Tree-walking interpreter

pub mod builtins;
mod class;
mod env;
mod interpreter;
mod value;

pub use class::{Class, Function, Instance};
pub use env::Env;
pub use interpreter::Interpreter;
pub use value::{NativeFn, Value};
