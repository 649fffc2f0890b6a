//! Semantic analysis: scoping, type checking, diagnostics

mod analyzer;
pub mod format;
mod scope;

pub use analyzer::SemanticAnalyzer;
pub use scope::{FuncSig, Scope, Symbol, SymbolKind};
