//! MiniC++ interpreter
//!
//! A C++-flavored teaching language with classes, single inheritance,
//! fixed-size arrays, and printf-style output.
//!
//! ## Architecture
//!
//! The pipeline is organized into:
//! - **Lexer** (`lexer/`): logos-based tokenizer
//! - **Parser** (`parser/`): recursive descent, two tokens of lookahead
//! - **Sema** (`sema/`): scoped symbol tables and accumulated diagnostics
//! - **Interp** (`interp/`): tree-walking evaluator with environment chains
//! - **Driver** (`driver/`): phase orchestration
//! - **Common** (`common/`): shared infrastructure (errors, spans)

pub mod ast;
pub mod common;
pub mod driver;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod sema;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, DiagnosticReporter, Span};
pub use driver::{CompileContext, Outcome, Pipeline, RunConfig};
