//! Shared infrastructure: errors, diagnostics, spans

mod error;
mod span;

pub use error::{CompileError, CompileResult, Diag, DiagnosticReporter};
pub use span::Span;
