//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;

use super::Span;

/// Fatal error raised somewhere in the lex/parse/run pipeline
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at {span:?}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    #[error("Runtime error at {span:?}: {message}")]
    Runtime { message: String, span: Span },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn runtime(message: impl Into<String>, span: Span) -> Self {
        Self::Runtime {
            message: message.into(),
            span,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// One accumulated semantic diagnostic
///
/// Unlike [`CompileError`] these are non-fatal: the analyzer collects as many
/// as it can find and the driver reports the whole batch at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diag {
    pub message: String,
    pub span: Span,
}

impl Diag {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    pub fn report_error(&self, file_id: usize, error: &CompileError) {
        let diagnostic = match error {
            CompileError::Lexer { message, span } => Diagnostic::error()
                .with_message("Lexer error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message),
                ]),

            CompileError::Parser { message, span } => Diagnostic::error()
                .with_message("Syntax error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message),
                ]),

            CompileError::Runtime { message, span } => Diagnostic::error()
                .with_message("Runtime error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message),
                ]),

            CompileError::Io(err) => {
                Diagnostic::error().with_message(format!("IO error: {err}"))
            }
        };

        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }

    pub fn report_diag(&self, file_id: usize, diag: &Diag) {
        let diagnostic = Diagnostic::error()
            .with_message("Semantic error")
            .with_labels(vec![
                Label::primary(file_id, diag.span.start..diag.span.end)
                    .with_message(&diag.message),
            ]);

        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &diagnostic);
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
